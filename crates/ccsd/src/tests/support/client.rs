//! Minimal protocol client.

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use serde_json::Value;

/// Sends one request and returns the parsed reply, or `None` when the
/// service closed the connection without answering.
pub(crate) fn send_request(addr: SocketAddr, request: &str) -> Option<Value> {
    let mut stream = TcpStream::connect(addr).expect("connect to service");
    stream
        .set_read_timeout(Some(Duration::from_secs(10)))
        .expect("set read timeout");
    stream
        .write_all(request.as_bytes())
        .expect("write request");
    // Invalid requests are only detected at end of input.
    drop(stream.shutdown(Shutdown::Write));

    let mut reply = String::new();
    stream.read_to_string(&mut reply).expect("read reply");
    if reply.is_empty() {
        return None;
    }
    let value: Value = serde_json::from_str(reply.trim_end()).expect("reply is JSON");
    Some(value.get("result").cloned().expect("reply has a result"))
}
