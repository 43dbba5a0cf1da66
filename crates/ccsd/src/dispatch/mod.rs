//! Request dispatch for the compile service protocol.
//!
//! ## Protocol
//!
//! A client opens a TCP connection and sends one JSON object. Parsing is
//! lenient: comments, trailing commas, single-quoted strings and unquoted
//! property names are accepted. The object's `cmd` field selects the command:
//!
//! ```json
//! {"cmd":"addFile","file":{"name":"a.js","contents":"var a = 1;"}}
//! {"cmd":"compile","args":{"js":["a.js"],"compilation_level":"ADVANCED_OPTIMIZATIONS"}}
//! ```
//!
//! The service replies with exactly one object and closes the connection:
//!
//! ```json
//! {"result":"OK"}
//! {"result":"ERROR"}
//! ```
//!
//! A request that cannot be parsed, or has no string `cmd`, gets no reply.

mod codec;
mod errors;
mod handler;
mod request;
mod response;
mod router;

pub use self::codec::CodecError;
pub use self::errors::DispatchError;
pub(crate) use self::handler::DispatchConnectionHandler;
pub use self::request::{Command, FileSpec};
pub use self::router::CommandRouter;
