//! Connection handler that answers one command per connection.
//!
//! The handler reads a single request value, routes it, writes one
//! `{"result": ...}` response, and closes the connection. Protocol errors end
//! the connection silently. Every other failure, panics included, is answered
//! with `"ERROR"`.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::service::ServiceState;
use crate::transport::{ConnectionHandler, ConnectionStream};

use super::codec::{self, CodecError};
use super::errors::DispatchError;
use super::request::Command;
use super::response::ResponseWriter;
use super::router::{CommandRouter, DISPATCH_TARGET};

/// Connection handler that parses and dispatches protocol commands.
#[derive(Debug, Clone)]
pub struct DispatchConnectionHandler {
    router: CommandRouter,
}

impl DispatchConnectionHandler {
    /// Creates a dispatch handler over the shared service state.
    pub fn new(state: Arc<ServiceState>) -> Self {
        Self {
            router: CommandRouter::new(state),
        }
    }

    fn dispatch(&self, mut stream: ConnectionStream) {
        let peer = stream.peer();
        let request = match codec::read_request(&mut stream) {
            Ok(request) => request,
            Err(CodecError::Empty) => {
                debug!(target: DISPATCH_TARGET, ?peer, "client disconnected without request");
                return;
            }
            Err(error) => {
                warn!(target: DISPATCH_TARGET, ?peer, %error, "abandoning unreadable request");
                return;
            }
        };

        let result = match self.respond(request) {
            Ok(result) => result,
            Err(error) if error.abandons_connection() => {
                debug!(target: DISPATCH_TARGET, ?peer, %error, "abandoning request");
                return;
            }
            Err(error) => {
                warn!(target: DISPATCH_TARGET, ?peer, %error, "command failed");
                let mut writer = ResponseWriter::new(&mut stream);
                if let Err(error) = writer.write_error() {
                    warn!(target: DISPATCH_TARGET, ?peer, %error, "failed to write error");
                }
                return;
            }
        };

        let mut writer = ResponseWriter::new(&mut stream);
        if let Err(error) = writer.write_result(&result) {
            warn!(target: DISPATCH_TARGET, ?peer, %error, "failed to write response");
        }
        // Dropping the stream closes the connection.
    }

    fn respond(&self, request: Value) -> Result<Value, DispatchError> {
        let command = Command::parse(request)?;
        let name = command.name().to_owned();
        panic::catch_unwind(AssertUnwindSafe(|| self.router.route(command))).unwrap_or_else(
            |payload| {
                let error = DispatchError::panicked(payload.as_ref());
                error!(
                    target: DISPATCH_TARGET,
                    command = %name,
                    %error,
                    "command handler panicked"
                );
                Err(error)
            },
        )
    }
}

impl ConnectionHandler for DispatchConnectionHandler {
    fn handle(&self, stream: ConnectionStream) {
        self.dispatch(stream);
    }
}
