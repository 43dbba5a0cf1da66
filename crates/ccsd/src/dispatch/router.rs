//! Command routing for the compile service.
//!
//! Each parsed [`Command`] is routed to its handler, which produces the value
//! placed under `result` in the response. Handlers never write to the
//! connection themselves.

use std::sync::Arc;

use camino::Utf8Path;
use serde_json::Value;
use tracing::debug;

use crate::compile::CompileArgs;
use crate::service::ServiceState;

use super::errors::DispatchError;
use super::request::{Command, FileSpec};
use super::response::OK_RESULT;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Routes commands to handlers over the shared service state.
#[derive(Debug, Clone)]
pub struct CommandRouter {
    state: Arc<ServiceState>,
}

impl CommandRouter {
    /// Creates a router over `state`.
    pub fn new(state: Arc<ServiceState>) -> Self {
        Self { state }
    }

    /// Runs `command` and returns its result value.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownCommand`] for unrecognised commands and
    /// [`DispatchError::Compile`] when a compilation fails.
    pub fn route(&self, command: Command) -> Result<Value, DispatchError> {
        debug!(
            target: DISPATCH_TARGET,
            command = command.name(),
            "routing command"
        );
        match command {
            Command::Echo { msg } => Ok(msg),
            Command::GetFiles => Ok(Value::from(self.state.sources().identifiers())),
            Command::AddFile { file } => {
                self.add_file(file);
                Ok(Value::from(OK_RESULT))
            }
            Command::AddFiles { files } => {
                for file in files {
                    self.add_file(file);
                }
                Ok(Value::from(OK_RESULT))
            }
            Command::Compile { args } => self.compile(&args),
            Command::Unknown { name } => Err(DispatchError::unknown_command(name)),
        }
    }

    // Disk failures are logged by the cache and still answered with "OK".
    fn add_file(&self, file: FileSpec) {
        let sources = self.state.sources();
        match file {
            FileSpec::Inline { name, contents } => {
                sources.put(name, contents);
            }
            FileSpec::OnDisk { path, reload } => {
                if reload == Some(false) && sources.contains(&path) {
                    debug!(
                        target: DISPATCH_TARGET,
                        path = %path,
                        "file already cached; reload disabled"
                    );
                    return;
                }
                sources.put_from_disk(Utf8Path::new(&path));
            }
        }
    }

    fn compile(&self, args: &CompileArgs) -> Result<Value, DispatchError> {
        let output = self.state.translator().compile(args)?;
        Ok(Value::String(output))
    }
}
