//! Error types for compile translation and compiler execution.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::cache::LoadError;

/// Errors that fail a `compile` command.
#[derive(Debug, Error)]
pub enum CompileError {
    /// `args` did not match the accepted shape.
    #[error("invalid compile arguments: {message}")]
    InvalidArgs {
        /// Human-readable reason.
        message: String,
        /// Underlying deserialisation error.
        #[source]
        source: Option<serde_json::Error>,
    },
    /// A source identifier was neither cached nor readable.
    #[error("source '{key}' is unavailable: {source}")]
    MissingSource {
        /// Identifier supplied by the client.
        key: String,
        /// Why the fallback disk read failed.
        #[source]
        source: LoadError,
    },
    /// An extra extern was not cached under its absolute path.
    #[error("extern '{key}' is not cached as '{path}'")]
    MissingExtern {
        /// Identifier supplied by the client.
        key: String,
        /// Absolute path that was looked up.
        path: Utf8PathBuf,
    },
    /// The compiler rejected or failed to process the request.
    #[error(transparent)]
    Compiler(#[from] CompilerError),
}

impl CompileError {
    /// Wraps a deserialisation failure of the compile arguments.
    pub fn invalid_args(source: serde_json::Error) -> Self {
        Self::InvalidArgs {
            message: source.to_string(),
            source: Some(source),
        }
    }
}

/// Errors reported by an [`OptimizingCompiler`](super::OptimizingCompiler).
#[derive(Debug, Error)]
pub enum CompilerError {
    /// The configured compiler command was empty.
    #[error("no compiler command configured")]
    NoCommand,
    /// The compiler process could not be started.
    #[error("failed to spawn compiler '{program}': {source}")]
    SpawnFailed {
        /// Program that was executed.
        program: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// A pipe to the compiler process was not available.
    #[error("failed to capture compiler {stream}")]
    MissingPipe {
        /// Name of the stream.
        stream: &'static str,
    },
    /// Communication with the compiler process failed.
    #[error("compiler IO error: {source}")]
    Io {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The request could not be serialised.
    #[error("failed to serialise compiler request: {0}")]
    SerializeRequest(#[source] serde_json::Error),
    /// The compiler did not finish in time and was killed.
    #[error("compiler timed out after {timeout_secs}s")]
    Timeout {
        /// Configured budget in seconds.
        timeout_secs: u64,
    },
    /// The compiler exited unsuccessfully.
    #[error("compiler exited with status {status}")]
    NonZeroExit {
        /// Exit code, or -1 when terminated by a signal.
        status: i32,
    },
    /// The compiler produced output that is not a valid response.
    #[error("invalid compiler output: {message}")]
    InvalidOutput {
        /// Human-readable reason.
        message: String,
    },
    /// The compiler reported a compilation failure.
    #[error("compilation failed: {message}")]
    Failure {
        /// Message reported by the compiler.
        message: String,
    },
    /// The default extern set could not be loaded.
    #[error("failed to load default externs from '{path}': {message}")]
    DefaultExterns {
        /// Directory or file involved.
        path: Utf8PathBuf,
        /// Human-readable reason.
        message: String,
    },
}

impl CompilerError {
    /// Creates an invalid output error.
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput {
            message: message.into(),
        }
    }
}
