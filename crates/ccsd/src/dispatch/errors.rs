//! Error types for request dispatch failures.
//!
//! Protocol violations ([`DispatchError::abandons_connection`]) end the
//! connection without a response. Every other variant is answered with the
//! bare `"ERROR"` result; the details only reach the logs.

use std::io;

use thiserror::Error;

use crate::compile::CompileError;

use super::codec::CodecError;

/// Errors surfaced during request parsing and dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request could not be read or parsed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The request is not an object with a string `cmd`.
    #[error("request has no string 'cmd' field")]
    MissingCommand,

    /// `cmd` names no known command.
    #[error("unknown command: {name}")]
    UnknownCommand { name: String },

    /// A known command lacks a required field.
    #[error("'{command}' requires a '{field}' field")]
    MissingField {
        command: &'static str,
        field: &'static str,
    },

    /// A file spec is neither `{name, contents}` nor `{path, reload?}`.
    #[error("invalid file spec: {message}")]
    InvalidFileSpec {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The compile command failed.
    #[error("compile failed: {0}")]
    Compile(#[from] CompileError),

    /// IO error while writing the response.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Response serialisation failed.
    #[error("failed to serialise response: {0}")]
    SerializeResponse(#[from] serde_json::Error),

    /// A handler panicked.
    #[error("handler panicked: {message}")]
    Panicked { message: String },
}

impl DispatchError {
    /// Returns whether the connection should be dropped without a response.
    #[must_use]
    pub fn abandons_connection(&self) -> bool {
        matches!(self, Self::Codec(_) | Self::MissingCommand)
    }

    /// Creates an unknown command error.
    pub fn unknown_command(name: impl Into<String>) -> Self {
        Self::UnknownCommand { name: name.into() }
    }

    /// Creates an invalid file spec error from a serde error.
    pub fn invalid_file_spec(source: serde_json::Error) -> Self {
        Self::InvalidFileSpec {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a panic error from a caught panic payload.
    pub fn panicked(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|message| (*message).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| String::from("non-string panic payload"));
        Self::Panicked { message }
    }
}
