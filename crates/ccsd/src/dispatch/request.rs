//! Request parsing for the compile service protocol.
//!
//! A request is a single JSON object whose `cmd` field selects the command.
//! The remaining fields are command-specific and validated here, before any
//! handler runs.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::compile::CompileArgs;

use super::errors::DispatchError;

/// A file to add to the source cache.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FileSpec {
    /// Text supplied by the client.
    Inline {
        /// Identifier to store the text under.
        name: String,
        /// Source text.
        contents: String,
    },
    /// A file on the server's disk.
    OnDisk {
        /// Path to read; also the cache identifier.
        path: String,
        /// `Some(false)` skips the read when `path` is already cached.
        #[serde(default)]
        reload: Option<bool>,
    },
}

impl FileSpec {
    fn parse(value: Value) -> Result<Self, DispatchError> {
        Self::deserialize(value).map_err(DispatchError::invalid_file_spec)
    }
}

/// Parsed client command.
#[derive(Debug)]
pub enum Command {
    /// Return `msg` unchanged.
    Echo {
        /// Arbitrary JSON value.
        msg: Value,
    },
    /// List the source cache identifiers.
    GetFiles,
    /// Add one file to the source cache.
    AddFile {
        /// File to add.
        file: FileSpec,
    },
    /// Add several files to the source cache.
    AddFiles {
        /// Files to add, in order.
        files: Vec<FileSpec>,
    },
    /// Compile cached sources.
    Compile {
        /// Compile arguments.
        args: Box<CompileArgs>,
    },
    /// Any other `cmd` value.
    Unknown {
        /// The unrecognised command name.
        name: String,
    },
}

impl Command {
    /// Parses a request value.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MissingCommand`] when `value` is not an object
    /// with a string `cmd`, and other [`DispatchError`] variants when the
    /// command's own fields are missing or malformed.
    pub fn parse(value: Value) -> Result<Self, DispatchError> {
        let Value::Object(mut fields) = value else {
            return Err(DispatchError::MissingCommand);
        };
        let name = match fields.remove("cmd") {
            Some(Value::String(name)) => name,
            _ => return Err(DispatchError::MissingCommand),
        };

        match name.as_str() {
            "echo" => Ok(Self::Echo {
                msg: take_field(&mut fields, "echo", "msg")?,
            }),
            "getFiles" => Ok(Self::GetFiles),
            "addFile" => Ok(Self::AddFile {
                file: FileSpec::parse(take_field(&mut fields, "addFile", "file")?)?,
            }),
            "addFiles" => {
                let files = take_field(&mut fields, "addFiles", "files")?;
                let files = Vec::<FileSpec>::deserialize(files)
                    .map_err(DispatchError::invalid_file_spec)?;
                Ok(Self::AddFiles { files })
            }
            "compile" => {
                let args = take_field(&mut fields, "compile", "args")?;
                Ok(Self::Compile {
                    args: Box::new(CompileArgs::from_value(&args)?),
                })
            }
            _ => Ok(Self::Unknown { name }),
        }
    }

    /// Command name used in log events.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Echo { .. } => "echo",
            Self::GetFiles => "getFiles",
            Self::AddFile { .. } => "addFile",
            Self::AddFiles { .. } => "addFiles",
            Self::Compile { .. } => "compile",
            Self::Unknown { name } => name,
        }
    }
}

fn take_field(
    fields: &mut Map<String, Value>,
    command: &'static str,
    field: &'static str,
) -> Result<Value, DispatchError> {
    fields
        .remove(field)
        .ok_or(DispatchError::MissingField { command, field })
}
