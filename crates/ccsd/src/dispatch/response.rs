//! Response serialisation for the dispatch loop.

use std::io::Write;

use serde::Serialize;
use serde_json::Value;

use super::errors::DispatchError;

/// Result value sent for successful mutations.
pub(crate) const OK_RESULT: &str = "OK";

/// Result value sent for every failed command.
pub(crate) const ERROR_RESULT: &str = "ERROR";

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    result: &'a Value,
}

/// Writer that wraps a value in `{"result": ...}` and sends it.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Creates a new response writer wrapping the given output stream.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes `{"result": result}` followed by a newline and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub fn write_result(&mut self, result: &Value) -> Result<(), DispatchError> {
        serde_json::to_writer(&mut self.writer, &Envelope { result })?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Writes the `"ERROR"` result.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_error(&mut self) -> Result<(), DispatchError> {
        self.write_result(&Value::from(ERROR_RESULT))
    }
}
