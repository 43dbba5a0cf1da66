//! Seam between the service and the optimizing compiler.

use serde::Serialize;

use crate::cache::Entry;

use super::errors::CompilerError;
use super::options::CompileOptions;

/// Fully resolved input for one compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompileRequest {
    /// Sources in compilation order.
    pub sources: Vec<Entry>,
    /// Default externs followed by caller-supplied externs.
    pub externs: Vec<Entry>,
    /// Compiler options.
    pub options: CompileOptions,
}

/// Black-box compiler: resolved inputs in, rendered output out.
pub trait OptimizingCompiler: Send + Sync {
    /// Extern declarations included in every compilation.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError`] when the defaults cannot be produced.
    fn default_externs(&self) -> Result<Vec<Entry>, CompilerError>;

    /// Compiles `request` and returns the rendered output.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError`] when compilation fails.
    fn compile(&self, request: &CompileRequest) -> Result<String, CompilerError>;
}
