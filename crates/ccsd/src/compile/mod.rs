//! Translation of `compile` commands into compiler invocations.
//!
//! A `compile` command carries an `args` object naming source and extern
//! identifiers plus compiler options. [`CompileArgs`] is the typed view of
//! that object; [`CompileTranslator`] resolves the identifiers against the
//! source cache, prepends the compiler's default externs, and hands the
//! resulting [`CompileRequest`] to an [`OptimizingCompiler`].

mod args;
mod compiler;
mod errors;
mod options;
mod process;
mod translator;

pub use self::args::{CompilationLevel, CompileArgs, EntryPoints, WarningLevel};
pub use self::compiler::{CompileRequest, OptimizingCompiler};
pub use self::errors::{CompileError, CompilerError};
pub use self::options::{CompileOptions, DependencyManagement};
pub use self::process::ProcessCompiler;
pub use self::translator::CompileTranslator;

/// Tracing target for compile operations.
pub(crate) const COMPILE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::compile");
