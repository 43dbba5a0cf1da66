//! Typed view of the `args` object carried by a `compile` command.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::CompileError;

/// Optimisation level requested from the compiler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompilationLevel {
    /// Strip whitespace and comments only.
    WhitespaceOnly,
    /// Local renaming and simplification.
    #[default]
    SimpleOptimizations,
    /// Whole-program renaming and dead code removal.
    AdvancedOptimizations,
}

/// Diagnostic verbosity requested from the compiler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningLevel {
    /// Suppress warnings.
    #[default]
    Quiet,
    /// The compiler's standard warning set.
    Default,
    /// Every available check.
    Verbose,
}

/// One or more dependency-management entry points.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EntryPoints {
    /// A single namespace.
    One(String),
    /// Several namespaces in order.
    Many(Vec<String>),
}

impl EntryPoints {
    /// Flattens the entry points into a list.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(entry) => vec![entry],
            Self::Many(entries) => entries,
        }
    }
}

/// Arguments accepted by the `compile` command.
///
/// Unknown fields and values of the wrong type are rejected. `define`,
/// `create_source_map`, and `create_name_map_files` are accepted for
/// compatibility with existing clients but never reach the compiler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompileArgs {
    /// Source identifiers in compilation order.
    #[serde(default)]
    pub js: Vec<String>,
    /// Extern identifiers appended after the compiler defaults.
    #[serde(default)]
    pub externs: Vec<String>,
    /// Output charset.
    #[serde(default)]
    pub charset: Option<String>,
    /// Any value here, `false` included, turns dependency management on.
    #[serde(default)]
    pub manage_closure_dependencies: Option<bool>,
    /// Entry points for dependency management.
    #[serde(default)]
    pub closure_entry_point: Option<EntryPoints>,
    /// Optimisation level.
    #[serde(default)]
    pub compilation_level: CompilationLevel,
    /// Warning level.
    #[serde(default)]
    pub warning_level: WarningLevel,
    /// Whether to process `goog.provide`/`goog.require` primitives.
    #[serde(default)]
    pub process_closure_primitives: Option<bool>,
    /// Whether to accept the `const` keyword.
    #[serde(default)]
    pub accept_const_keyword: Option<bool>,
    /// Whether to eliminate dead assignments.
    #[serde(default, rename = "deadAssignmentElimination")]
    pub dead_assignment_elimination: Option<bool>,
    /// Whether to remove unreachable code.
    #[serde(default, rename = "removeDeadCode")]
    pub remove_dead_code: Option<bool>,
    /// Whether to run in IDE mode.
    #[serde(default, rename = "ideMode")]
    pub ide_mode: Option<bool>,
    /// `true` selects the debug variant of the compilation level.
    #[serde(default)]
    pub debug: Option<bool>,
    /// Accepted and ignored.
    #[serde(default)]
    pub define: Option<Value>,
    /// Accepted and ignored.
    #[serde(default)]
    pub create_source_map: Option<Value>,
    /// Accepted and ignored.
    #[serde(default)]
    pub create_name_map_files: Option<Value>,
}

impl CompileArgs {
    /// Parses compile arguments from a request value.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidArgs`] when `value` is not an object,
    /// carries an unknown field, or holds a value of the wrong type.
    pub fn from_value(value: &Value) -> Result<Self, CompileError> {
        Self::deserialize(value).map_err(CompileError::invalid_args)
    }

    /// Returns whether dependency management was requested.
    #[must_use]
    pub const fn manages_dependencies(&self) -> bool {
        self.manage_closure_dependencies.is_some()
    }
}
