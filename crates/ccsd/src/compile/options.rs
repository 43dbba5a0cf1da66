//! Options forwarded to the compiler alongside the resolved inputs.

use serde::Serialize;

use super::args::{CompilationLevel, CompileArgs, EntryPoints, WarningLevel};

/// Dependency-management settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyManagement {
    /// Namespaces to keep; empty keeps every provided namespace.
    pub entry_points: Vec<String>,
}

/// Compiler options derived from [`CompileArgs`].
///
/// Flags left unset by the caller are omitted on the wire so the compiler
/// applies its own defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompileOptions {
    /// Optimisation level.
    pub compilation_level: CompilationLevel,
    /// Whether to apply the debug variant of the level.
    pub debug: bool,
    /// Warning level.
    pub warning_level: WarningLevel,
    /// Output charset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    /// Dependency management, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency_management: Option<DependencyManagement>,
    /// Whether to process closure primitives.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_closure_primitives: Option<bool>,
    /// Whether to accept the `const` keyword.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_const_keyword: Option<bool>,
    /// Whether to eliminate dead assignments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dead_assignment_elimination: Option<bool>,
    /// Whether to remove unreachable code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_dead_code: Option<bool>,
    /// Whether to run in IDE mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ide_mode: Option<bool>,
}

impl From<&CompileArgs> for CompileOptions {
    fn from(args: &CompileArgs) -> Self {
        // Entry points only count when dependency management is on.
        let dependency_management = args.manages_dependencies().then(|| DependencyManagement {
            entry_points: args
                .closure_entry_point
                .clone()
                .map(EntryPoints::into_vec)
                .unwrap_or_default(),
        });
        Self {
            compilation_level: args.compilation_level,
            // Presence alone selects the debug variant, as with dependency management.
            debug: args.debug.is_some(),
            warning_level: args.warning_level,
            charset: args.charset.clone(),
            dependency_management,
            process_closure_primitives: args.process_closure_primitives,
            accept_const_keyword: args.accept_const_keyword,
            dead_assignment_elimination: args.dead_assignment_elimination,
            remove_dead_code: args.remove_dead_code,
            ide_mode: args.ide_mode,
        }
    }
}
