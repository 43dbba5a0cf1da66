//! Compile-as-a-service daemon.
//!
//! `ccsd` keeps a warm cache of script sources and extern declarations and
//! compiles them on request. Clients open a TCP connection, send one JSON
//! command and read one JSON response `{"result": ...}`; see [`dispatch`]
//! for the command set.
//!
//! Startup loads configuration through [`ccs_config`], installs structured
//! telemetry, builds the compiler collaborator and, when a library root is
//! configured, preloads it into the caches. Lifecycle events are surfaced
//! through a [`HealthReporter`].
//!
//! Compilation itself is delegated to an [`compile::OptimizingCompiler`].
//! The production implementation, [`compile::ProcessCompiler`], runs an
//! adapter executable that speaks a line of JSON in each direction.

mod bootstrap;
pub mod cache;
pub mod compile;
pub mod dispatch;
mod health;
mod process;
mod service;
pub mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, CompilerProvider, ConfigLoader, Daemon, ProcessCompilerProvider,
    StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, run_daemon};
pub use service::ServiceState;
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{ListenerError, ListenerHandle};

#[cfg(test)]
mod tests;
