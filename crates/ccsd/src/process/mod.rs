//! Process lifecycle: bootstrap, serve, wait for a termination signal.

use std::time::Duration;

mod errors;
mod launch;
pub(crate) mod shutdown;

pub use errors::LaunchError;
pub use launch::run_daemon;
pub(crate) use launch::{LaunchPlan, run_daemon_with};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
/// Time the listener gets to finish its current connection after a signal.
pub(crate) const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);
