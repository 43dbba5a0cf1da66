//! Runs the service until a termination signal arrives.

use std::sync::Arc;

use tracing::info;

use crate::bootstrap::{
    CompilerProvider, ConfigLoader, ProcessCompilerProvider, SystemConfigLoader, bootstrap_with,
};
use crate::health::{HealthReporter, StructuredHealthReporter};

use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};
use super::{PROCESS_TARGET, SHUTDOWN_TIMEOUT};

/// Collaborators required to run the service.
pub(crate) struct LaunchPlan<L, P, S> {
    pub(crate) loader: L,
    pub(crate) provider: P,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) shutdown: S,
}

/// Runs the service with the production collaborators.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap, listener startup or signal
/// handling fails, or when the listener does not stop within the shutdown
/// budget.
pub fn run_daemon() -> Result<(), LaunchError> {
    run_daemon_with(LaunchPlan {
        loader: SystemConfigLoader,
        provider: ProcessCompilerProvider,
        reporter: Arc::new(StructuredHealthReporter::new()),
        shutdown: SystemShutdownSignal::install()?,
    })
}

/// Runs the service with injected collaborators.
pub(crate) fn run_daemon_with<L, P, S>(plan: LaunchPlan<L, P, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    P: CompilerProvider,
    S: ShutdownSignal,
{
    let LaunchPlan {
        loader,
        provider,
        reporter,
        shutdown,
    } = plan;

    let daemon = bootstrap_with(&loader, reporter, &provider)?;
    let listener = daemon.start()?;
    info!(
        target: PROCESS_TARGET,
        local_addr = %listener.local_addr(),
        "service running"
    );
    let cause = shutdown.wait();
    listener.join_within(SHUTDOWN_TIMEOUT)?;
    let cause = cause?;
    info!(target: PROCESS_TARGET, %cause, "shutdown sequence completed");
    Ok(())
}
