//! Structured health reporting for service lifecycle events.

use std::net::SocketAddr;
use std::sync::Arc;

use ccs_config::{Config, DispatchMode};

use crate::bootstrap::BootstrapError;
use crate::cache::PreloadSummary;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer for lifecycle events.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked after the library tree has been loaded into the caches.
    fn preload_completed(&self, summary: &PreloadSummary);

    /// Invoked once the listener accepts connections.
    fn listener_started(&self, local_addr: SocketAddr, mode: DispatchMode);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn preload_completed(&self, summary: &PreloadSummary) {
        (**self).preload_completed(summary);
    }

    fn listener_started(&self, local_addr: SocketAddr, mode: DispatchMode) {
        (**self).listener_started(local_addr, mode);
    }
}

/// Reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting service bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            listen = %config.listen(),
            dispatch_mode = %config.dispatch_mode(),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            "service bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "service bootstrap failed"
        );
    }

    fn preload_completed(&self, summary: &PreloadSummary) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "preload_completed",
            sources = summary.sources,
            externs = summary.externs,
            failures = summary.failures,
            "library preload completed"
        );
    }

    fn listener_started(&self, local_addr: SocketAddr, mode: DispatchMode) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "listener_started",
            %local_addr,
            %mode,
            "accepting connections"
        );
    }
}
