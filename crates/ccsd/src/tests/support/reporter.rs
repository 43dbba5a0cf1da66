//! Health reporter double that records lifecycle events for assertions.

use std::net::SocketAddr;
use std::sync::Mutex;

use ccs_config::{Config, DispatchMode};

use crate::bootstrap::BootstrapError;
use crate::cache::PreloadSummary;
use crate::health::HealthReporter;

/// Lifecycle events captured during a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    /// Bootstrap failed with the rendered error.
    BootstrapFailed(String),
    PreloadCompleted(PreloadSummary),
    ListenerStarted {
        local_addr: SocketAddr,
        mode: DispatchMode,
    },
}

#[derive(Debug, Default)]
pub(crate) struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Copy of the events recorded so far.
    #[must_use]
    pub(crate) fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn preload_completed(&self, summary: &PreloadSummary) {
        self.record(HealthEvent::PreloadCompleted(*summary));
    }

    fn listener_started(&self, local_addr: SocketAddr, mode: DispatchMode) {
        self.record(HealthEvent::ListenerStarted { local_addr, mode });
    }
}
