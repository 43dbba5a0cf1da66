//! Termination signal handling.
//!
//! Handlers are registered before the service binds its socket so a signal
//! arriving during bootstrap is not lost.

use std::fmt;
use std::io;
use std::sync::Mutex;

use signal_hook::consts::TERM_SIGNALS;
use signal_hook::consts::signal::SIGHUP;
use signal_hook::iterator::Signals;
use thiserror::Error;

/// Why the service is stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    /// A termination signal with the given number arrived.
    Signal(i32),
    /// Shutdown was requested without a signal.
    Requested,
}

impl fmt::Display for ShutdownCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(signal) => write!(f, "signal {signal}"),
            Self::Requested => f.write_str("request"),
        }
    }
}

/// Blocks until the service should stop.
pub trait ShutdownSignal: Send + Sync {
    /// Returns the reason once shutdown should proceed.
    fn wait(&self) -> Result<ShutdownCause, ShutdownError>;
}

/// Errors reported while waiting for shutdown.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Registering the signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The signal iterator was poisoned by a panicking waiter.
    #[error("signal listener state poisoned")]
    Poisoned,
}

/// Waits for SIGTERM, SIGINT, SIGQUIT, or SIGHUP.
pub struct SystemShutdownSignal {
    signals: Mutex<Signals>,
}

impl SystemShutdownSignal {
    /// Registers the termination handlers.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError::Install`] when a handler cannot be registered.
    pub fn install() -> Result<Self, ShutdownError> {
        let signals = TERM_SIGNALS.iter().copied().chain([SIGHUP]);
        let signals = Signals::new(signals).map_err(|source| ShutdownError::Install { source })?;
        Ok(Self {
            signals: Mutex::new(signals),
        })
    }
}

impl fmt::Debug for SystemShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemShutdownSignal").finish_non_exhaustive()
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<ShutdownCause, ShutdownError> {
        let mut signals = self.signals.lock().map_err(|_| ShutdownError::Poisoned)?;
        // The iterator only ends once its handle is closed.
        Ok(signals
            .forever()
            .next()
            .map_or(ShutdownCause::Requested, ShutdownCause::Signal))
    }
}
