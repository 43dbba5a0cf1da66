//! Service bootstrap orchestration.

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use ccs_config::Config;

use crate::cache::{PreloadError, preload_library};
use crate::compile::{CompilerError, OptimizingCompiler, ProcessCompiler};
use crate::dispatch::DispatchConnectionHandler;
use crate::health::HealthReporter;
use crate::service::ServiceState;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::transport::{ListenerError, ListenerHandle, SocketListener};

/// Abstracts configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the service configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that hands out a configuration resolved elsewhere.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Builds the compiler collaborator from configuration.
pub trait CompilerProvider: Send + Sync {
    /// Creates the compiler used for every `compile` request.
    fn provide(&self, config: &Config) -> Result<Arc<dyn OptimizingCompiler>, CompilerError>;
}

/// Provider that runs the configured adapter command.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessCompilerProvider;

impl CompilerProvider for ProcessCompilerProvider {
    fn provide(&self, config: &Config) -> Result<Arc<dyn OptimizingCompiler>, CompilerError> {
        let compiler = ProcessCompiler::from_config(config)?;
        Ok(Arc::new(compiler))
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The compiler collaborator could not be built.
    #[error("failed to prepare compiler: {source}")]
    Compiler {
        /// Underlying compiler error.
        #[source]
        source: CompilerError,
    },
    /// The library tree could not be loaded.
    #[error("failed to preload library: {source}")]
    Preload {
        /// Underlying preload error.
        #[source]
        source: PreloadError,
    },
}

/// Result of a successful bootstrap.
pub struct Daemon {
    config: Config,
    state: Arc<ServiceState>,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Caches and compiler shared with every connection.
    #[must_use]
    pub fn state(&self) -> &Arc<ServiceState> {
        &self.state
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Binds the configured endpoint and starts serving connections.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] when the endpoint cannot be bound or the
    /// listener thread cannot be spawned.
    pub fn start(&self) -> Result<ListenerHandle, ListenerError> {
        let listener = SocketListener::bind(self.config.listen())?;
        let handler = Arc::new(DispatchConnectionHandler::new(Arc::clone(&self.state)));
        let mode = self.config.dispatch_mode();
        let handle = listener.start(handler, mode)?;
        self.reporter.listener_started(handle.local_addr(), mode);
        Ok(handle)
    }
}

/// Bootstraps the service using the supplied collaborators.
///
/// Loads configuration, installs telemetry, builds the compiler and preloads
/// the library tree when `preload_root` is set. Every failure is reported
/// through `reporter` before it is returned.
///
/// # Errors
///
/// Returns [`BootstrapError`] for the first step that fails.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    provider: &dyn CompilerProvider,
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();
    let fail = |error: BootstrapError| {
        reporter.bootstrap_failed(&error);
        error
    };

    let config = loader
        .load()
        .map_err(|source| fail(BootstrapError::Configuration { source }))?;
    let telemetry = telemetry::initialise(&config)
        .map_err(|source| fail(BootstrapError::Telemetry { source }))?;
    let compiler = provider
        .provide(&config)
        .map_err(|source| fail(BootstrapError::Compiler { source }))?;

    let state = Arc::new(ServiceState::new(compiler));
    if let Some(root) = config.preload_root() {
        let summary = preload_library(root, state.sources(), state.externs())
            .map_err(|source| fail(BootstrapError::Preload { source }))?;
        reporter.preload_completed(&summary);
    }

    reporter.bootstrap_succeeded(&config);
    Ok(Daemon {
        config,
        state,
        telemetry,
        reporter,
    })
}
