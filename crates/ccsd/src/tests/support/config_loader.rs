//! Configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};

use ccs_config::{Config, DispatchMode, TcpEndpoint};

use crate::bootstrap::ConfigLoader;

/// Loader that binds an ephemeral loopback port.
#[derive(Debug, Clone, Default)]
pub(crate) struct TestConfigLoader {
    preload_root: Option<Utf8PathBuf>,
    dispatch_mode: DispatchMode,
}

impl TestConfigLoader {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Loads the given library tree at startup.
    #[must_use]
    pub(crate) fn with_preload_root(mut self, root: Utf8PathBuf) -> Self {
        self.preload_root = Some(root);
        self
    }

    #[must_use]
    pub(crate) fn with_dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.dispatch_mode = mode;
        self
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            listen: TcpEndpoint::new("127.0.0.1", 0),
            dispatch_mode: self.dispatch_mode,
            preload_root: self.preload_root.clone(),
            ..Config::default()
        })
    }
}

/// Loader that fails by passing an unparsable CLI argument.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter([
            OsString::from("ccsd"),
            OsString::from("--compiler-timeout-secs"),
            OsString::from("soon"),
        ])
    }
}
