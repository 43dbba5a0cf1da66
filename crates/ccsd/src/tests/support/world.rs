//! BDD world for bootstrap scenarios: loader, reporter, compiler and the
//! resulting daemon.

use std::cell::RefCell;
use std::fs;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

use crate::bootstrap::{BootstrapError, ConfigLoader, Daemon, bootstrap_with};
use crate::transport::ListenerHandle;

use super::compiler::RecordingProvider;
use super::config_loader::{FailingConfigLoader, TestConfigLoader};
use super::reporter::RecordingHealthReporter;

/// Scenario world shared across bootstrap steps.
pub(crate) struct TestWorld {
    loader: Box<dyn ConfigLoader>,
    pub(crate) reporter: Arc<RecordingHealthReporter>,
    pub(crate) provider: RecordingProvider,
    daemon: Option<Daemon>,
    bootstrap_error: Option<BootstrapError>,
    listener: Option<ListenerHandle>,
    library: Option<TempDir>,
}

impl TestWorld {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            loader: Box::new(TestConfigLoader::new()),
            reporter: Arc::new(RecordingHealthReporter::default()),
            provider: RecordingProvider::default(),
            daemon: None,
            bootstrap_error: None,
            listener: None,
            library: None,
        }
    }

    pub(crate) fn use_successful_loader(&mut self) {
        self.loader = Box::new(TestConfigLoader::new());
        self.reset_results();
    }

    pub(crate) fn use_failing_loader(&mut self) {
        self.loader = Box::new(FailingConfigLoader);
        self.reset_results();
    }

    /// Writes a library tree with the given number of sources and externs
    /// and configures it as the preload root.
    pub(crate) fn use_library(&mut self, sources: usize, externs: usize) {
        let dir = tempfile::tempdir().expect("library temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir");
        write_scripts(&root.join("closure/goog"), "source", sources);
        write_scripts(&root.join("externs"), "extern", externs);
        self.loader = Box::new(TestConfigLoader::new().with_preload_root(root));
        self.library = Some(dir);
        self.reset_results();
    }

    pub(crate) fn use_missing_library(&mut self) {
        let dir = tempfile::tempdir().expect("library temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().join("absent")).expect("utf8 temp dir");
        self.loader = Box::new(TestConfigLoader::new().with_preload_root(root));
        self.library = Some(dir);
        self.reset_results();
    }

    /// Runs the bootstrap sequence once.
    pub(crate) fn bootstrap(&mut self) {
        if self.daemon.is_some() || self.bootstrap_error.is_some() {
            return;
        }
        match bootstrap_with(&*self.loader, self.reporter.clone(), &self.provider) {
            Ok(daemon) => self.daemon = Some(daemon),
            Err(error) => self.bootstrap_error = Some(error),
        }
    }

    pub(crate) fn start_listener(&mut self) {
        let daemon = self.daemon.as_ref().expect("daemon should be bootstrapped");
        self.listener = Some(daemon.start().expect("listener should start"));
    }

    #[must_use]
    pub(crate) fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.bootstrap_error.as_ref()
    }

    #[must_use]
    pub(crate) fn daemon(&self) -> Option<&Daemon> {
        self.daemon.as_ref()
    }

    #[must_use]
    pub(crate) fn listener(&self) -> Option<&ListenerHandle> {
        self.listener.as_ref()
    }

    fn reset_results(&mut self) {
        self.stop_listener();
        self.daemon = None;
        self.bootstrap_error = None;
    }

    fn stop_listener(&mut self) {
        if let Some(handle) = self.listener.take() {
            handle.shutdown();
            drop(handle.join());
        }
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestWorld {
    fn drop(&mut self) {
        self.stop_listener();
    }
}

fn write_scripts(dir: &Utf8Path, stem: &str, count: usize) {
    fs::create_dir_all(dir).expect("create library dir");
    for index in 0..count {
        let path = dir.join(format!("{stem}{index}.js"));
        fs::write(&path, format!("var {stem}{index};\n")).expect("write library file");
    }
}

/// Default bootstrap world fixture.
#[must_use]
pub(crate) fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
