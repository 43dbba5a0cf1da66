//! Compiler double that records every request it receives.

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use ccs_config::Config;

use crate::bootstrap::CompilerProvider;
use crate::cache::Entry;
use crate::compile::{CompileRequest, CompilerError, OptimizingCompiler};

#[derive(Debug, Clone, Default)]
enum Behaviour {
    /// Joins source contents with newlines.
    #[default]
    Concatenate,
    Fail(String),
    Panic(String),
}

#[derive(Debug, Default)]
struct Inner {
    default_externs: Vec<Entry>,
    behaviour: Behaviour,
    delay: Option<Duration>,
    requests: Vec<CompileRequest>,
}

/// Compiler whose output is the concatenated source text.
///
/// Clones share state, so a test can keep one handle while the service owns
/// another.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingCompiler {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingCompiler {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("recording compiler mutex poisoned")
    }

    pub(crate) fn set_default_externs(&self, externs: Vec<Entry>) {
        self.lock().default_externs = externs;
    }

    /// Makes every compile fail with `message`.
    pub(crate) fn fail_with(&self, message: &str) {
        self.lock().behaviour = Behaviour::Fail(message.to_owned());
    }

    /// Makes every compile panic with `message`.
    pub(crate) fn panic_with(&self, message: &str) {
        self.lock().behaviour = Behaviour::Panic(message.to_owned());
    }

    /// Makes every compile sleep for `delay` before answering.
    pub(crate) fn delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    pub(crate) fn requests(&self) -> Vec<CompileRequest> {
        self.lock().requests.clone()
    }
}

impl OptimizingCompiler for RecordingCompiler {
    fn default_externs(&self) -> Result<Vec<Entry>, CompilerError> {
        Ok(self.lock().default_externs.clone())
    }

    fn compile(&self, request: &CompileRequest) -> Result<String, CompilerError> {
        // The lock is released before sleeping so tests can inspect requests.
        let (delay, behaviour) = {
            let mut inner = self.lock();
            inner.requests.push(request.clone());
            (inner.delay, inner.behaviour.clone())
        };
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
        match behaviour {
            Behaviour::Concatenate => Ok(concatenate(request)),
            Behaviour::Fail(message) => Err(CompilerError::Failure { message }),
            Behaviour::Panic(message) => panic!("{message}"),
        }
    }
}

fn concatenate(request: &CompileRequest) -> String {
    request
        .sources
        .iter()
        .map(Entry::contents)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Provider that hands the service a shared [`RecordingCompiler`].
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingProvider {
    pub(crate) compiler: RecordingCompiler,
}

impl CompilerProvider for RecordingProvider {
    fn provide(&self, _config: &Config) -> Result<Arc<dyn OptimizingCompiler>, CompilerError> {
        Ok(Arc::new(self.compiler.clone()))
    }
}
