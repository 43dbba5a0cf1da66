//! State shared by every connection.

use std::fmt;
use std::sync::Arc;

use crate::cache::{ExternCache, SourceCache};
use crate::compile::{CompileTranslator, OptimizingCompiler};

/// Caches and compiler shared across connections.
pub struct ServiceState {
    sources: SourceCache,
    externs: ExternCache,
    compiler: Arc<dyn OptimizingCompiler>,
}

impl ServiceState {
    /// Creates state with empty caches.
    pub fn new(compiler: Arc<dyn OptimizingCompiler>) -> Self {
        Self {
            sources: SourceCache::new(),
            externs: ExternCache::new(),
            compiler,
        }
    }

    /// The source cache.
    #[must_use]
    pub fn sources(&self) -> &SourceCache {
        &self.sources
    }

    /// The extern cache.
    #[must_use]
    pub fn externs(&self) -> &ExternCache {
        &self.externs
    }

    /// A translator over the source cache and compiler.
    #[must_use]
    pub fn translator(&self) -> CompileTranslator<'_> {
        CompileTranslator::new(&self.sources, self.compiler.as_ref())
    }
}

impl fmt::Debug for ServiceState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ServiceState")
            .field("sources", &self.sources)
            .field("externs", &self.externs)
            .finish_non_exhaustive()
    }
}
