//! Builds a [`CompileRequest`] from client arguments and cached entries.

use tracing::{debug, warn};

use crate::cache::{Entry, Resolution, SourceCache, absolute_key};

use super::COMPILE_TARGET;
use super::args::CompileArgs;
use super::compiler::{CompileRequest, OptimizingCompiler};
use super::errors::CompileError;
use super::options::CompileOptions;

/// Resolves compile arguments against the source cache and runs the
/// compiler.
pub struct CompileTranslator<'a> {
    sources: &'a SourceCache,
    compiler: &'a dyn OptimizingCompiler,
}

impl<'a> CompileTranslator<'a> {
    /// Creates a translator over the given cache and compiler.
    pub fn new(sources: &'a SourceCache, compiler: &'a dyn OptimizingCompiler) -> Self {
        Self { sources, compiler }
    }

    /// Resolves `args` into a compile request.
    ///
    /// Sources are looked up with [`SourceCache::resolve`], which may load
    /// them from disk. Extra externs are looked up in the *source* cache under
    /// their absolute path and are never loaded from disk.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::MissingSource`] or
    /// [`CompileError::MissingExtern`] when an identifier cannot be resolved.
    pub fn translate(&self, args: &CompileArgs) -> Result<CompileRequest, CompileError> {
        let sources = args
            .js
            .iter()
            .map(|key| self.resolve_source(key))
            .collect::<Result<Vec<_>, _>>()?;

        let mut externs = self.default_externs();
        for key in &args.externs {
            externs.push(self.resolve_extern(key)?);
        }

        Ok(CompileRequest {
            sources,
            externs,
            options: CompileOptions::from(args),
        })
    }

    /// Translates `args` and compiles the result.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] when translation or compilation fails.
    pub fn compile(&self, args: &CompileArgs) -> Result<String, CompileError> {
        let request = self.translate(args)?;
        debug!(
            target: COMPILE_TARGET,
            sources = request.sources.len(),
            externs = request.externs.len(),
            level = ?request.options.compilation_level,
            "invoking compiler"
        );
        Ok(self.compiler.compile(&request)?)
    }

    fn resolve_source(&self, key: &str) -> Result<Entry, CompileError> {
        match self.sources.resolve(key) {
            Resolution::Cached(entry) => Ok(entry),
            Resolution::Loaded(entry) => {
                debug!(
                    target: COMPILE_TARGET,
                    key,
                    path = entry.name(),
                    "loaded source from disk"
                );
                Ok(entry)
            }
            Resolution::Missing { error, .. } => Err(CompileError::MissingSource {
                key: key.to_owned(),
                source: error,
            }),
        }
    }

    fn resolve_extern(&self, key: &str) -> Result<Entry, CompileError> {
        let path = absolute_key(key).map_err(|_| CompileError::MissingExtern {
            key: key.to_owned(),
            path: key.into(),
        })?;
        self.sources
            .try_get(path.as_str())
            .ok_or_else(|| CompileError::MissingExtern {
                key: key.to_owned(),
                path,
            })
    }

    fn default_externs(&self) -> Vec<Entry> {
        match self.compiler.default_externs() {
            Ok(externs) => externs,
            Err(error) => {
                warn!(
                    target: COMPILE_TARGET,
                    %error,
                    "default externs unavailable; compiling without them"
                );
                Vec::new()
            }
        }
    }
}
