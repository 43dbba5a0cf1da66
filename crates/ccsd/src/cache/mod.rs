//! In-memory stores of source text keyed by file name or path.
//!
//! The service keeps two independent stores: one for compilable sources and
//! one for extern declarations. They are distinct types ([`SourceCache`] and
//! [`ExternCache`]) so an identifier in one can never be confused with the
//! same string in the other. Entries are only ever added or overwritten.
//!
//! Reads never touch the disk implicitly. [`EntryCache::resolve`] is the one
//! operation that may load a file, and its [`Resolution`] says whether it did.

mod load;
mod preload;

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{debug, warn};

pub use self::load::{LINE_SEPARATOR, LoadError, absolute_key, read_normalised};
pub(crate) use self::preload::scan_scripts;
pub use self::preload::{PreloadError, PreloadSummary, preload_library};

/// Tracing target for cache operations.
pub(crate) const CACHE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::cache");

/// A named unit of text held by a cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    name: String,
    contents: Arc<str>,
}

impl Entry {
    /// Creates an entry.
    pub fn new(name: impl Into<String>, contents: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    /// Identifier the entry is stored under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current text of the entry.
    #[must_use]
    pub fn contents(&self) -> &str {
        &self.contents
    }
}

/// Names the key-space a cache instance belongs to.
pub trait CacheKind: Send + Sync + 'static {
    /// Label used in log events.
    const LABEL: &'static str;
}

/// Key-space of compilable sources.
#[derive(Debug)]
pub enum Sources {}

/// Key-space of extern declarations.
#[derive(Debug)]
pub enum Externs {}

impl CacheKind for Sources {
    const LABEL: &'static str = "sources";
}

impl CacheKind for Externs {
    const LABEL: &'static str = "externs";
}

/// Cache of compilable sources.
pub type SourceCache = EntryCache<Sources>;

/// Cache of extern declarations.
pub type ExternCache = EntryCache<Externs>;

/// Outcome of [`EntryCache::resolve`].
#[derive(Debug)]
pub enum Resolution {
    /// Found in the cache without touching the disk.
    Cached(Entry),
    /// Not cached; read from disk and inserted under `entry.name()`.
    Loaded(Entry),
    /// Neither cached nor readable.
    Missing {
        /// Absolute path that was tried last.
        path: Utf8PathBuf,
        /// Why the disk read failed.
        error: LoadError,
    },
}

impl Resolution {
    /// Returns the resolved entry, if any.
    #[must_use]
    pub fn into_entry(self) -> Option<Entry> {
        match self {
            Self::Cached(entry) | Self::Loaded(entry) => Some(entry),
            Self::Missing { .. } => None,
        }
    }
}

/// Thread-safe identifier → [`Entry`] map for one key-space.
pub struct EntryCache<K> {
    entries: RwLock<BTreeMap<String, Entry>>,
    kind: PhantomData<K>,
}

impl<K> Default for EntryCache<K> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            kind: PhantomData,
        }
    }
}

impl<K: CacheKind> fmt::Debug for EntryCache<K> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("EntryCache")
            .field("kind", &K::LABEL)
            .field("len", &self.len())
            .finish()
    }
}

impl<K: CacheKind> EntryCache<K> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether `key` is cached. Matching is exact; no path
    /// normalisation takes place.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.read(|entries| entries.contains_key(key))
    }

    /// Returns the entry cached under `key`.
    #[must_use]
    pub fn try_get(&self, key: &str) -> Option<Entry> {
        self.read(|entries| entries.get(key).cloned())
    }

    /// Stores `contents` under `key`, replacing any previous entry.
    pub fn put(&self, key: impl Into<String>, contents: impl Into<Arc<str>>) -> Entry {
        let entry = Entry::new(key, contents);
        debug!(
            target: CACHE_TARGET,
            cache = K::LABEL,
            name = entry.name(),
            bytes = entry.contents().len(),
            "cached entry"
        );
        self.write(|entries| {
            entries.insert(entry.name().to_owned(), entry.clone());
        });
        entry
    }

    /// Reads `path` from disk and caches it under the path string.
    ///
    /// The cache is left unchanged when the read fails.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] when the file cannot be read.
    pub fn load_and_insert(&self, path: &Utf8Path) -> Result<Entry, LoadError> {
        let contents = read_normalised(path)?;
        Ok(self.put(path.as_str(), contents))
    }

    /// Like [`Self::load_and_insert`], but logs failures instead of returning
    /// them.
    pub fn put_from_disk(&self, path: &Utf8Path) -> Option<Entry> {
        match self.load_and_insert(path) {
            Ok(entry) => Some(entry),
            Err(error) => {
                warn!(
                    target: CACHE_TARGET,
                    cache = K::LABEL,
                    path = %path,
                    %error,
                    "failed to load entry from disk"
                );
                None
            }
        }
    }

    /// Looks `key` up, falling back to its absolute path and then to the
    /// disk.
    ///
    /// A disk read caches the entry under the absolute path.
    pub fn resolve(&self, key: &str) -> Resolution {
        if let Some(entry) = self.try_get(key) {
            return Resolution::Cached(entry);
        }
        let path = match absolute_key(key) {
            Ok(path) => path,
            Err(error) => {
                return Resolution::Missing {
                    path: Utf8PathBuf::from(key),
                    error,
                };
            }
        };
        if let Some(entry) = self.try_get(path.as_str()) {
            return Resolution::Cached(entry);
        }
        match self.load_and_insert(&path) {
            Ok(entry) => Resolution::Loaded(entry),
            Err(error) => Resolution::Missing { path, error },
        }
    }

    /// All cached identifiers in ascending order.
    #[must_use]
    pub fn identifiers(&self) -> Vec<String> {
        self.read(|entries| entries.keys().cloned().collect())
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read(BTreeMap::len)
    }

    /// Returns whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A poisoned lock still holds a consistent map: every write is a single
    // `insert`.
    fn read<T>(&self, f: impl FnOnce(&BTreeMap<String, Entry>) -> T) -> T {
        let guard = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<T>(&self, f: impl FnOnce(&mut BTreeMap<String, Entry>) -> T) -> T {
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests;
