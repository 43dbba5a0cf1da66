//! Startup load of a bundled library tree into the caches.

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{CACHE_TARGET, CacheKind, EntryCache, ExternCache, SourceCache, read_normalised};

/// Subdirectories of the library root holding compilable sources.
pub const SOURCE_DIRS: [&str; 2] = ["closure", "third_party"];

/// Subdirectory of the library root holding extern declarations.
pub const EXTERNS_DIR: &str = "externs";

const SCRIPT_EXTENSION: &str = "js";

/// Counts reported after a preload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreloadSummary {
    /// Entries added to the source cache.
    pub sources: usize,
    /// Entries added to the extern cache.
    pub externs: usize,
    /// Files that were found but could not be read.
    pub failures: usize,
}

/// Errors that abort a preload.
#[derive(Debug, Error)]
pub enum PreloadError {
    /// The configured root is not a directory.
    #[error("preload root '{root}' is not a directory")]
    MissingRoot {
        /// Configured root.
        root: Utf8PathBuf,
    },
}

/// Loads `<root>/closure/**/*.js` and `<root>/third_party/**/*.js` into
/// `sources`, and `<root>/externs/**/*.js` into `externs`.
///
/// Entries are keyed by their path relative to `root` with `/` separators,
/// for example `closure/goog/base.js`. Unreadable files are logged and
/// counted, not fatal.
///
/// # Errors
///
/// Returns [`PreloadError::MissingRoot`] when `root` is not a directory.
pub fn preload_library(
    root: &Utf8Path,
    sources: &SourceCache,
    externs: &ExternCache,
) -> Result<PreloadSummary, PreloadError> {
    if !root.is_dir() {
        return Err(PreloadError::MissingRoot {
            root: root.to_path_buf(),
        });
    }

    let mut summary = PreloadSummary::default();
    for subdir in SOURCE_DIRS {
        let (loaded, failed) = load_tree(root, subdir, sources);
        summary.sources += loaded;
        summary.failures += failed;
    }
    let (loaded, failed) = load_tree(root, EXTERNS_DIR, externs);
    summary.externs = loaded;
    summary.failures += failed;

    info!(
        target: CACHE_TARGET,
        root = %root,
        sources = summary.sources,
        externs = summary.externs,
        failures = summary.failures,
        "library preload finished"
    );
    Ok(summary)
}

fn load_tree<K: CacheKind>(root: &Utf8Path, subdir: &str, cache: &EntryCache<K>) -> (usize, usize) {
    let base = root.join(subdir);
    if !base.is_dir() {
        debug!(target: CACHE_TARGET, path = %base, "preload directory absent");
        return (0, 0);
    }

    let scan = scan_scripts(root, &base);
    let mut loaded = 0;
    let mut failed = scan.failures;
    for (key, path) in scan.files {
        match read_normalised(&path) {
            Ok(contents) => {
                cache.put(key, contents);
                loaded += 1;
            }
            Err(error) => {
                warn!(target: CACHE_TARGET, %error, "skipping unreadable library file");
                failed += 1;
            }
        }
    }
    (loaded, failed)
}

/// Script files found under a directory, in file-name order.
#[derive(Debug, Default)]
pub(crate) struct ScriptScan {
    /// `(key, path)` pairs where `key` is relative to the scan root.
    pub(crate) files: Vec<(String, Utf8PathBuf)>,
    /// Directory entries that could not be visited.
    pub(crate) failures: usize,
}

/// Walks `base` for `*.js` files, keying each by its `/`-joined path
/// relative to `root`.
pub(crate) fn scan_scripts(root: &Utf8Path, base: &Utf8Path) -> ScriptScan {
    let mut scan = ScriptScan::default();
    let walker = WalkDir::new(base.as_std_path())
        .follow_links(true)
        .sort_by_file_name();
    for item in walker {
        let dir_entry = match item {
            Ok(dir_entry) => dir_entry,
            Err(error) => {
                warn!(target: CACHE_TARGET, %error, "failed to walk script directory");
                scan.failures += 1;
                continue;
            }
        };
        if !dir_entry.file_type().is_file() {
            continue;
        }
        let Ok(path) = Utf8PathBuf::from_path_buf(dir_entry.into_path()) else {
            scan.failures += 1;
            continue;
        };
        if path.extension() != Some(SCRIPT_EXTENSION) {
            continue;
        }
        if let Some(key) = library_key(root, &path) {
            scan.files.push((key, path));
        }
    }
    scan
}

fn library_key(root: &Utf8Path, path: &Utf8Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative.components().map(|part| part.as_str()).collect();
    Some(parts.join("/"))
}
