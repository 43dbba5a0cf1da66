//! Disk access for the entry cache.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Separator placed between lines of a file read from disk.
pub const LINE_SEPARATOR: &str = "\n";

/// Errors raised while reading an entry from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be opened.
    #[error("failed to open '{path}': {source}")]
    Open {
        /// Path that was opened.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The file could be opened but not read as UTF-8 text.
    #[error("failed to read '{path}': {source}")]
    Read {
        /// Path that was read.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The working directory could not be determined for a relative key.
    #[error("failed to make '{key}' absolute: {source}")]
    Absolute {
        /// Key being absolutised.
        key: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The absolute form of a key is not valid UTF-8.
    #[error("absolute path for '{key}' is not valid UTF-8")]
    NonUtf8 {
        /// Key being absolutised.
        key: String,
    },
}

/// Reads a whole file, normalising every line ending to [`LINE_SEPARATOR`].
///
/// Lines are rejoined without a trailing separator, so `"a\r\nb\n"` reads
/// back as `"a\nb"`.
///
/// # Errors
///
/// Returns [`LoadError`] when the file cannot be opened or contains invalid
/// UTF-8.
pub fn read_normalised(path: &Utf8Path) -> Result<String, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut contents = String::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if index > 0 {
            contents.push_str(LINE_SEPARATOR);
        }
        contents.push_str(&line);
    }
    Ok(contents)
}

/// Returns the absolute form of a cache key.
///
/// Relative keys are joined onto the working directory. Symlinks and `..`
/// components are left as written, so the result is stable even when the
/// file does not exist.
///
/// # Errors
///
/// Returns [`LoadError`] when the working directory is unavailable or the
/// result is not UTF-8.
pub fn absolute_key(key: &str) -> Result<Utf8PathBuf, LoadError> {
    let absolute = std::path::absolute(Path::new(key)).map_err(|source| LoadError::Absolute {
        key: key.to_owned(),
        source,
    })?;
    Utf8PathBuf::from_path_buf(absolute).map_err(|_| LoadError::NonUtf8 {
        key: key.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn utf8(path: &Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).expect("utf8 temp path")
    }

    #[test]
    fn normalises_line_endings_without_trailing_separator() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("crlf.js");
        fs::write(&path, "var a = 1;\r\nvar b = 2;\n").expect("write fixture");

        let contents = read_normalised(&utf8(&path)).expect("read fixture");
        assert_eq!(contents, "var a = 1;\nvar b = 2;");
    }

    #[test]
    fn empty_file_reads_as_empty_string() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("empty.js");
        fs::write(&path, "").expect("write fixture");

        assert_eq!(read_normalised(&utf8(&path)).expect("read"), "");
    }

    #[test]
    fn missing_file_reports_open_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let error = read_normalised(&utf8(&dir.path().join("absent.js")))
            .expect_err("missing file should fail");
        assert!(matches!(error, LoadError::Open { .. }));
    }

    #[test]
    fn absolute_key_keeps_absolute_paths() {
        let key = if cfg!(windows) { r"C:\lib\a.js" } else { "/lib/a.js" };
        assert_eq!(absolute_key(key).expect("absolute").as_str(), key);
    }

    #[test]
    fn absolute_key_joins_relative_paths_onto_cwd() {
        let cwd = std::env::current_dir().expect("cwd");
        let absolute = absolute_key("lib/a.js").expect("absolute");
        assert_eq!(absolute.as_std_path(), cwd.join("lib").join("a.js"));
    }
}
