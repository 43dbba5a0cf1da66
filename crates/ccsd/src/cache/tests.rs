//! Unit tests for the entry cache.

use std::fs;

use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;

struct DiskFixture {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl DiskFixture {
    fn write(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.root.join(name);
        fs::write(&path, contents).expect("write fixture");
        path
    }
}

#[fixture]
fn disk() -> DiskFixture {
    let dir = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir");
    DiskFixture { _dir: dir, root }
}

#[rstest]
fn put_overwrites_existing_entry() {
    let cache = SourceCache::new();
    cache.put("x.js", "first");
    cache.put("x.js", "second");

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.try_get("x.js").expect("entry").contents(), "second");
}

#[rstest]
fn contains_matches_keys_exactly() {
    let cache = SourceCache::new();
    cache.put("lib/a.js", "a");

    assert!(cache.contains("lib/a.js"));
    assert!(!cache.contains("./lib/a.js"));
    assert!(!cache.contains("LIB/A.JS"));
}

#[rstest]
fn identifiers_are_sorted() {
    let cache = SourceCache::new();
    cache.put("b.js", "");
    cache.put("a.js", "");
    cache.put("c.js", "");

    assert_eq!(cache.identifiers(), vec!["a.js", "b.js", "c.js"]);
}

#[rstest]
fn source_and_extern_caches_are_independent() {
    let sources = SourceCache::new();
    let externs = ExternCache::new();
    sources.put("shared.js", "source text");
    externs.put("shared.js", "extern text");

    assert_eq!(sources.try_get("shared.js").expect("source").contents(), "source text");
    assert_eq!(externs.try_get("shared.js").expect("extern").contents(), "extern text");
}

#[rstest]
fn load_and_insert_keys_by_path(disk: DiskFixture) {
    let path = disk.write("a.js", "line one\nline two\n");
    let cache = SourceCache::new();

    let entry = cache.load_and_insert(&path).expect("load");
    assert_eq!(entry.name(), path.as_str());
    assert_eq!(entry.contents(), "line one\nline two");
    assert!(cache.contains(path.as_str()));
}

#[rstest]
fn put_from_disk_leaves_cache_unchanged_on_failure(disk: DiskFixture) {
    let cache = SourceCache::new();
    cache.put("keep.js", "kept");

    assert!(cache.put_from_disk(&disk.root.join("absent.js")).is_none());
    assert_eq!(cache.identifiers(), vec!["keep.js"]);
}

#[rstest]
fn resolve_prefers_exact_key_without_disk_access(disk: DiskFixture) {
    let path = disk.write("a.js", "on disk");
    let cache = SourceCache::new();
    cache.put(path.as_str(), "in memory");

    let resolution = cache.resolve(path.as_str());
    assert!(matches!(resolution, Resolution::Cached(ref entry) if entry.contents() == "in memory"));
}

#[rstest]
fn resolve_loads_missing_entries_under_absolute_path(disk: DiskFixture) {
    let path = disk.write("lazy.js", "lazy");
    let cache = SourceCache::new();

    let resolution = cache.resolve(path.as_str());
    let Resolution::Loaded(entry) = resolution else {
        panic!("expected a disk load, got {resolution:?}");
    };
    assert_eq!(entry.contents(), "lazy");
    assert!(cache.contains(path.as_str()));

    // Second lookup is served from memory.
    assert!(matches!(cache.resolve(path.as_str()), Resolution::Cached(_)));
}

#[rstest]
fn resolve_falls_back_to_absolute_key() {
    let cache = SourceCache::new();
    let absolute = absolute_key("relative/only.js").expect("absolute");
    cache.put(absolute.as_str(), "by absolute path");

    let entry = cache
        .resolve("relative/only.js")
        .into_entry()
        .expect("absolute key should resolve");
    assert_eq!(entry.contents(), "by absolute path");
}

#[rstest]
fn resolve_reports_missing_files(disk: DiskFixture) {
    let cache = SourceCache::new();
    let absent = disk.root.join("absent.js");

    let resolution = cache.resolve(absent.as_str());
    assert!(matches!(resolution, Resolution::Missing { ref path, .. } if *path == absent));
    assert!(cache.is_empty());
}
