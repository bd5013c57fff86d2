//! Recent-files persistence and file watching against a temp directory

use kea_core::{
    DocumentStore, ExternalCheck, ExternalFileSync, FileWatchKind, FileWatchPort, MemoryStorage,
    RecentFile, RecentFilesPort,
};
use kea_fs::{FsStorage, FsWatcher, JsonRecentFiles, WatchError};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::tempdir;

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_missing_recent_file_loads_empty() {
    let dir = tempdir().unwrap();
    let mut port = JsonRecentFiles::new(dir.path().join("recent.json"));
    assert!(port.load().unwrap().is_empty());
}

#[test]
fn test_recent_files_round_trip_through_json() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("state/recent.json");
    let entries = vec![
        RecentFile {
            path: "/b.md".to_string(),
            name: "b.md".to_string(),
            last_opened: 20,
        },
        RecentFile {
            path: "/a.md".to_string(),
            name: "a.md".to_string(),
            last_opened: 10,
        },
    ];

    JsonRecentFiles::new(&file).save(&entries).unwrap();
    let json = fs::read_to_string(&file).unwrap();
    assert!(json.contains("\"lastOpened\": 20"));

    assert_eq!(JsonRecentFiles::new(&file).load().unwrap(), entries);
}

#[test]
fn test_corrupt_recent_file_is_an_error() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("recent.json");
    fs::write(&file, "{ not json").unwrap();

    assert!(JsonRecentFiles::new(&file).load().is_err());
}

#[test]
fn test_store_persists_recent_files_to_disk() {
    let dir = tempdir().unwrap();
    let recent = dir.path().join("recent.json");
    let mut store =
        DocumentStore::new(MemoryStorage::new()).with_recent_files_port(JsonRecentFiles::new(&recent));
    store.open_file("/a.md", "a", "a.md");
    store.open_file("/b.md", "b", "b.md");

    let mut reopened =
        DocumentStore::new(MemoryStorage::new()).with_recent_files_port(JsonRecentFiles::new(&recent));
    assert!(reopened.load_recent_files());
    let paths: Vec<&str> = reopened
        .recent_files()
        .iter()
        .map(|entry| entry.path.as_str())
        .collect();
    assert_eq!(paths, vec!["/b.md", "/a.md"]);
}

#[test]
fn test_watch_bookkeeping() {
    let Ok(mut watcher) = FsWatcher::new() else {
        return;
    };
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.md");
    let b = dir.path().join("b.md");
    fs::write(&a, "a").unwrap();
    fs::write(&b, "b").unwrap();

    assert!(matches!(
        watcher.start_watch(path_str(&dir.path().join("missing.md"))),
        Err(WatchError::NotFound { .. })
    ));

    watcher.start_watch(path_str(&a)).unwrap();
    watcher.start_watch(path_str(&a)).unwrap();
    watcher.start_watch(path_str(&b)).unwrap();
    assert_eq!(watcher.watched_paths().len(), 2);
    assert!(watcher.is_watching(path_str(&a)));

    watcher.stop_watch(path_str(&a)).unwrap();
    watcher.stop_watch(path_str(&a)).unwrap();
    assert!(!watcher.is_watching(path_str(&a)));
    assert!(watcher.is_watching(path_str(&b)));

    watcher.stop_all_watches().unwrap();
    assert!(watcher.watched_paths().is_empty());
}

#[test]
fn test_stop_through_alias_releases_watch() {
    let Ok(mut watcher) = FsWatcher::new() else {
        return;
    };
    let dir = tempdir().unwrap();
    let file = dir.path().join("a.md");
    fs::write(&file, "a").unwrap();
    let alias = dir.path().join(".").join("a.md");

    watcher.start_watch(path_str(&file)).unwrap();
    watcher.start_watch(path_str(&alias)).unwrap();
    assert_eq!(watcher.watched_paths(), vec![path_str(&file)]);
    assert!(watcher.is_watching(path_str(&alias)));

    watcher.stop_watch(path_str(&alias)).unwrap();
    assert!(watcher.watched_paths().is_empty());
    assert!(!watcher.is_watching(path_str(&file)));
}

#[test]
fn test_external_write_reaches_store() {
    let Ok(watcher) = FsWatcher::new() else {
        return;
    };
    let dir = tempdir().unwrap();
    let file = dir.path().join("a.md");
    fs::write(&file, "original").unwrap();

    let mut store = DocumentStore::new(FsStorage::new());
    let mut sync = ExternalFileSync::new(watcher);
    store.open_file_from_path(path_str(&file)).unwrap();
    sync.follow_active(&store);
    assert_eq!(sync.watched_path(), Some(path_str(&file)));

    fs::write(&file, "edited elsewhere").unwrap();

    // Delivery timing depends on the platform backend; give up quietly if nothing arrives.
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        let events = sync.watcher_mut().wait_events(Duration::from_millis(200));
        let Some(event) = events
            .iter()
            .find(|event| event.kind == FileWatchKind::Modified)
        else {
            continue;
        };
        assert_eq!(event.path, path_str(&file));
        let outcome = sync.handle_event(&mut store, event).unwrap();
        assert!(matches!(
            outcome,
            ExternalCheck::Adopted | ExternalCheck::InSync
        ));
        assert_eq!(store.active_document().unwrap().content(), "edited elsewhere");
        break;
    }

    sync.shutdown();
}
