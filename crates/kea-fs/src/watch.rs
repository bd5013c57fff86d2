//! File watching over `notify`.
//!
//! Each watched file is observed through its (canonical) parent directory rather than the file
//! itself. Atomic saves replace the file by renaming a temp file over it, which would silently
//! end an inode-based watch on the file.

use crate::error::WatchError;
use kea_core::{FileWatchEvent, FileWatchKind, FileWatchPort};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

/// [`FileWatchPort`] backed by the platform's recommended `notify` watcher.
///
/// Events are buffered in a channel; drain them with [`FsWatcher::poll_events`] from the UI
/// loop and feed them to the store.
pub struct FsWatcher {
    watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    /// Canonical file path -> path as the caller gave it.
    files: HashMap<PathBuf, String>,
    /// Watched directory -> number of files watched in it.
    dirs: HashMap<PathBuf, usize>,
}

impl std::fmt::Debug for FsWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsWatcher")
            .field("files", &self.files)
            .field("dirs", &self.dirs)
            .finish_non_exhaustive()
    }
}

impl FsWatcher {
    /// Create a watcher with nothing watched.
    pub fn new() -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::channel();
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.send(res);
        })?;
        Ok(Self {
            watcher,
            rx,
            files: HashMap::new(),
            dirs: HashMap::new(),
        })
    }

    /// Whether `path` is currently watched.
    pub fn is_watching(&self, path: &str) -> bool {
        self.registered_key(path).is_some()
    }

    /// Watched paths, as they were passed to [`FileWatchPort::start_watch`].
    pub fn watched_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.files.values().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Drain pending events without blocking.
    ///
    /// Events for files that are not watched (siblings in the same directory) are dropped, and
    /// repeated `(path, kind)` pairs within one drain are reported once.
    pub fn poll_events(&mut self) -> Vec<FileWatchEvent> {
        let mut events = Vec::new();
        while let Ok(result) = self.rx.try_recv() {
            self.collect(result, &mut events);
        }
        if !events.is_empty() {
            tracing::debug!("file watcher detected {} changes", events.len());
        }
        events
    }

    /// Block up to `timeout` for the first event, then drain like [`FsWatcher::poll_events`].
    pub fn wait_events(&mut self, timeout: Duration) -> Vec<FileWatchEvent> {
        let mut events = Vec::new();
        match self.rx.recv_timeout(timeout) {
            Ok(result) => self.collect(result, &mut events),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return events,
        }
        while let Ok(result) = self.rx.try_recv() {
            self.collect(result, &mut events);
        }
        events
    }

    fn collect(&self, result: notify::Result<Event>, events: &mut Vec<FileWatchEvent>) {
        let event = match result {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!("file watcher error: {err:?}");
                return;
            }
        };

        for path in &event.paths {
            let Some(watched) = self.files.get(path) else {
                continue;
            };
            let Some(kind) = classify(&event.kind, path) else {
                continue;
            };
            let mapped = FileWatchEvent {
                path: watched.clone(),
                kind,
            };
            if !events.contains(&mapped) {
                events.push(mapped);
            }
        }
    }

    /// Registry key for `path`: its canonical location, or the entry started under exactly this
    /// string when the location can no longer be resolved (the directory is gone).
    fn registered_key(&self, path: &str) -> Option<PathBuf> {
        canonical_key(path)
            .filter(|key| self.files.contains_key(key))
            .or_else(|| {
                self.files
                    .iter()
                    .find(|(_, watched)| watched.as_str() == path)
                    .map(|(key, _)| key.clone())
            })
    }

    fn release_dir(&mut self, dir: &Path) -> Result<(), WatchError> {
        let Some(count) = self.dirs.get_mut(dir) else {
            return Ok(());
        };
        *count -= 1;
        if *count > 0 {
            return Ok(());
        }
        self.dirs.remove(dir);
        self.watcher.unwatch(dir)?;
        Ok(())
    }
}

fn classify(kind: &EventKind, path: &Path) -> Option<FileWatchKind> {
    match kind {
        EventKind::Access(_) | EventKind::Other => None,
        EventKind::Remove(_) => Some(FileWatchKind::Removed),
        // A rename either moved the file away or moved a new one into place.
        EventKind::Modify(ModifyKind::Name(_)) => Some(if path.exists() {
            FileWatchKind::Modified
        } else {
            FileWatchKind::Removed
        }),
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any => {
            Some(FileWatchKind::Modified)
        }
    }
}

fn canonical_key(path: &str) -> Option<PathBuf> {
    let file = Path::new(path);
    let name = file.file_name()?;
    let parent = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    parent.canonicalize().ok().map(|dir| dir.join(name))
}

/// Canonical parent directory and canonical file path for `path`.
fn resolve(path: &str) -> Result<(PathBuf, PathBuf), WatchError> {
    if path.is_empty() {
        return Err(WatchError::EmptyPath);
    }
    let file = Path::new(path);
    if !file.is_file() {
        return Err(WatchError::NotFound {
            path: path.to_string(),
        });
    }
    let name = file.file_name().ok_or_else(|| WatchError::NotFound {
        path: path.to_string(),
    })?;
    let parent = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let dir = parent.canonicalize().map_err(|err| {
        WatchError::Notify(notify::Error::io(err).add_path(parent.to_path_buf()))
    })?;
    let key = dir.join(name);
    Ok((dir, key))
}

impl FileWatchPort for FsWatcher {
    type Error = WatchError;

    /// Start watching `path`. Watching an already watched path is a no-op.
    fn start_watch(&mut self, path: &str) -> Result<(), WatchError> {
        let (dir, key) = resolve(path)?;
        if self.files.contains_key(&key) {
            return Ok(());
        }

        let count = self.dirs.get(&dir).copied().unwrap_or(0);
        if count == 0 {
            self.watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        }
        self.dirs.insert(dir, count + 1);
        self.files.insert(key, path.to_string());
        tracing::info!("started file watch for: {path}");
        Ok(())
    }

    /// Stop watching `path`, which may name the file through any alias of its directory.
    /// Unknown paths are ignored.
    fn stop_watch(&mut self, path: &str) -> Result<(), WatchError> {
        let Some(key) = self.registered_key(path) else {
            return Ok(());
        };
        self.files.remove(&key);
        tracing::info!("stopped file watch for: {path}");

        match key.parent() {
            Some(dir) => self.release_dir(dir),
            None => Ok(()),
        }
    }

    fn stop_all_watches(&mut self) -> Result<(), WatchError> {
        self.files.clear();
        for dir in std::mem::take(&mut self.dirs).into_keys() {
            if let Err(err) = self.watcher.unwatch(&dir) {
                tracing::warn!("failed to unwatch {}: {err:?}", dir.display());
            }
        }
        Ok(())
    }
}
