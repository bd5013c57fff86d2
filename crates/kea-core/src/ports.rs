//! Collaborator ports.
//!
//! The core never touches the filesystem, dialogs, or settings storage directly. Hosts plug in
//! implementations of these traits; `kea-fs` provides filesystem-backed ones and
//! [`MemoryStorage`] is an in-memory [`StoragePort`] for tests and headless use.

use crate::document::file_name_of;
use crate::error::StorageError;
use crate::recent::RecentFile;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

/// A file read from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedDocument {
    /// Resolved path.
    pub path: String,
    /// File content.
    pub content: String,
    /// Display name.
    pub name: String,
}

/// Location chosen by a save-as dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedAs {
    /// Path the content was written to.
    pub path: String,
    /// Display name.
    pub name: String,
}

/// Document storage.
///
/// Implementations must round-trip content byte-for-byte: after `save_file(p, c)`, a
/// `read_file(p)` returns exactly `c`. The store relies on this to mark documents clean without
/// re-reading them.
pub trait StoragePort {
    /// Read a file.
    fn read_file(&mut self, path: &str) -> Result<OpenedDocument, StorageError>;

    /// Let the user pick a file and read it. Dismissal is [`StorageError::Cancelled`].
    fn open_file_picker(&mut self) -> Result<OpenedDocument, StorageError>;

    /// Write `content` to `path`.
    fn save_file(&mut self, path: &str, content: &str) -> Result<(), StorageError>;

    /// Let the user pick a location and write `content` there. Dismissal is
    /// [`StorageError::Cancelled`].
    fn save_file_as(&mut self, content: &str) -> Result<SavedAs, StorageError>;
}

/// Kind of out-of-band file change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileWatchKind {
    /// The file's content or metadata changed.
    Modified,
    /// The file was removed.
    Removed,
}

/// An out-of-band file change notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileWatchEvent {
    /// Watched path.
    pub path: String,
    /// What happened.
    pub kind: FileWatchKind,
}

impl FileWatchEvent {
    /// Create a [`FileWatchKind::Modified`] event.
    pub fn modified(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: FileWatchKind::Modified,
        }
    }

    /// Create a [`FileWatchKind::Removed`] event.
    pub fn removed(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: FileWatchKind::Removed,
        }
    }
}

/// Per-path file watching.
pub trait FileWatchPort {
    /// Error type of the watcher backend.
    type Error: std::error::Error;

    /// Start watching `path`. Watching an already-watched path is a no-op.
    fn start_watch(&mut self, path: &str) -> Result<(), Self::Error>;

    /// Stop watching `path`. Unknown paths are ignored.
    fn stop_watch(&mut self, path: &str) -> Result<(), Self::Error>;

    /// Stop every watch.
    fn stop_all_watches(&mut self) -> Result<(), Self::Error>;
}

/// Yes/no collaborator asked before discarding unsaved changes.
pub trait DiscardConfirm {
    /// Return `true` to discard. `prompt` is a human-readable question.
    fn confirm_discard(&mut self, prompt: &str) -> bool;
}

impl<F> DiscardConfirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm_discard(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// A [`DiscardConfirm`] that always refuses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverDiscard;

impl DiscardConfirm for NeverDiscard {
    fn confirm_discard(&mut self, _prompt: &str) -> bool {
        false
    }
}

/// Persistence for the recent-files list.
pub trait RecentFilesPort {
    /// Load stored entries (most recent first).
    fn load(&mut self) -> Result<Vec<RecentFile>, StorageError>;

    /// Store entries (most recent first).
    fn save(&mut self, entries: &[RecentFile]) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    files: HashMap<String, String>,
    picks: VecDeque<Option<String>>,
    save_as_targets: VecDeque<Option<String>>,
    failing_reads: HashSet<String>,
    failing_writes: HashSet<String>,
    writes: Vec<(String, String)>,
}

/// In-memory [`StoragePort`].
///
/// Clones share the same files, so a test can keep a handle and change "disk" underneath a
/// store that owns another clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create or overwrite a file.
    pub fn insert_file(&self, path: impl Into<String>, content: impl Into<String>) {
        self.state().files.insert(path.into(), content.into());
    }

    /// Remove a file. Returns its content if it existed.
    pub fn remove_file(&self, path: &str) -> Option<String> {
        self.state().files.remove(path)
    }

    /// Current content of a file.
    pub fn file(&self, path: &str) -> Option<String> {
        self.state().files.get(path).cloned()
    }

    /// Queue the next open-picker result: `Some(path)` picks that file, `None` cancels.
    pub fn queue_pick(&self, path: Option<&str>) {
        self.state().picks.push_back(path.map(str::to_string));
    }

    /// Queue the next save-as result: `Some(path)` writes there, `None` cancels.
    pub fn queue_save_as(&self, path: Option<&str>) {
        self.state().save_as_targets.push_back(path.map(str::to_string));
    }

    /// Make reads of `path` fail with an I/O error.
    pub fn fail_reads(&self, path: &str) {
        self.state().failing_reads.insert(path.to_string());
    }

    /// Make writes to `path` fail with an I/O error.
    pub fn fail_writes(&self, path: &str) {
        self.state().failing_writes.insert(path.to_string());
    }

    /// Clear all injected failures.
    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.failing_reads.clear();
        state.failing_writes.clear();
    }

    /// Every successful write so far, in order.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.state().writes.clone()
    }

    fn read_locked(state: &MemoryState, path: &str) -> Result<OpenedDocument, StorageError> {
        if state.failing_reads.contains(path) {
            return Err(injected_failure(path, "read"));
        }
        let content = state
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                path: path.to_string(),
            })?;
        Ok(OpenedDocument {
            path: path.to_string(),
            content,
            name: display_name(path),
        })
    }

    fn write_locked(state: &mut MemoryState, path: &str, content: &str) -> Result<(), StorageError> {
        if state.failing_writes.contains(path) {
            return Err(injected_failure(path, "write"));
        }
        state.files.insert(path.to_string(), content.to_string());
        state.writes.push((path.to_string(), content.to_string()));
        Ok(())
    }
}

impl StoragePort for MemoryStorage {
    fn read_file(&mut self, path: &str) -> Result<OpenedDocument, StorageError> {
        Self::read_locked(&self.state(), path)
    }

    fn open_file_picker(&mut self) -> Result<OpenedDocument, StorageError> {
        let mut state = self.state();
        match state.picks.pop_front().flatten() {
            Some(path) => Self::read_locked(&state, &path),
            None => Err(StorageError::Cancelled),
        }
    }

    fn save_file(&mut self, path: &str, content: &str) -> Result<(), StorageError> {
        Self::write_locked(&mut self.state(), path, content)
    }

    fn save_file_as(&mut self, content: &str) -> Result<SavedAs, StorageError> {
        let mut state = self.state();
        let Some(path) = state.save_as_targets.pop_front().flatten() else {
            return Err(StorageError::Cancelled);
        };
        Self::write_locked(&mut state, &path, content)?;
        Ok(SavedAs {
            name: display_name(&path),
            path,
        })
    }
}

fn display_name(path: &str) -> String {
    file_name_of(path).unwrap_or("Untitled").to_string()
}

fn injected_failure(path: &str, op: &str) -> StorageError {
    StorageError::Io {
        path: path.to_string(),
        source: std::io::Error::other(format!("injected {op} failure")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_round_trip() {
        let mut storage = MemoryStorage::new();
        storage.save_file("/docs/a.md", "# a").unwrap();

        let opened = storage.read_file("/docs/a.md").unwrap();
        assert_eq!(opened.content, "# a");
        assert_eq!(opened.name, "a.md");
        assert_eq!(storage.writes(), vec![("/docs/a.md".to_string(), "# a".to_string())]);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let mut storage = MemoryStorage::new();
        assert!(storage.read_file("/nope.md").unwrap_err().is_not_found());
    }

    #[test]
    fn test_picker_without_queued_result_is_cancelled() {
        let mut storage = MemoryStorage::new();
        assert!(storage.open_file_picker().unwrap_err().is_cancelled());
        assert!(storage.save_file_as("x").unwrap_err().is_cancelled());

        storage.queue_save_as(Some("/out.md"));
        let saved = storage.save_file_as("x").unwrap();
        assert_eq!(saved.path, "/out.md");
        assert_eq!(storage.file("/out.md").as_deref(), Some("x"));
    }

    #[test]
    fn test_clones_share_files() {
        let storage = MemoryStorage::new();
        let mut other = storage.clone();
        storage.insert_file("/a.md", "disk");
        assert_eq!(other.read_file("/a.md").unwrap().content, "disk");
    }

    #[test]
    fn test_closure_confirm() {
        let mut confirm = |prompt: &str| prompt.contains("discard");
        assert!(confirm.confirm_discard("discard?"));
        assert!(!NeverDiscard.confirm_discard("discard?"));
    }
}
