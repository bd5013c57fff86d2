//! Keeps a file watch on the active document's path.
//!
//! [`ExternalFileSync`] moves a single [`FileWatchPort`] watch along with the active document
//! and forwards watch events for that path into
//! [`DocumentStore::check_active_document_external_change`]. Events for any other path are
//! dropped.

use crate::error::StorageError;
use crate::ports::{FileWatchEvent, FileWatchPort};
use crate::store::{DocumentStore, ExternalCheck};

/// Active-document file watch driver.
#[derive(Debug)]
pub struct ExternalFileSync<W> {
    watcher: W,
    watched: Option<String>,
}

impl<W: FileWatchPort> ExternalFileSync<W> {
    /// Wrap a watcher. Nothing is watched until [`ExternalFileSync::follow_active`] is called.
    pub fn new(watcher: W) -> Self {
        Self {
            watcher,
            watched: None,
        }
    }

    /// Currently watched path.
    pub fn watched_path(&self) -> Option<&str> {
        self.watched.as_deref()
    }

    /// The wrapped watcher.
    pub fn watcher(&self) -> &W {
        &self.watcher
    }

    /// Mutable access to the wrapped watcher (e.g. to drain its events).
    pub fn watcher_mut(&mut self) -> &mut W {
        &mut self.watcher
    }

    /// Move the watch to the store's active path. Call after anything that can change it.
    ///
    /// Watcher failures are logged; the old watch is forgotten even if stopping it failed, and
    /// a failed start leaves nothing watched.
    pub fn follow_active(&mut self, store: &DocumentStore) {
        let next = store.current_file_path();
        if self.watched.as_deref() == next {
            return;
        }

        if let Some(current) = self.watched.take()
            && let Err(err) = self.watcher.stop_watch(&current)
        {
            tracing::error!(path = %current, error = %err, "failed to stop file watch");
        }

        if let Some(path) = next {
            match self.watcher.start_watch(path) {
                Ok(()) => self.watched = Some(path.to_string()),
                Err(err) => {
                    tracing::error!(path, error = %err, "failed to start file watch");
                }
            }
        }
    }

    /// Forward a watch event to the store.
    ///
    /// Events for anything but the currently watched path are stale (the watch has moved on)
    /// and are skipped without touching the store.
    pub fn handle_event(
        &self,
        store: &mut DocumentStore,
        event: &FileWatchEvent,
    ) -> Result<ExternalCheck, StorageError> {
        if self.watched.as_deref() != Some(event.path.as_str()) {
            return Ok(ExternalCheck::Skipped);
        }
        store.handle_file_watch_event(event)
    }

    /// Stop every watch.
    pub fn shutdown(&mut self) {
        self.watched = None;
        if let Err(err) = self.watcher.stop_all_watches() {
            tracing::error!(error = %err, "failed to stop file watches");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MemoryStorage;
    use std::convert::Infallible;

    #[derive(Debug, Default)]
    struct RecordingWatcher {
        calls: Vec<String>,
    }

    impl FileWatchPort for RecordingWatcher {
        type Error = Infallible;

        fn start_watch(&mut self, path: &str) -> Result<(), Self::Error> {
            self.calls.push(format!("start {path}"));
            Ok(())
        }

        fn stop_watch(&mut self, path: &str) -> Result<(), Self::Error> {
            self.calls.push(format!("stop {path}"));
            Ok(())
        }

        fn stop_all_watches(&mut self) -> Result<(), Self::Error> {
            self.calls.push("stop all".to_string());
            Ok(())
        }
    }

    #[test]
    fn test_watch_follows_active_document() {
        let mut store = DocumentStore::new(MemoryStorage::new());
        let mut sync = ExternalFileSync::new(RecordingWatcher::default());

        let a = store.open_file("/a.md", "a", "a.md");
        sync.follow_active(&store);
        sync.follow_active(&store);
        store.open_file("/b.md", "b", "b.md");
        sync.follow_active(&store);
        store.new_file();
        sync.follow_active(&store);
        store.set_active_document(a);
        sync.follow_active(&store);
        sync.shutdown();

        assert_eq!(
            sync.watcher().calls,
            vec![
                "start /a.md",
                "stop /a.md",
                "start /b.md",
                "stop /b.md",
                "start /a.md",
                "stop all",
            ]
        );
        assert_eq!(sync.watched_path(), None);
    }

    #[test]
    fn test_events_for_other_paths_are_skipped() {
        let disk = MemoryStorage::new();
        let mut store = DocumentStore::new(disk.clone());
        let mut sync = ExternalFileSync::new(RecordingWatcher::default());
        store.open_file("/a.md", "x", "a.md");
        disk.insert_file("/a.md", "y");
        disk.insert_file("/b.md", "z");

        // Not following yet: even the active path is ignored.
        let stale = sync
            .handle_event(&mut store, &FileWatchEvent::modified("/a.md"))
            .unwrap();
        assert_eq!(stale, ExternalCheck::Skipped);
        assert_eq!(store.active_document().unwrap().content(), "x");

        sync.follow_active(&store);

        let skipped = sync
            .handle_event(&mut store, &FileWatchEvent::modified("/b.md"))
            .unwrap();
        assert_eq!(skipped, ExternalCheck::Skipped);

        let adopted = sync
            .handle_event(&mut store, &FileWatchEvent::modified("/a.md"))
            .unwrap();
        assert_eq!(adopted, ExternalCheck::Adopted);
        assert_eq!(store.active_document().unwrap().content(), "y");
    }

    #[test]
    fn test_events_for_previous_watch_are_skipped() {
        let disk = MemoryStorage::new();
        let mut store = DocumentStore::new(disk.clone());
        let mut sync = ExternalFileSync::new(RecordingWatcher::default());
        store.open_file("/a.md", "a", "a.md");
        sync.follow_active(&store);
        store.open_file("/b.md", "b", "b.md");
        sync.follow_active(&store);
        disk.insert_file("/a.md", "a2");

        let outcome = sync
            .handle_event(&mut store, &FileWatchEvent::modified("/a.md"))
            .unwrap();
        assert_eq!(outcome, ExternalCheck::Skipped);
        assert_eq!(sync.watched_path(), Some("/b.md"));
    }
}
