#![warn(missing_docs)]
//! Kea FS - Filesystem Adapters for `kea-core`
//!
//! # Overview
//!
//! `kea-core` talks to the outside world through ports. This crate implements them on top of the
//! local filesystem:
//!
//! - [`FsStorage`] - [`kea_core::StoragePort`] with atomic writes and host-supplied dialogs
//! - [`FsWatcher`] - [`kea_core::FileWatchPort`] over `notify`
//! - [`JsonRecentFiles`] - [`kea_core::RecentFilesPort`] backed by a JSON file
//!
//! plus the file helpers a markdown workspace needs ([`is_markdown_file`], [`rename_item`]).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use kea_core::{DocumentStore, ExternalFileSync};
//! use kea_fs::{FsStorage, FsWatcher, JsonRecentFiles};
//!
//! let mut store = DocumentStore::new(FsStorage::new())
//!     .with_recent_files_port(JsonRecentFiles::new("recent.json"));
//! let mut sync = ExternalFileSync::new(FsWatcher::new()?);
//!
//! store.open_file_from_path("notes/today.md")?;
//! sync.follow_active(&store);
//!
//! // In the UI loop:
//! for event in sync.watcher_mut().poll_events() {
//!     store.handle_file_watch_event(&event)?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod recent;
pub mod storage;
pub mod watch;

pub use error::{RenameError, WatchError};
pub use recent::JsonRecentFiles;
pub use storage::{
    FsStorage, FsStorageOptions, MARKDOWN_EXTENSIONS, PathPicker, atomic_write, is_markdown_file,
    rename_item,
};
pub use watch::FsWatcher;
