//! Errors specific to the filesystem adapters.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
/// File watcher failures.
pub enum WatchError {
    #[error("watcher backend error: {0}")]
    /// The `notify` backend failed.
    Notify(#[from] notify::Error),

    #[error("cannot watch missing file: {path}")]
    /// The file to watch does not exist.
    NotFound {
        /// Requested path.
        path: String,
    },

    #[error("cannot watch an empty path")]
    /// An empty path was given.
    EmptyPath,
}

#[derive(Debug, Error)]
/// Rename failures.
pub enum RenameError {
    #[error("item does not exist: {}", .0.display())]
    /// The item to rename is missing.
    NotFound(PathBuf),

    #[error("invalid name: {0:?}")]
    /// The new name is empty, a relative component, or contains a separator.
    InvalidName(String),

    #[error("cannot get parent directory of {}", .0.display())]
    /// The item has no parent directory.
    NoParent(PathBuf),

    #[error("an item with that name already exists: {}", .0.display())]
    /// The target name is taken.
    AlreadyExists(PathBuf),

    #[error("failed to rename {}: {source}", .path.display())]
    /// The rename itself failed.
    Io {
        /// Original path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}
