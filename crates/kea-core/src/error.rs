//! Error types crossing the port boundary.

use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced by storage, picker, and recent-files ports.
///
/// These are the only errors that cross the store boundary; state-consistency misses (unknown
/// document id, no active document) are reported as `false`/`None` instead.
pub enum StorageError {
    #[error("file does not exist: {path}")]
    /// The file is missing (often a transient watch race).
    NotFound {
        /// Requested path.
        path: String,
    },

    #[error("no file selected")]
    /// A picker dialog was dismissed. Not a failure; never logged as one.
    Cancelled,

    #[error("I/O error on {path}: {source}")]
    /// Any other filesystem failure.
    Io {
        /// Path involved in the failed operation.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    /// Port-specific failure.
    Other(String),
}

impl StorageError {
    /// Build an [`StorageError::Io`] from an I/O error, mapping `NotFound` to
    /// [`StorageError::NotFound`].
    pub fn from_io(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io { path, source }
        }
    }

    /// Returns `true` for [`StorageError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for [`StorageError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[derive(Debug, Error)]
/// Errors produced while loading a [`crate::StoreConfig`].
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    /// YAML parsing failed.
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid value for '{field}': {message}")]
    /// A field parsed but holds an unusable value.
    Invalid {
        /// Field name.
        field: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown editor command: {0}")]
/// A string did not name any [`crate::EditorCommand`].
pub struct UnknownEditorCommand(pub String);
