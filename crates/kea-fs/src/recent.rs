//! JSON file persistence for the recent-files list.

use crate::storage::atomic_write;
use kea_core::{RecentFile, RecentFilesPort, StorageError};
use std::fs;
use std::path::{Path, PathBuf};

/// [`RecentFilesPort`] storing entries as a pretty-printed JSON array.
///
/// A missing file loads as an empty list. Writes go through [`atomic_write`].
#[derive(Debug, Clone)]
pub struct JsonRecentFiles {
    path: PathBuf,
}

impl JsonRecentFiles {
    /// Store entries in `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecentFilesPort for JsonRecentFiles {
    fn load(&mut self) -> Result<Vec<RecentFile>, StorageError> {
        let location = self.path.display().to_string();
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StorageError::from_io(location, err)),
        };
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&json)
            .map_err(|err| StorageError::Other(format!("invalid recent files in {location}: {err}")))
    }

    fn save(&mut self, entries: &[RecentFile]) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|err| StorageError::Other(format!("cannot encode recent files: {err}")))?;
        atomic_write(&self.path, &json)
    }
}
