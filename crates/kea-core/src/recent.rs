//! Recent files list.
//!
//! Most-recently-opened first, unique by path, capped at a configurable length. Persistence lives
//! outside the core (see [`crate::RecentFilesPort`]); the ordering and cap are the observable
//! contract.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// One recent-files entry. Serialized as `{path, name, lastOpened}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFile {
    /// File path.
    pub path: String,
    /// Display name.
    pub name: String,
    /// When the file was last opened (Unix epoch milliseconds).
    pub last_opened: u64,
}

/// Bounded MRU list of recently opened files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentFiles {
    entries: Vec<RecentFile>,
    limit: usize,
}

impl RecentFiles {
    /// Create an empty list holding at most `limit` entries (minimum 1).
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Build a list from stored entries, dropping later duplicates and entries past the cap.
    pub fn from_entries(entries: Vec<RecentFile>, limit: usize) -> Self {
        let mut list = Self::new(limit);
        list.entries = entries;
        list.normalize();
        list
    }

    /// Entries, most recent first.
    pub fn entries(&self) -> &[RecentFile] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Change the cap, truncating if needed.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        self.entries.truncate(self.limit);
    }

    /// Move `path` to the front (inserting it if absent), stamped with the current time.
    pub fn add(&mut self, path: &str, name: &str) {
        self.add_at(path, name, now_epoch_millis());
    }

    /// Like [`RecentFiles::add`] with an explicit timestamp.
    pub fn add_at(&mut self, path: &str, name: &str, last_opened: u64) {
        self.entries.retain(|entry| entry.path != path);
        self.entries.insert(
            0,
            RecentFile {
                path: path.to_string(),
                name: name.to_string(),
                last_opened,
            },
        );
        self.entries.truncate(self.limit);
    }

    /// Remove `path`. Returns `true` if it was present.
    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.path != path);
        self.entries.len() != before
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Rewrite entries in place with `rewrite`, then drop duplicates (keeping the first).
    ///
    /// `rewrite` returns the new `(path, name)` for entries it changes and `None` otherwise.
    pub fn rewrite(&mut self, mut rewrite: impl FnMut(&RecentFile) -> Option<(String, String)>) {
        for entry in &mut self.entries {
            if let Some((path, name)) = rewrite(entry) {
                entry.path = path;
                entry.name = name;
            }
        }
        self.normalize();
    }

    /// Serialize as a JSON array of entries.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.entries)
    }

    /// Parse a JSON array of entries.
    pub fn from_json(json: &str, limit: usize) -> Result<Self, serde_json::Error> {
        let entries: Vec<RecentFile> = serde_json::from_str(json)?;
        Ok(Self::from_entries(entries, limit))
    }

    fn normalize(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.entries.retain(|entry| seen.insert(entry.path.clone()));
        self.entries.truncate(self.limit);
    }
}

impl Default for RecentFiles {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_RECENT_FILES_LIMIT)
    }
}

pub(crate) fn now_epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paths(list: &RecentFiles) -> Vec<&str> {
        list.entries().iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn test_add_moves_existing_to_front() {
        let mut list = RecentFiles::new(10);
        list.add_at("/a.md", "a.md", 1);
        list.add_at("/b.md", "b.md", 2);
        list.add_at("/a.md", "a.md", 3);

        assert_eq!(paths(&list), vec!["/a.md", "/b.md"]);
        assert_eq!(list.entries()[0].last_opened, 3);
    }

    #[test]
    fn test_cap_drops_oldest() {
        let mut list = RecentFiles::new(10);
        for i in 0..12 {
            list.add_at(&format!("/{i}.md"), &format!("{i}.md"), i);
        }
        assert_eq!(list.len(), 10);
        assert_eq!(list.entries()[0].path, "/11.md");
        assert_eq!(list.entries()[9].path, "/2.md");
    }

    #[test]
    fn test_rewrite_dedups_keeping_first() {
        let mut list = RecentFiles::new(10);
        list.add_at("/new.md", "new.md", 1);
        list.add_at("/old.md", "old.md", 2);

        list.rewrite(|entry| {
            (entry.path == "/old.md").then(|| ("/new.md".to_string(), "new.md".to_string()))
        });

        assert_eq!(paths(&list), vec!["/new.md"]);
        assert_eq!(list.entries()[0].last_opened, 2);
    }

    #[test]
    fn test_json_uses_camel_case() {
        let mut list = RecentFiles::new(10);
        list.add_at("/a.md", "a.md", 42);
        let json = list.to_json().unwrap();
        assert_eq!(json, r#"[{"path":"/a.md","name":"a.md","lastOpened":42}]"#);

        let parsed = RecentFiles::from_json(&json, 10).unwrap();
        assert_eq!(parsed, list);
    }
}
