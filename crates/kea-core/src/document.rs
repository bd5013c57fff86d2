//! Open-document model.
//!
//! An [`OpenDocument`] is one editor tab. Its dirty flag is never set directly: every mutation
//! goes through a method that recomputes it from `content != saved_content`, so the flag is a
//! cached read of that comparison.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// Opaque identifier for an open document in a [`crate::DocumentStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(u64);

impl DocumentId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc-{}", self.0)
    }
}

/// The textual representation a document is currently shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    /// Raw markdown source.
    #[default]
    Source,
    /// Rendered view, addressed through its plain-text projection.
    Rendered,
}

impl EditorMode {
    /// The other representation.
    pub fn toggled(self) -> Self {
        match self {
            Self::Source => Self::Rendered,
            Self::Rendered => Self::Source,
        }
    }
}

/// One open editor tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenDocument {
    id: DocumentId,
    path: String,
    name: String,
    content: String,
    saved_content: String,
    is_dirty: bool,
}

impl OpenDocument {
    /// Create a clean document whose saved content equals `content`.
    pub(crate) fn clean(id: DocumentId, path: String, name: String, content: String) -> Self {
        Self {
            id,
            path,
            name,
            saved_content: content.clone(),
            content,
            is_dirty: false,
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Storage path; empty for untitled documents.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns `true` if the document has never been saved to a path.
    pub fn is_untitled(&self) -> bool {
        self.path.is_empty()
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current in-memory content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Content as of the last save/load.
    pub fn saved_content(&self) -> &str {
        &self.saved_content
    }

    /// Whether `content` differs from `saved_content`.
    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub(crate) fn set_content(&mut self, content: String) {
        self.is_dirty = content != self.saved_content;
        self.content = content;
    }

    /// Replace both the content and the saved baseline, leaving the document clean.
    pub(crate) fn replace_clean(&mut self, content: String) {
        self.saved_content = content.clone();
        self.content = content;
        self.is_dirty = false;
    }

    pub(crate) fn mark_saved(&mut self) {
        self.saved_content = self.content.clone();
        self.is_dirty = false;
    }

    pub(crate) fn set_location(&mut self, path: String, name: String) {
        self.path = path;
        self.name = name;
    }

    pub(crate) fn set_path(&mut self, path: String) {
        self.path = path;
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// A pending disk-side change for a dirty document, awaiting user resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalChangeAlert {
    /// Target document.
    pub document_id: DocumentId,
    /// Path the change was read from.
    pub path: String,
    /// Disk content that differs from the document's saved content.
    pub disk_content: String,
    /// When the change was detected.
    pub detected_at: SystemTime,
}

/// Last path segment, splitting on both `/` and `\`.
pub(crate) fn file_name_of(path: &str) -> Option<&str> {
    path.rsplit(['/', '\\']).next().filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirty_tracks_content_comparison() {
        let mut doc = OpenDocument::clean(
            DocumentId::new(1),
            "/a.md".to_string(),
            "a.md".to_string(),
            "# a".to_string(),
        );
        assert!(!doc.is_dirty());

        doc.set_content("# a!".to_string());
        assert!(doc.is_dirty());

        doc.set_content("# a".to_string());
        assert!(!doc.is_dirty());

        doc.set_content("changed".to_string());
        doc.mark_saved();
        assert!(!doc.is_dirty());
        assert_eq!(doc.saved_content(), "changed");
    }

    #[test]
    fn test_file_name_of_handles_both_separators() {
        assert_eq!(file_name_of("/docs/notes/a.md"), Some("a.md"));
        assert_eq!(file_name_of("C:\\docs\\b.md"), Some("b.md"));
        assert_eq!(file_name_of("plain.md"), Some("plain.md"));
        assert_eq!(file_name_of("/docs/"), None);
    }

    #[test]
    fn test_document_id_display() {
        assert_eq!(DocumentId::new(7).to_string(), "doc-7");
    }
}
