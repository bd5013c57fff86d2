//! Document command taxonomy.
//!
//! Every store mutation is described by a [`DocumentCommand`] before it is applied. Commands are
//! plain data: hooks and observers inspect them, nothing rewrites them.

use crate::document::DocumentId;
use std::fmt;

/// Where a document change originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentCommandSource {
    /// Edits and actions from this process's UI.
    Local,
    /// Changes detected on disk.
    External,
    /// Changes delivered by a collaboration channel.
    Remote,
}

impl DocumentCommandSource {
    /// Lowercase name, suitable for log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::External => "external",
            Self::Remote => "remote",
        }
    }
}

/// The kind of mutation a command performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentCommandKind {
    /// A document was opened (new tab).
    OpenDocument,
    /// The active tab changed.
    SwitchDocument,
    /// A tab was closed.
    CloseDocument,
    /// All tabs were closed.
    CloseAllDocuments,
    /// An untitled document was created.
    CreateDocument,
    /// Content was edited locally.
    UpdateContent,
    /// Content was replaced from disk or a remote source.
    ApplyExternalEdit,
    /// A document was written to its existing path.
    SaveDocument,
    /// A document was written to a newly chosen path.
    SaveDocumentAs,
}

impl DocumentCommandKind {
    /// camelCase name, suitable for log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenDocument => "openDocument",
            Self::SwitchDocument => "switchDocument",
            Self::CloseDocument => "closeDocument",
            Self::CloseAllDocuments => "closeAllDocuments",
            Self::CreateDocument => "createDocument",
            Self::UpdateContent => "updateContent",
            Self::ApplyExternalEdit => "applyExternalEdit",
            Self::SaveDocument => "saveDocument",
            Self::SaveDocumentAs => "saveDocumentAs",
        }
    }
}

/// Immutable description of a document mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentCommand {
    kind: DocumentCommandKind,
    source: DocumentCommandSource,
    document_id: Option<DocumentId>,
    path: Option<String>,
    content_length: Option<usize>,
}

impl DocumentCommand {
    /// Create a command with no target metadata.
    pub fn new(kind: DocumentCommandKind, source: DocumentCommandSource) -> Self {
        Self {
            kind,
            source,
            document_id: None,
            path: None,
            content_length: None,
        }
    }

    /// Shorthand for a [`DocumentCommandSource::Local`] command.
    pub fn local(kind: DocumentCommandKind) -> Self {
        Self::new(kind, DocumentCommandSource::Local)
    }

    /// Attach the target document id.
    pub fn with_document(mut self, id: DocumentId) -> Self {
        self.document_id = Some(id);
        self
    }

    /// Attach the target path. Empty paths (untitled documents) are recorded as absent.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.path = (!path.is_empty()).then_some(path);
        self
    }

    /// Attach the length (in characters) of the content involved.
    pub fn with_content_length(mut self, len: usize) -> Self {
        self.content_length = Some(len);
        self
    }

    /// Command kind.
    pub fn kind(&self) -> DocumentCommandKind {
        self.kind
    }

    /// Command source.
    pub fn source(&self) -> DocumentCommandSource {
        self.source
    }

    /// Target document id, if any.
    pub fn document_id(&self) -> Option<DocumentId> {
        self.document_id
    }

    /// Target path, if any.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Content length in characters, if any.
    pub fn content_length(&self) -> Option<usize> {
        self.content_length
    }
}

impl fmt::Display for DocumentCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind.as_str(), self.source.as_str())?;
        if let Some(id) = self.document_id {
            write!(f, " {}", id)?;
        }
        if let Some(path) = &self.path {
            write!(f, " {}", path)?;
        }
        Ok(())
    }
}
