#![warn(missing_docs)]
//! Kea Core - Headless Document Kernel for a Two-View Markdown Editor
//!
//! # Overview
//!
//! `kea-core` keeps the model of a multi-tab markdown workspace consistent while content
//! changes from three directions (local edits, edits on disk, remote edits), and translates
//! cursor/scroll positions between the raw source view and the rendered view. It does no I/O
//! itself: storage, file watching, confirmation dialogs and recent-files persistence are ports
//! the host implements (`kea-fs` provides filesystem-backed ones).
//!
//! # Core Features
//!
//! - **Reconciliation Store**: open documents, active tab, dirty tracking, external-change alerts
//! - **Command Pipeline**: every mutation runs `normalise → apply → reconcile → persist → broadcast`
//! - **Viewport Anchor Translator**: cross-view offset mapping with snapshot and anchor fallbacks
//! - **Editor Event Bus**: typed publish/subscribe between toolbar and editing surface
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  DocumentStore / ExternalFileSync           │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Command Pipeline + Hooks                   │  ← Mutation Instrumentation
//! ├─────────────────────────────────────────────┤
//! │  Command Taxonomy                           │  ← Pure Data
//! ├─────────────────────────────────────────────┤
//! │  Ports (storage, watch, confirm, recent)    │  ← Host Integration
//! └─────────────────────────────────────────────┘
//!   ViewportSync and EditorEvents sit beside the store.
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use kea_core::{DocumentStore, ExternalCheck, MemoryStorage};
//!
//! let disk = MemoryStorage::new();
//! disk.insert_file("/notes/a.md", "orig");
//!
//! let mut store = DocumentStore::new(disk.clone());
//! store.open_file_from_path("/notes/a.md").unwrap();
//! store.update_content("local");
//!
//! // Someone else writes the file while we have unsaved edits.
//! disk.insert_file("/notes/a.md", "disk");
//! assert_eq!(
//!     store.check_active_document_external_change().unwrap(),
//!     ExternalCheck::AlertRaised
//! );
//!
//! // Keep our edits; the same disk content will not alert again.
//! assert!(store.keep_local_version());
//! assert_eq!(
//!     store.check_active_document_external_change().unwrap(),
//!     ExternalCheck::Ignored
//! );
//! ```
//!
//! # Module Description
//!
//! - [`command`] - Document command taxonomy
//! - [`pipeline`] - Ordered-stage command pipeline
//! - [`store`] - Document reconciliation store
//! - [`viewport`] - Viewport anchor translator
//! - [`events`] - Editor command/UI-state event bus
//! - [`ports`] - Collaborator traits and in-memory storage
//! - [`sync`] - File watch following the active document
//!
//! # Offsets
//!
//! All offsets are character offsets (Unicode scalar values), never byte offsets.

pub mod command;
pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod ports;
pub mod recent;
pub mod store;
pub mod sync;
pub mod viewport;

pub use command::{DocumentCommand, DocumentCommandKind, DocumentCommandSource};
pub use config::{
    DEFAULT_ANCHOR_WINDOW, DEFAULT_RECENT_FILES_LIMIT, MAX_ANCHOR_WINDOW, StoreConfig,
};
pub use document::{DocumentId, EditorMode, ExternalChangeAlert, OpenDocument};
pub use error::{ConfigError, StorageError, UnknownEditorCommand};
pub use events::{
    EditorCommand, EditorCommandEvent, EditorEvents, EditorUiState, EventBus, EventHandler,
    Subscription,
};
pub use pipeline::{
    CommandHook, DocumentCommandHooks, PipelineStage, ReconcileContext, ReconcileStage,
    dispatch_document_command, run_reconcile_pipeline,
};
pub use ports::{
    DiscardConfirm, FileWatchEvent, FileWatchKind, FileWatchPort, MemoryStorage, NeverDiscard,
    OpenedDocument, RecentFilesPort, SavedAs, StoragePort,
};
pub use recent::{RecentFile, RecentFiles};
pub use store::{DocumentStore, ExternalCheck};
pub use sync::ExternalFileSync;
pub use viewport::{
    DocumentViewportSnapshot, RenderedRestore, RenderedSnapshot, RenderedViewport,
    RestoreStrategy, SharedAnchor, SourceRestore, SourceSnapshot, SourceViewport, ViewportSync,
};
