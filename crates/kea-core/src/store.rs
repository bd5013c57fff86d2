//! Document reconciliation store.
//!
//! # Overview
//!
//! [`DocumentStore`] owns the open documents (one per tab), the active-document pointer, the
//! single outstanding [`ExternalChangeAlert`], the ignored-external-change map and the recent
//! files list. Content reaches a document from three directions:
//!
//! - **local** edits ([`DocumentStore::update_content`]) mark it dirty;
//! - **external** disk changes ([`DocumentStore::check_active_document_external_change`]) are
//!   adopted silently while the document is clean and raise an alert while it is dirty;
//! - **remote** changes ([`DocumentStore::apply_remote_change`]) always win.
//!
//! Every mutation is wrapped in a [`DocumentCommand`] and routed through
//! [`dispatch_document_command`], so installed [`DocumentCommandHooks`] observe all of them.
//!
//! Storage failures propagate as [`StorageError`]; unknown ids, a missing active document or a
//! missing alert are reported as `false`/`None`.
//!
//! # Example
//!
//! ```rust
//! use kea_core::{DocumentStore, ExternalCheck, MemoryStorage};
//!
//! let disk = MemoryStorage::new();
//! disk.insert_file("/a.md", "# a");
//!
//! let mut store = DocumentStore::new(disk.clone());
//! let id = store.open_file_from_path("/a.md").unwrap();
//!
//! store.update_content("# a!");
//! assert!(store.has_unsaved_changes());
//!
//! assert!(store.save_file().unwrap());
//! assert_eq!(store.document(id).unwrap().saved_content(), "# a!");
//! assert_eq!(disk.file("/a.md").as_deref(), Some("# a!"));
//!
//! assert_eq!(store.check_active_document_external_change().unwrap(), ExternalCheck::InSync);
//! ```

use crate::command::{DocumentCommand, DocumentCommandKind, DocumentCommandSource};
use crate::config::StoreConfig;
use crate::document::{DocumentId, EditorMode, ExternalChangeAlert, OpenDocument, file_name_of};
use crate::error::StorageError;
use crate::pipeline::{DocumentCommandHooks, dispatch_document_command};
use crate::ports::{DiscardConfirm, FileWatchEvent, NeverDiscard, RecentFilesPort, StoragePort};
use crate::recent::{RecentFile, RecentFiles};
use crate::viewport::ViewportSync;
use std::collections::HashMap;
use std::fmt;
use std::time::SystemTime;

/// Outcome of [`DocumentStore::check_active_document_external_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalCheck {
    /// Nothing was read: no active document, an untitled one, or a save/load in flight.
    Skipped,
    /// Disk matches the saved content; stale alert and ignore entries were cleared.
    InSync,
    /// The document was clean and now holds the disk content.
    Adopted,
    /// The document is dirty and the disk content was already ignored by the user.
    Ignored,
    /// The document is dirty and a new [`ExternalChangeAlert`] was raised.
    AlertRaised,
    /// The file no longer exists. Treated as a transient watch race.
    Missing,
}

struct StoreState {
    documents: Vec<OpenDocument>,
    active: Option<DocumentId>,
    next_id: u64,
    editor_mode: EditorMode,
    external_change: Option<ExternalChangeAlert>,
    ignored_external_changes: HashMap<String, String>,
    recent: RecentFiles,
    recent_port: Option<Box<dyn RecentFilesPort + Send>>,
    is_saving: bool,
    is_loading: bool,
    last_save_time: Option<SystemTime>,
    viewport: ViewportSync,
    config: StoreConfig,
}

impl StoreState {
    fn new(config: StoreConfig) -> Self {
        Self {
            documents: Vec::new(),
            active: None,
            next_id: 1,
            editor_mode: EditorMode::default(),
            external_change: None,
            ignored_external_changes: HashMap::new(),
            recent: RecentFiles::new(config.recent_files_limit),
            recent_port: None,
            is_saving: false,
            is_loading: false,
            last_save_time: None,
            viewport: ViewportSync::new(config.anchor_window),
            config,
        }
    }

    fn allocate_id(&mut self) -> DocumentId {
        let id = DocumentId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn index_of(&self, id: DocumentId) -> Option<usize> {
        self.documents.iter().position(|doc| doc.id() == id)
    }

    fn get(&self, id: DocumentId) -> Option<&OpenDocument> {
        self.documents.iter().find(|doc| doc.id() == id)
    }

    fn get_mut(&mut self, id: DocumentId) -> Option<&mut OpenDocument> {
        self.documents.iter_mut().find(|doc| doc.id() == id)
    }

    fn find_by_path(&self, path: &str) -> Option<&OpenDocument> {
        self.documents.iter().find(|doc| doc.path() == path)
    }

    fn active_document(&self) -> Option<&OpenDocument> {
        self.active.and_then(|id| self.get(id))
    }

    fn clear_alert_for(&mut self, id: DocumentId) {
        if self
            .external_change
            .as_ref()
            .is_some_and(|alert| alert.document_id == id)
        {
            self.external_change = None;
        }
    }

    fn add_recent(&mut self, path: &str, name: &str) {
        self.recent.add(path, name);
        self.persist_recent();
    }

    fn persist_recent(&mut self) {
        if let Some(port) = self.recent_port.as_mut()
            && let Err(err) = port.save(self.recent.entries())
        {
            tracing::warn!(error = %err, "failed to save recent files");
        }
    }
}

/// Multi-document state with dirty and external-change tracking.
///
/// The store is an explicit object: create one per window, hand out references, and call
/// [`DocumentStore::reset`] on teardown.
pub struct DocumentStore {
    state: StoreState,
    hooks: DocumentCommandHooks,
    storage: Box<dyn StoragePort + Send>,
    confirm: Box<dyn DiscardConfirm + Send>,
}

impl fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentStore")
            .field("documents", &self.state.documents)
            .field("active", &self.state.active)
            .field("editor_mode", &self.state.editor_mode)
            .field("external_change", &self.state.external_change)
            .field("is_saving", &self.state.is_saving)
            .field("is_loading", &self.state.is_loading)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

impl DocumentStore {
    /// Create an empty store over `storage`.
    ///
    /// Dirty documents are never discarded without `force` until a confirmation collaborator is
    /// installed with [`DocumentStore::with_confirm`].
    pub fn new<S>(storage: S) -> Self
    where
        S: StoragePort + Send + 'static,
    {
        Self {
            state: StoreState::new(StoreConfig::default()),
            hooks: DocumentCommandHooks::default(),
            storage: Box::new(storage),
            confirm: Box::new(NeverDiscard),
        }
    }

    /// Install the collaborator asked before discarding unsaved changes.
    pub fn with_confirm<C>(mut self, confirm: C) -> Self
    where
        C: DiscardConfirm + Send + 'static,
    {
        self.confirm = Box::new(confirm);
        self
    }

    /// Install recent-files persistence. Call [`DocumentStore::load_recent_files`] to read it.
    pub fn with_recent_files_port<P>(mut self, port: P) -> Self
    where
        P: RecentFilesPort + Send + 'static,
    {
        self.state.recent_port = Some(Box::new(port));
        self
    }

    /// Apply a configuration. Existing viewport state is discarded.
    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.state.recent.set_limit(config.recent_files_limit);
        self.state.viewport = ViewportSync::new(config.anchor_window);
        self.state.config = config;
        self
    }

    /// Install pipeline hooks observing every command.
    pub fn with_hooks(mut self, hooks: DocumentCommandHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Mutable access to the installed hooks.
    pub fn hooks_mut(&mut self) -> &mut DocumentCommandHooks {
        &mut self.hooks
    }

    /// Active configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.state.config
    }

    fn run_command<T>(
        &mut self,
        command: DocumentCommand,
        apply: impl FnOnce(&mut StoreState) -> T,
    ) -> T {
        let state = &mut self.state;
        dispatch_document_command(&command, move || apply(state), Some(&mut self.hooks))
    }

    /// Open documents in tab order.
    pub fn documents(&self) -> &[OpenDocument] {
        &self.state.documents
    }

    /// Look up a document by id.
    pub fn document(&self, id: DocumentId) -> Option<&OpenDocument> {
        self.state.get(id)
    }

    /// Look up an open document by its storage path.
    pub fn find_document_by_path(&self, path: &str) -> Option<&OpenDocument> {
        self.state.find_by_path(path)
    }

    /// The active document.
    pub fn active_document(&self) -> Option<&OpenDocument> {
        self.state.active_document()
    }

    /// The active document's id.
    pub fn active_document_id(&self) -> Option<DocumentId> {
        self.state.active
    }

    /// Returns `true` if the active document is dirty.
    pub fn has_unsaved_changes(&self) -> bool {
        self.active_document().is_some_and(OpenDocument::is_dirty)
    }

    /// Returns `true` if any open document is dirty.
    pub fn has_any_unsaved_changes(&self) -> bool {
        self.state.documents.iter().any(OpenDocument::is_dirty)
    }

    /// Display name of the active document, or the untitled name when there is none.
    pub fn current_file_name(&self) -> &str {
        self.active_document()
            .map(OpenDocument::name)
            .unwrap_or(self.state.config.untitled_name.as_str())
    }

    /// Path of the active document, if it has one.
    pub fn current_file_path(&self) -> Option<&str> {
        self.active_document()
            .map(OpenDocument::path)
            .filter(|path| !path.is_empty())
    }

    /// The outstanding external-change alert.
    pub fn external_change(&self) -> Option<&ExternalChangeAlert> {
        self.state.external_change.as_ref()
    }

    /// Disk content the user chose to ignore for `path`.
    pub fn ignored_external_change(&self, path: &str) -> Option<&str> {
        self.state
            .ignored_external_changes
            .get(path)
            .map(String::as_str)
    }

    /// Recent files, most recent first.
    pub fn recent_files(&self) -> &[RecentFile] {
        self.state.recent.entries()
    }

    /// Returns `true` while a save is in flight.
    pub fn is_saving(&self) -> bool {
        self.state.is_saving
    }

    /// Returns `true` while a read is in flight.
    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    /// When content last became the saved baseline (open, save, remote change).
    pub fn last_save_time(&self) -> Option<SystemTime> {
        self.state.last_save_time
    }

    /// Current representation.
    pub fn editor_mode(&self) -> EditorMode {
        self.state.editor_mode
    }

    /// Per-document viewport cache.
    pub fn viewport(&self) -> &ViewportSync {
        &self.state.viewport
    }

    /// Mutable per-document viewport cache.
    pub fn viewport_mut(&mut self) -> &mut ViewportSync {
        &mut self.state.viewport
    }

    /// Open a document with known content.
    ///
    /// If `path` is already open, that document is activated and its id returned; no duplicate
    /// is created. Any pending alert is dropped either way.
    pub fn open_file(&mut self, path: &str, content: &str, name: &str) -> DocumentId {
        if let Some(existing) = self.state.find_by_path(path).map(OpenDocument::id) {
            self.state.active = Some(existing);
            self.state.external_change = None;
            return existing;
        }

        let id = self.state.allocate_id();
        let doc = OpenDocument::clean(id, path.to_string(), name.to_string(), content.to_string());
        let command = DocumentCommand::local(DocumentCommandKind::OpenDocument)
            .with_document(id)
            .with_path(path)
            .with_content_length(content.chars().count());

        self.run_command(command, |state| {
            state.documents.push(doc);
            state.active = Some(id);
            state.external_change = None;
            state.add_recent(path, name);
            state.last_save_time = Some(SystemTime::now());
            id
        })
    }

    /// Read `path` through the storage port and open it.
    ///
    /// Already-open paths are activated without any I/O.
    pub fn open_file_from_path(&mut self, path: &str) -> Result<DocumentId, StorageError> {
        if let Some(existing) = self.state.find_by_path(path).map(OpenDocument::id) {
            self.state.active = Some(existing);
            return Ok(existing);
        }

        self.state.is_loading = true;
        let result = self.storage.read_file(path);
        self.state.is_loading = false;

        match result {
            Ok(opened) => Ok(self.open_file(&opened.path, &opened.content, &opened.name)),
            Err(err) => {
                tracing::error!(path, error = %err, "failed to open file");
                Err(err)
            }
        }
    }

    /// Let the user pick a file and open it.
    ///
    /// Returns `Ok(false)` if the picker was dismissed.
    pub fn open_file_dialog(&mut self) -> Result<bool, StorageError> {
        self.state.is_loading = true;
        let result = self.storage.open_file_picker();
        self.state.is_loading = false;

        match result {
            Ok(opened) => {
                self.open_file(&opened.path, &opened.content, &opened.name);
                Ok(true)
            }
            Err(StorageError::Cancelled) => Ok(false),
            Err(err) => {
                tracing::error!(error = %err, "failed to open file");
                Err(err)
            }
        }
    }

    /// Create and activate an empty untitled document.
    pub fn new_file(&mut self) -> DocumentId {
        let id = self.state.allocate_id();
        let doc = OpenDocument::clean(
            id,
            String::new(),
            self.state.config.untitled_name.clone(),
            String::new(),
        );
        let command = DocumentCommand::local(DocumentCommandKind::CreateDocument)
            .with_document(id)
            .with_content_length(0);

        self.run_command(command, |state| {
            state.documents.push(doc);
            state.active = Some(id);
            state.external_change = None;
            id
        })
    }

    /// Activate `id`. Returns `false` if it is not open.
    pub fn set_active_document(&mut self, id: DocumentId) -> bool {
        let Some(path) = self.state.get(id).map(|doc| doc.path().to_string()) else {
            return false;
        };
        let command = DocumentCommand::local(DocumentCommandKind::SwitchDocument)
            .with_document(id)
            .with_path(path);

        self.run_command(command, |state| {
            state.active = Some(id);
            if state
                .external_change
                .as_ref()
                .is_some_and(|alert| alert.document_id != id)
            {
                state.external_change = None;
            }
        });
        true
    }

    /// Replace the active document's content with a local edit.
    ///
    /// Returns `false` if there is no active document.
    pub fn update_content(&mut self, new_content: &str) -> bool {
        match self.state.active {
            Some(id) => self.update_document_content(id, new_content),
            None => false,
        }
    }

    /// Replace a specific document's content with a local edit.
    ///
    /// Returns `false` if `id` is not open.
    pub fn update_document_content(&mut self, id: DocumentId, new_content: &str) -> bool {
        let Some(path) = self.state.get(id).map(|doc| doc.path().to_string()) else {
            return false;
        };
        let command = DocumentCommand::local(DocumentCommandKind::UpdateContent)
            .with_document(id)
            .with_path(path)
            .with_content_length(new_content.chars().count());

        self.run_command(command, |state| {
            if let Some(doc) = state.get_mut(id) {
                doc.set_content(new_content.to_string());
            }
        });
        true
    }

    /// Write the active document to its path. Untitled documents go through
    /// [`DocumentStore::save_file_as`].
    ///
    /// Returns `Ok(false)` when there is no active document or a save is already in flight. On
    /// error the document keeps its dirty state.
    pub fn save_file(&mut self) -> Result<bool, StorageError> {
        if self.state.is_saving {
            return Ok(false);
        }
        let Some(doc) = self.state.active_document() else {
            return Ok(false);
        };
        if doc.is_untitled() {
            return self.save_file_as();
        }

        let (id, path, content) = (doc.id(), doc.path().to_string(), doc.content().to_string());

        self.state.is_saving = true;
        let result = self.storage.save_file(&path, &content);
        self.state.is_saving = false;

        if let Err(err) = result {
            tracing::error!(path = %path, error = %err, "failed to save file");
            return Err(err);
        }

        let command = DocumentCommand::local(DocumentCommandKind::SaveDocument)
            .with_document(id)
            .with_path(path.as_str())
            .with_content_length(content.chars().count());

        Ok(self.run_command(command, |state| {
            if let Some(doc) = state.get_mut(id) {
                doc.mark_saved();
            }
            state.external_change = None;
            state.ignored_external_changes.remove(&path);
            state.last_save_time = Some(SystemTime::now());
            true
        }))
    }

    /// Let the user pick a location and write the active document there.
    ///
    /// Returns `Ok(false)` when there is no active document, a save is in flight, or the dialog
    /// was dismissed.
    pub fn save_file_as(&mut self) -> Result<bool, StorageError> {
        if self.state.is_saving {
            return Ok(false);
        }
        let Some(doc) = self.state.active_document() else {
            return Ok(false);
        };
        let (id, content) = (doc.id(), doc.content().to_string());

        self.state.is_saving = true;
        let result = self.storage.save_file_as(&content);
        self.state.is_saving = false;

        let saved = match result {
            Ok(saved) => saved,
            Err(StorageError::Cancelled) => return Ok(false),
            Err(err) => {
                tracing::error!(error = %err, "failed to save file as");
                return Err(err);
            }
        };

        let command = DocumentCommand::local(DocumentCommandKind::SaveDocumentAs)
            .with_document(id)
            .with_path(saved.path.as_str())
            .with_content_length(content.chars().count());

        Ok(self.run_command(command, |state| {
            if let Some(doc) = state.get_mut(id) {
                doc.set_location(saved.path.clone(), saved.name.clone());
                doc.mark_saved();
            }
            state.external_change = None;
            state.ignored_external_changes.remove(&saved.path);
            state.last_save_time = Some(SystemTime::now());
            state.add_recent(&saved.path, &saved.name);
            true
        }))
    }

    /// Save every dirty document that has a path, in tab order.
    ///
    /// Stops at the first failure and returns `false`: documents before it stay saved, the
    /// failed one and everything after it stay dirty.
    pub fn save_all_files(&mut self) -> bool {
        let pending: Vec<(DocumentId, String, String, String)> = self
            .state
            .documents
            .iter()
            .filter(|doc| doc.is_dirty() && !doc.is_untitled())
            .map(|doc| {
                (
                    doc.id(),
                    doc.path().to_string(),
                    doc.name().to_string(),
                    doc.content().to_string(),
                )
            })
            .collect();

        for (id, path, name, content) in pending {
            if let Err(err) = self.storage.save_file(&path, &content) {
                tracing::error!(document = %name, path = %path, error = %err, "failed to save");
                return false;
            }

            let command = DocumentCommand::local(DocumentCommandKind::SaveDocument)
                .with_document(id)
                .with_path(path.as_str())
                .with_content_length(content.chars().count());
            self.run_command(command, |state| {
                if let Some(doc) = state.get_mut(id) {
                    doc.mark_saved();
                }
                state.clear_alert_for(id);
                state.ignored_external_changes.remove(&path);
            });
        }

        self.state.last_save_time = Some(SystemTime::now());
        true
    }

    /// Close a tab.
    ///
    /// A dirty document is only discarded when `force` is set, confirmation is disabled in the
    /// config, or the confirmation collaborator agrees. The active pointer moves to the tab now
    /// at the closed index (or the last tab). The document's alert, ignore entry and viewport
    /// state are dropped.
    pub fn close_document(&mut self, id: DocumentId, force: bool) -> bool {
        let Some(index) = self.state.index_of(id) else {
            return false;
        };
        let doc = &self.state.documents[index];
        if doc.is_dirty() && !force && self.state.config.confirm_on_close {
            let prompt = format!(
                "\"{}\" has unsaved changes. Do you want to discard them?",
                doc.name()
            );
            if !self.confirm.confirm_discard(&prompt) {
                return false;
            }
        }

        let path = doc.path().to_string();
        let command = DocumentCommand::local(DocumentCommandKind::CloseDocument)
            .with_document(id)
            .with_path(path.as_str());

        self.run_command(command, |state| {
            state.documents.remove(index);
            if state.active == Some(id) {
                state.active = state
                    .documents
                    .get(index.min(state.documents.len().saturating_sub(1)))
                    .map(OpenDocument::id);
            }
            state.clear_alert_for(id);
            if !path.is_empty() {
                state.ignored_external_changes.remove(&path);
            }
            state.viewport.clear(id);
            true
        })
    }

    /// Close every tab, asking once if anything is dirty and `force` is not set.
    pub fn close_all_documents(&mut self, force: bool) -> bool {
        if !force
            && self.state.config.confirm_on_close
            && self.has_any_unsaved_changes()
            && !self
                .confirm
                .confirm_discard("You have unsaved changes. Do you want to discard them?")
        {
            return false;
        }

        let command = DocumentCommand::local(DocumentCommandKind::CloseAllDocuments);
        self.run_command(command, |state| {
            state.documents.clear();
            state.active = None;
            state.external_change = None;
            state.ignored_external_changes.clear();
            state.viewport.clear_all();
            true
        })
    }

    /// Compare the active document with its file on disk.
    ///
    /// Clean documents adopt the disk content silently. Dirty ones raise an alert unless the
    /// same disk content was already ignored. A missing file is not an error.
    pub fn check_active_document_external_change(&mut self) -> Result<ExternalCheck, StorageError> {
        if self.state.is_saving || self.state.is_loading {
            return Ok(ExternalCheck::Skipped);
        }
        let Some(doc) = self.state.active_document() else {
            return Ok(ExternalCheck::Skipped);
        };
        if doc.is_untitled() {
            return Ok(ExternalCheck::Skipped);
        }
        let (id, path) = (doc.id(), doc.path().to_string());

        let disk_content = match self.storage.read_file(&path) {
            Ok(opened) => opened.content,
            Err(err) if err.is_not_found() => {
                tracing::debug!(path = %path, "watched file is missing");
                return Ok(ExternalCheck::Missing);
            }
            Err(err) => {
                tracing::error!(path = %path, error = %err, "failed to check external file changes");
                return Err(err);
            }
        };

        let Some(doc) = self.state.get(id) else {
            return Ok(ExternalCheck::Skipped);
        };

        if disk_content == doc.saved_content() {
            self.state.clear_alert_for(id);
            self.state.ignored_external_changes.remove(&path);
            return Ok(ExternalCheck::InSync);
        }

        if !doc.is_dirty() {
            let command = DocumentCommand::new(
                DocumentCommandKind::ApplyExternalEdit,
                DocumentCommandSource::External,
            )
            .with_document(id)
            .with_path(path.as_str())
            .with_content_length(disk_content.chars().count());

            self.run_command(command, |state| {
                if let Some(doc) = state.get_mut(id) {
                    doc.replace_clean(disk_content);
                }
                state.external_change = None;
                state.ignored_external_changes.remove(&path);
            });
            return Ok(ExternalCheck::Adopted);
        }

        if self.ignored_external_change(&path) == Some(disk_content.as_str()) {
            return Ok(ExternalCheck::Ignored);
        }

        tracing::debug!(document = %id, path = %path, "external change detected");
        self.state.external_change = Some(ExternalChangeAlert {
            document_id: id,
            path,
            disk_content,
            detected_at: SystemTime::now(),
        });
        Ok(ExternalCheck::AlertRaised)
    }

    /// Route a file-watch event. Only events for the active document's path trigger a check.
    pub fn handle_file_watch_event(
        &mut self,
        event: &FileWatchEvent,
    ) -> Result<ExternalCheck, StorageError> {
        if self.current_file_path() != Some(event.path.as_str()) {
            return Ok(ExternalCheck::Skipped);
        }
        self.check_active_document_external_change()
    }

    /// Resolve the alert by replacing the document with the disk content.
    ///
    /// Returns `false` if there is no alert or its document has been closed.
    pub fn accept_external_change(&mut self) -> bool {
        let Some(alert) = self.state.external_change.clone() else {
            return false;
        };
        let Some(path) = self.state.get(alert.document_id).map(|doc| doc.path().to_string())
        else {
            self.state.external_change = None;
            return false;
        };

        let id = alert.document_id;
        let command = DocumentCommand::new(
            DocumentCommandKind::ApplyExternalEdit,
            DocumentCommandSource::External,
        )
        .with_document(id)
        .with_path(path.as_str())
        .with_content_length(alert.disk_content.chars().count());

        self.run_command(command, |state| {
            if let Some(doc) = state.get_mut(id) {
                doc.replace_clean(alert.disk_content);
            }
            state.external_change = None;
            state.ignored_external_changes.remove(&path);
        });
        true
    }

    /// Resolve the alert by keeping local edits and ignoring this disk content.
    ///
    /// Returns `false` if there is no alert.
    pub fn keep_local_version(&mut self) -> bool {
        let Some(alert) = self.state.external_change.take() else {
            return false;
        };
        self.state
            .ignored_external_changes
            .insert(alert.path, alert.disk_content);
        true
    }

    /// Apply content delivered by a collaboration layer. Remote content always wins.
    ///
    /// Returns `false` if `path` is not open or both the content and the saved content already
    /// equal `content`.
    pub fn apply_remote_change(&mut self, path: &str, content: &str) -> bool {
        let Some(doc) = self.state.find_by_path(path) else {
            return false;
        };
        if doc.saved_content() == content && doc.content() == content {
            return false;
        }

        let id = doc.id();
        let command = DocumentCommand::new(
            DocumentCommandKind::ApplyExternalEdit,
            DocumentCommandSource::Remote,
        )
        .with_document(id)
        .with_path(path)
        .with_content_length(content.chars().count());

        self.run_command(command, |state| {
            if let Some(doc) = state.get_mut(id) {
                doc.replace_clean(content.to_string());
            }
            state.clear_alert_for(id);
            state.ignored_external_changes.remove(path);
            state.last_save_time = Some(SystemTime::now());
        });
        true
    }

    /// Rewrite every path equal to `old_path` (or, for directories, below it) to live under
    /// `new_path`: open documents, the alert, the ignore map and the recent files.
    pub fn update_paths_after_rename(&mut self, old_path: &str, new_path: &str, is_directory: bool) {
        if old_path.is_empty() {
            return;
        }
        let matches = |path: &str| path_matches_rename(path, old_path, is_directory);

        for doc in &mut self.state.documents {
            if matches(doc.path()) {
                let path = replace_path_prefix(doc.path(), old_path, new_path);
                if let Some(name) = file_name_of(&path) {
                    doc.set_name(name.to_string());
                }
                doc.set_path(path);
            }
        }

        if let Some(alert) = self.state.external_change.as_mut()
            && matches(&alert.path)
        {
            alert.path = replace_path_prefix(&alert.path, old_path, new_path);
        }

        self.state.ignored_external_changes = std::mem::take(&mut self.state.ignored_external_changes)
            .into_iter()
            .map(|(path, content)| {
                if matches(&path) {
                    (replace_path_prefix(&path, old_path, new_path), content)
                } else {
                    (path, content)
                }
            })
            .collect();

        self.state.recent.rewrite(|entry| {
            matches(&entry.path).then(|| {
                let path = replace_path_prefix(&entry.path, old_path, new_path);
                let name = file_name_of(&path).unwrap_or(entry.name.as_str()).to_string();
                (path, name)
            })
        });
        self.state.persist_recent();

        tracing::debug!(old_path, new_path, is_directory, "paths updated after rename");
    }

    /// Move the tab at `from` to `to` (clamped to the last position).
    ///
    /// Returns `false` if `from` is out of range.
    pub fn reorder_tabs(&mut self, from: usize, to: usize) -> bool {
        if from >= self.state.documents.len() {
            return false;
        }
        let doc = self.state.documents.remove(from);
        let to = to.min(self.state.documents.len());
        self.state.documents.insert(to, doc);
        true
    }

    /// Tab index of `id`.
    pub fn document_index(&self, id: DocumentId) -> Option<usize> {
        self.state.index_of(id)
    }

    /// Activate the next tab, wrapping around.
    pub fn next_tab(&mut self) {
        self.step_tab(1);
    }

    /// Activate the previous tab, wrapping around.
    pub fn previous_tab(&mut self) {
        let len = self.state.documents.len();
        self.step_tab(len.saturating_sub(1));
    }

    fn step_tab(&mut self, step: usize) {
        let len = self.state.documents.len();
        if len <= 1 {
            return;
        }
        let current = self
            .state
            .active
            .and_then(|id| self.state.index_of(id))
            .unwrap_or(0);
        self.state.active = Some(self.state.documents[(current + step) % len].id());
    }

    /// Switch the representation.
    pub fn set_editor_mode(&mut self, mode: EditorMode) {
        self.state.editor_mode = mode;
    }

    /// Flip between source and rendered. Returns the new mode.
    pub fn toggle_editor_mode(&mut self) -> EditorMode {
        self.state.editor_mode = self.state.editor_mode.toggled();
        self.state.editor_mode
    }

    /// Replace the recent files with the persisted list.
    ///
    /// Returns `false` if no port is installed or loading failed.
    pub fn load_recent_files(&mut self) -> bool {
        let Some(port) = self.state.recent_port.as_mut() else {
            return false;
        };
        match port.load() {
            Ok(entries) => {
                let limit = self.state.recent.limit();
                self.state.recent = RecentFiles::from_entries(entries, limit);
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load recent files");
                false
            }
        }
    }

    /// Drop every document and all per-document state. Recent files, hooks, ports and config
    /// are kept.
    pub fn reset(&mut self) {
        let state = &mut self.state;
        state.documents.clear();
        state.active = None;
        state.editor_mode = EditorMode::default();
        state.external_change = None;
        state.ignored_external_changes.clear();
        state.is_saving = false;
        state.is_loading = false;
        state.last_save_time = None;
        state.viewport.clear_all();
    }
}

fn path_matches_rename(path: &str, old_path: &str, is_directory: bool) -> bool {
    if path == old_path {
        return true;
    }
    is_directory
        && path
            .strip_prefix(old_path)
            .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('\\'))
}

fn replace_path_prefix(path: &str, old_path: &str, new_path: &str) -> String {
    match path.strip_prefix(old_path) {
        Some(rest) => format!("{new_path}{rest}"),
        None => path.to_string(),
    }
}
