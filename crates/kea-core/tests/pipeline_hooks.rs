//! Pipeline hook observation
//!
//! Every store mutation must pass through all four hook stages with the same command.

use kea_core::{
    DocumentCommand, DocumentCommandHooks, DocumentCommandKind, DocumentCommandSource,
    DocumentStore, MemoryStorage,
};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<(String, DocumentCommandKind, DocumentCommandSource)>>>;

fn recording_hooks(log: &Log) -> DocumentCommandHooks {
    let mut hooks = DocumentCommandHooks::default();
    for stage in ["normalise", "reconcile", "persist", "broadcast"] {
        let log = log.clone();
        let hook: kea_core::CommandHook = Box::new(move |command: &DocumentCommand| {
            log.lock()
                .unwrap()
                .push((stage.to_string(), command.kind(), command.source()));
        });
        match stage {
            "normalise" => hooks.normalise = Some(hook),
            "reconcile" => hooks.reconcile = Some(hook),
            "persist" => hooks.persist = Some(hook),
            _ => hooks.broadcast = Some(hook),
        }
    }
    hooks
}

fn broadcast_kinds(log: &Log) -> Vec<(DocumentCommandKind, DocumentCommandSource)> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|(stage, _, _)| stage == "broadcast")
        .map(|(_, kind, source)| (*kind, *source))
        .collect()
}

#[test]
fn test_store_commands_reach_every_hook() {
    let log: Log = Arc::default();
    let disk = MemoryStorage::new();
    disk.insert_file("/a.md", "a");
    let mut store = DocumentStore::new(disk.clone()).with_hooks(recording_hooks(&log));

    let a = store.open_file_from_path("/a.md").unwrap();
    let untitled = store.new_file();
    store.set_active_document(a);
    store.update_content("a!");
    store.save_file().unwrap();
    disk.insert_file("/a.md", "from disk");
    store.check_active_document_external_change().unwrap();
    store.apply_remote_change("/a.md", "from remote");
    store.set_active_document(untitled);
    disk.queue_save_as(Some("/b.md"));
    store.save_file_as().unwrap();
    store.close_document(untitled, true);
    store.close_all_documents(true);

    use DocumentCommandKind as K;
    use DocumentCommandSource as S;
    assert_eq!(
        broadcast_kinds(&log),
        vec![
            (K::OpenDocument, S::Local),
            (K::CreateDocument, S::Local),
            (K::SwitchDocument, S::Local),
            (K::UpdateContent, S::Local),
            (K::SaveDocument, S::Local),
            (K::ApplyExternalEdit, S::External),
            (K::ApplyExternalEdit, S::Remote),
            (K::SwitchDocument, S::Local),
            (K::SaveDocumentAs, S::Local),
            (K::CloseDocument, S::Local),
            (K::CloseAllDocuments, S::Local),
        ]
    );

    let entries = log.lock().unwrap();
    assert_eq!(entries.len(), 11 * 4);
    let stages: Vec<&str> = entries[..4].iter().map(|(s, _, _)| s.as_str()).collect();
    assert_eq!(stages, vec!["normalise", "reconcile", "persist", "broadcast"]);
}

#[test]
fn test_no_op_actions_dispatch_nothing() {
    let log: Log = Arc::default();
    let mut store =
        DocumentStore::new(MemoryStorage::new()).with_hooks(recording_hooks(&log));

    assert!(!store.update_content("nobody home"));
    assert!(!store.save_file().unwrap());
    assert!(!store.accept_external_change());
    assert!(!store.apply_remote_change("/x.md", "x"));

    let id = store.open_file("/a.md", "a", "a.md");
    assert!(!store.apply_remote_change("/a.md", "a"));
    let before = log.lock().unwrap().len();
    // Opening an already-open path only re-activates it.
    assert_eq!(store.open_file("/a.md", "a", "a.md"), id);
    assert_eq!(log.lock().unwrap().len(), before);
}

#[test]
fn test_command_payload_reaches_hooks() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let mut hooks = DocumentCommandHooks::default();
    hooks.persist = Some(Box::new(move |command: &DocumentCommand| {
        sink.lock().unwrap().push(command.to_string());
    }));
    let mut store = DocumentStore::new(MemoryStorage::new()).with_hooks(hooks);

    let id = store.open_file("/docs/a.md", "héllo", "a.md");
    store.update_content("héllo!");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(seen[1].starts_with("updateContent[local]"));
    assert!(seen[1].contains(&id.to_string()));
    assert!(seen[1].contains("/docs/a.md"));
}
