//! Walk through the external-change flow against an in-memory disk.
//!
//! Run with `RUST_LOG=debug cargo run -p kea-core --example external_change` to see the
//! pipeline and viewport log lines.

use kea_core::{
    DocumentStore, ExternalCheck, MemoryStorage, RenderedViewport, SourceViewport, StorageError,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), StorageError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let disk = MemoryStorage::new();
    disk.insert_file("/notes/todo.md", "# Todo\n\n- [ ] write docs\n");

    let mut store = DocumentStore::new(disk.clone());
    let id = store.open_file_from_path("/notes/todo.md")?;
    store.update_content("# Todo\n\n- [ ] write docs\n- [ ] ship it\n");

    disk.insert_file("/notes/todo.md", "# Todo\n\n- [x] write docs\n");
    match store.check_active_document_external_change()? {
        ExternalCheck::AlertRaised => {
            let alert = store.external_change().map(|a| a.disk_content.clone());
            println!("disk changed under unsaved edits: {alert:?}");
            store.keep_local_version();
        }
        other => println!("external check: {other:?}"),
    }

    store.save_file()?;
    println!(
        "saved {} (dirty: {})",
        store.current_file_name(),
        store.has_unsaved_changes()
    );

    let markdown = store
        .document(id)
        .map(|doc| doc.content().to_string())
        .unwrap_or_default();
    let plain = "Todo\nwrite docs\nship it\n";
    let sync = store.viewport_mut();
    sync.record_source_snapshot(
        id,
        SourceViewport {
            markdown: &markdown,
            cursor_offset: markdown.find("ship").unwrap_or(0),
            scroll_ratio: 0.8,
        },
    );
    if let Some(restore) = sync.rendered_restore(id, plain) {
        println!(
            "rendered cursor at {} via {}",
            restore.plain_cursor_offset,
            restore.strategy.as_str()
        );
        sync.record_rendered_snapshot(
            id,
            RenderedViewport {
                plain_text: plain,
                plain_cursor_offset: restore.plain_cursor_offset,
                surface_pos: restore.plain_cursor_offset + 1,
                scroll_ratio: restore.scroll_ratio,
            },
        );
    }

    Ok(())
}
