//! Viewport translation tests
//!
//! Cross-view restore tiers, the anchor fallback and boundary map properties.

use kea_core::viewport::{
    map_markdown_offset_to_plain_offset, map_plain_offset_to_markdown_offset,
    plain_to_markdown_boundaries,
};
use kea_core::{
    DocumentStore, MemoryStorage, RenderedViewport, RestoreStrategy, SourceViewport,
    ViewportSync,
};
use pretty_assertions::assert_eq;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::time::{Duration, UNIX_EPOCH};

#[test]
fn test_anchor_fallback_finds_token() {
    let mut store = DocumentStore::new(MemoryStorage::new());
    let source = "xxxxx foo yyyy";
    let id = store.open_file("/a.md", source, "a.md");

    let sync = store.viewport_mut();
    // Cursor between 'f' and 'o': ratio 7 / 14 = 0.5.
    sync.record_source_snapshot(
        id,
        SourceViewport {
            markdown: source,
            cursor_offset: 7,
            scroll_ratio: 0.3,
        },
    );
    let anchor = sync.snapshot(id).unwrap().anchor.clone().unwrap();
    assert_eq!(anchor.token, "foo");
    assert_eq!(anchor.token_relative_offset, 1);
    assert_eq!(anchor.cursor_ratio, 0.5);

    sync.clear_rendered_snapshot(id);
    sync.clear_source_snapshot(id);

    let plain = "the FOO is here and then some more";
    let restore = sync.rendered_restore(id, plain).unwrap();
    assert_eq!(restore.strategy, RestoreStrategy::Anchor);
    assert_eq!(restore.plain_cursor_offset, 4 + 1);
    assert_eq!(restore.scroll_ratio, 0.3);
    assert_eq!(restore.surface_pos, None);
}

#[test]
fn test_anchor_without_match_uses_ratio() {
    let mut sync = ViewportSync::default();
    let mut store = DocumentStore::new(MemoryStorage::new());
    let id = store.open_file("/a.md", "", "a.md");

    sync.record_rendered_snapshot(
        id,
        RenderedViewport {
            plain_text: "alpha beta",
            plain_cursor_offset: 5,
            surface_pos: 6,
            scroll_ratio: 0.0,
        },
    );
    sync.clear_rendered_snapshot(id);

    // The anchor token is "beta"; ratio 0.5 of 20 characters.
    let restore = sync.source_restore(id, "zzzzzzzzzz zzzzzzzzz").unwrap();
    assert_eq!(restore.strategy, RestoreStrategy::Anchor);
    assert_eq!(restore.cursor_offset, 10);
}

#[test]
fn test_round_trip_through_both_views() {
    let mut sync = ViewportSync::default();
    let mut store = DocumentStore::new(MemoryStorage::new());
    let markdown = "# Notes\n\n- **first** item\n- second `item`\n";
    let plain = "Notes\nfirst item\nsecond item\n";
    let id = store.open_file("/n.md", markdown, "n.md");

    // Cursor before "second" in the source.
    let cursor = markdown.find("second").unwrap();
    sync.record_source_snapshot_at(
        id,
        SourceViewport {
            markdown,
            cursor_offset: cursor,
            scroll_ratio: 0.5,
        },
        UNIX_EPOCH + Duration::from_secs(1),
    );
    let rendered = sync.rendered_restore(id, plain).unwrap();
    assert_eq!(rendered.strategy, RestoreStrategy::CrossMap);
    assert_eq!(rendered.plain_cursor_offset, plain.find("second").unwrap());

    sync.record_rendered_snapshot_at(
        id,
        RenderedViewport {
            plain_text: plain,
            plain_cursor_offset: rendered.plain_cursor_offset,
            surface_pos: 40,
            scroll_ratio: rendered.scroll_ratio,
        },
        UNIX_EPOCH + Duration::from_secs(2),
    );
    // Greedy alignment lands before the list marker of the same line.
    let source = sync.source_restore(id, markdown).unwrap();
    assert_eq!(source.strategy, RestoreStrategy::CrossMap);
    assert_eq!(source.cursor_offset, markdown.find("- second").unwrap());
    assert_eq!(source.scroll_ratio, 0.5);
}

#[test]
fn test_closing_document_drops_viewport_state() {
    let mut store = DocumentStore::new(MemoryStorage::new());
    let id = store.open_file("/a.md", "text", "a.md");
    store.viewport_mut().record_source_snapshot(
        id,
        SourceViewport {
            markdown: "text",
            cursor_offset: 2,
            scroll_ratio: 0.0,
        },
    );
    assert!(store.viewport().snapshot(id).is_some());

    assert!(store.close_document(id, false));
    assert!(store.viewport().snapshot(id).is_none());
}

fn random_markdown(rng: &mut StdRng, len: usize) -> (String, String) {
    const TEXT: &[char] = &['a', 'b', 'c', ' ', '\n', 'é', '中'];
    const MARKUP: &[char] = &['*', '#', '_', '`', '>'];

    let mut markdown = String::new();
    let mut plain = String::new();
    for _ in 0..len {
        if rng.gen_bool(0.3) {
            markdown.push(MARKUP[rng.gen_range(0..MARKUP.len())]);
        } else {
            let ch = TEXT[rng.gen_range(0..TEXT.len())];
            markdown.push(ch);
            plain.push(ch);
        }
    }
    (markdown, plain)
}

#[test]
fn test_boundary_round_trip_is_monotonic() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..200 {
        let len = rng.gen_range(0..80);
        let (markdown, plain) = random_markdown(&mut rng, len);
        let plain_len = plain.chars().count();

        let mut previous = 0;
        for k in 0..=plain_len + 2 {
            let md = map_plain_offset_to_markdown_offset(&markdown, &plain, k);
            assert!(md <= markdown.chars().count());
            let back = map_markdown_offset_to_plain_offset(&markdown, &plain, md);
            assert!(back <= plain_len, "{back} > {plain_len} for {markdown:?}");
            assert!(back >= previous, "not monotonic at {k} for {markdown:?}");
            previous = back;
        }
    }
}

#[test]
fn test_boundaries_are_non_decreasing_for_any_input() {
    let mut rng = StdRng::seed_from_u64(9);
    for _ in 0..200 {
        let (markdown, _) = random_markdown(&mut rng, 40);
        let (unrelated, _) = random_markdown(&mut rng, 40);

        let boundaries = plain_to_markdown_boundaries(&markdown, &unrelated);
        assert_eq!(boundaries.len(), unrelated.chars().count() + 1);
        assert_eq!(boundaries[0], 0);
        assert!(boundaries.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(*boundaries.last().unwrap() <= markdown.chars().count());
    }
}
