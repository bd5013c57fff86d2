//! Viewport anchor translation between the source and rendered representations.
//!
//! A document can be shown as markdown source or as a rendered view whose text content (the
//! "plain text") is roughly the source with formatting tokens stripped. Raw offsets mean
//! nothing across the two, so switching views or replacing content restores the cursor with a
//! three-tier policy, most precise first:
//!
//! 1. **Cross map**: if the *other* representation's snapshot is at least as recent as this
//!    one's, translate its offset through a plain-to-source boundary map.
//! 2. **Snapshot**: otherwise reuse this representation's own snapshot, clamped to the new text.
//! 3. **Anchor**: with no concrete snapshot, find the anchor token closest to the ratio-predicted
//!    offset, or fall back to the ratio itself.
//!
//! The boundary map assumes the plain text is a subsequence of the source in the same order.
//! Reordered content (generated tables of contents, footnotes moved to the end) degrades to a
//! coarse mapping; that is accepted.
//!
//! All offsets are character offsets. Ratios are clamped to `[0, 1]` and non-finite ratios read
//! as `0`.
//!
//! # Example
//!
//! ```rust
//! use kea_core::viewport::{RestoreStrategy, SourceViewport, ViewportSync};
//! use kea_core::DocumentStore;
//! # use kea_core::MemoryStorage;
//!
//! let mut store = DocumentStore::new(MemoryStorage::new());
//! let id = store.open_file("/a.md", "# Title\n\nSome **bold** text", "a.md");
//!
//! let sync: &mut ViewportSync = store.viewport_mut();
//! sync.record_source_snapshot(
//!     id,
//!     SourceViewport { markdown: "# Title\n\nSome **bold** text", cursor_offset: 16, scroll_ratio: 0.0 },
//! );
//!
//! // Switch to the rendered view: the source snapshot is the freshest data.
//! let restore = sync.rendered_restore(id, "Title\nSome bold text").unwrap();
//! assert_eq!(restore.strategy, RestoreStrategy::CrossMap);
//! assert_eq!(restore.plain_cursor_offset, 11);
//! ```

use crate::config::DEFAULT_ANCHOR_WINDOW;
use crate::document::{DocumentId, EditorMode};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::SystemTime;

static ANCHOR_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9][A-Za-z0-9_-]+").expect("anchor token pattern is valid")
});

/// Cursor/scroll report from the source view.
#[derive(Debug, Clone, Copy)]
pub struct SourceViewport<'a> {
    /// Current markdown text.
    pub markdown: &'a str,
    /// Cursor offset in `markdown`.
    pub cursor_offset: usize,
    /// Scroll position as a fraction of the scrollable height.
    pub scroll_ratio: f64,
}

/// Cursor/scroll report from the rendered view.
#[derive(Debug, Clone, Copy)]
pub struct RenderedViewport<'a> {
    /// Plain-text projection of the rendered document.
    pub plain_text: &'a str,
    /// Cursor offset in `plain_text`.
    pub plain_cursor_offset: usize,
    /// The rendered surface's own position for the cursor (opaque to this module).
    pub surface_pos: usize,
    /// Scroll position as a fraction of the scrollable height.
    pub scroll_ratio: f64,
}

/// Last known source-view state.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSnapshot {
    /// Cursor offset in `markdown_text`.
    pub cursor_offset: usize,
    /// Scroll ratio in `[0, 1]`.
    pub scroll_ratio: f64,
    /// Markdown text at capture time.
    pub markdown_text: String,
    /// Capture time.
    pub updated_at: SystemTime,
}

/// Last known rendered-view state.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSnapshot {
    /// Surface position at capture time.
    pub surface_pos: usize,
    /// Cursor offset in `plain_text`.
    pub plain_cursor_offset: usize,
    /// Scroll ratio in `[0, 1]`.
    pub scroll_ratio: f64,
    /// Plain text at capture time.
    pub plain_text: String,
    /// Capture time.
    pub updated_at: SystemTime,
}

/// Representation-agnostic positional fingerprint, rebuilt on every snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedAnchor {
    /// Representation the anchor was captured from.
    pub mode: EditorMode,
    /// Identifier-like token near the cursor; empty when none was found.
    pub token: String,
    /// Cursor offset relative to the token start.
    pub token_relative_offset: usize,
    /// Cursor offset as a fraction of the text length.
    pub cursor_ratio: f64,
    /// Scroll ratio in `[0, 1]`.
    pub scroll_ratio: f64,
    /// Capture time.
    pub updated_at: SystemTime,
}

/// Everything remembered about one document's viewports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentViewportSnapshot {
    /// Source-view snapshot.
    pub source: Option<SourceSnapshot>,
    /// Rendered-view snapshot.
    pub rendered: Option<RenderedSnapshot>,
    /// Fallback anchor derived from the most recent snapshot.
    pub anchor: Option<SharedAnchor>,
}

/// Which tier produced a restore position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreStrategy {
    /// Translated from the other representation's snapshot.
    CrossMap,
    /// Reused this representation's own snapshot.
    Snapshot,
    /// Resolved from the shared anchor.
    Anchor,
}

impl RestoreStrategy {
    /// Short name used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CrossMap => "cross-map",
            Self::Snapshot => "snapshot",
            Self::Anchor => "anchor",
        }
    }
}

/// Where to put the source view's cursor and scroll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceRestore {
    /// Cursor offset in the current markdown.
    pub cursor_offset: usize,
    /// Scroll ratio in `[0, 1]`.
    pub scroll_ratio: f64,
    /// Tier used.
    pub strategy: RestoreStrategy,
}

/// Where to put the rendered view's cursor and scroll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedRestore {
    /// Surface position, only when restoring from the rendered view's own snapshot.
    pub surface_pos: Option<usize>,
    /// Cursor offset in the current plain text.
    pub plain_cursor_offset: usize,
    /// Scroll ratio in `[0, 1]`.
    pub scroll_ratio: f64,
    /// Tier used.
    pub strategy: RestoreStrategy,
}

/// Per-document viewport cache.
#[derive(Debug, Clone)]
pub struct ViewportSync {
    snapshots: HashMap<DocumentId, DocumentViewportSnapshot>,
    anchor_window: usize,
}

impl Default for ViewportSync {
    fn default() -> Self {
        Self::new(DEFAULT_ANCHOR_WINDOW)
    }
}

impl ViewportSync {
    /// Create an empty cache searching `anchor_window` characters either side of the cursor for
    /// anchor tokens.
    pub fn new(anchor_window: usize) -> Self {
        Self {
            snapshots: HashMap::new(),
            anchor_window: anchor_window.max(1),
        }
    }

    /// Anchor token search half-width.
    pub fn anchor_window(&self) -> usize {
        self.anchor_window
    }

    /// Everything stored for `id`.
    pub fn snapshot(&self, id: DocumentId) -> Option<&DocumentViewportSnapshot> {
        self.snapshots.get(&id)
    }

    /// Number of documents with stored state.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Record the source view's state now.
    pub fn record_source_snapshot(&mut self, id: DocumentId, input: SourceViewport<'_>) {
        self.record_source_snapshot_at(id, input, SystemTime::now());
    }

    /// Record the source view's state with an explicit capture time.
    pub fn record_source_snapshot_at(
        &mut self,
        id: DocumentId,
        input: SourceViewport<'_>,
        at: SystemTime,
    ) {
        let anchor = build_anchor(
            EditorMode::Source,
            input.markdown,
            input.cursor_offset,
            input.scroll_ratio,
            self.anchor_window,
            at,
        );
        let entry = self.snapshots.entry(id).or_default();
        entry.source = Some(SourceSnapshot {
            cursor_offset: input.cursor_offset,
            scroll_ratio: clamp_ratio(input.scroll_ratio),
            markdown_text: input.markdown.to_string(),
            updated_at: at,
        });
        entry.anchor = Some(anchor);
    }

    /// Record the rendered view's state now.
    pub fn record_rendered_snapshot(&mut self, id: DocumentId, input: RenderedViewport<'_>) {
        self.record_rendered_snapshot_at(id, input, SystemTime::now());
    }

    /// Record the rendered view's state with an explicit capture time.
    pub fn record_rendered_snapshot_at(
        &mut self,
        id: DocumentId,
        input: RenderedViewport<'_>,
        at: SystemTime,
    ) {
        let anchor = build_anchor(
            EditorMode::Rendered,
            input.plain_text,
            input.plain_cursor_offset,
            input.scroll_ratio,
            self.anchor_window,
            at,
        );
        let entry = self.snapshots.entry(id).or_default();
        entry.rendered = Some(RenderedSnapshot {
            surface_pos: input.surface_pos,
            plain_cursor_offset: input.plain_cursor_offset,
            scroll_ratio: clamp_ratio(input.scroll_ratio),
            plain_text: input.plain_text.to_string(),
            updated_at: at,
        });
        entry.anchor = Some(anchor);
    }

    /// Compute where the source view should restore to for the current `markdown`.
    ///
    /// Returns `None` if nothing was ever recorded for `id`.
    pub fn source_restore(&self, id: DocumentId, markdown: &str) -> Option<SourceRestore> {
        let snapshot = self.snapshots.get(&id)?;
        let source = snapshot.source.as_ref();

        let restore = match (snapshot.rendered.as_ref(), source) {
            (Some(rendered), _) if source.is_none_or(|s| rendered.updated_at >= s.updated_at) => {
                SourceRestore {
                    cursor_offset: map_plain_offset_to_markdown_offset(
                        markdown,
                        &rendered.plain_text,
                        rendered.plain_cursor_offset,
                    ),
                    scroll_ratio: rendered.scroll_ratio,
                    strategy: RestoreStrategy::CrossMap,
                }
            }
            (_, Some(source)) => SourceRestore {
                cursor_offset: source.cursor_offset.min(char_len(markdown)),
                scroll_ratio: source.scroll_ratio,
                strategy: RestoreStrategy::Snapshot,
            },
            _ => {
                let anchor = snapshot.anchor.as_ref()?;
                SourceRestore {
                    cursor_offset: resolve_offset_from_anchor(markdown, anchor),
                    scroll_ratio: clamp_ratio(anchor.scroll_ratio),
                    strategy: RestoreStrategy::Anchor,
                }
            }
        };

        tracing::debug!(
            document = %id,
            strategy = restore.strategy.as_str(),
            cursor_offset = restore.cursor_offset,
            scroll_ratio = restore.scroll_ratio,
            "source viewport restore"
        );
        Some(restore)
    }

    /// Compute where the rendered view should restore to for the current `plain_text`.
    ///
    /// Returns `None` if nothing was ever recorded for `id`.
    pub fn rendered_restore(&self, id: DocumentId, plain_text: &str) -> Option<RenderedRestore> {
        let snapshot = self.snapshots.get(&id)?;
        let rendered = snapshot.rendered.as_ref();

        let restore = match (snapshot.source.as_ref(), rendered) {
            (Some(source), _) if rendered.is_none_or(|r| source.updated_at >= r.updated_at) => {
                RenderedRestore {
                    surface_pos: None,
                    plain_cursor_offset: map_markdown_offset_to_plain_offset(
                        &source.markdown_text,
                        plain_text,
                        source.cursor_offset,
                    ),
                    scroll_ratio: source.scroll_ratio,
                    strategy: RestoreStrategy::CrossMap,
                }
            }
            (_, Some(rendered)) => RenderedRestore {
                surface_pos: Some(rendered.surface_pos),
                plain_cursor_offset: rendered.plain_cursor_offset.min(char_len(plain_text)),
                scroll_ratio: rendered.scroll_ratio,
                strategy: RestoreStrategy::Snapshot,
            },
            _ => {
                let anchor = snapshot.anchor.as_ref()?;
                RenderedRestore {
                    surface_pos: None,
                    plain_cursor_offset: resolve_offset_from_anchor(plain_text, anchor),
                    scroll_ratio: clamp_ratio(anchor.scroll_ratio),
                    strategy: RestoreStrategy::Anchor,
                }
            }
        };

        tracing::debug!(
            document = %id,
            strategy = restore.strategy.as_str(),
            plain_cursor_offset = restore.plain_cursor_offset,
            scroll_ratio = restore.scroll_ratio,
            "rendered viewport restore"
        );
        Some(restore)
    }

    /// Drop the source snapshot, keeping the anchor.
    pub fn clear_source_snapshot(&mut self, id: DocumentId) {
        if let Some(entry) = self.snapshots.get_mut(&id) {
            entry.source = None;
        }
    }

    /// Drop the rendered snapshot, keeping the anchor.
    pub fn clear_rendered_snapshot(&mut self, id: DocumentId) {
        if let Some(entry) = self.snapshots.get_mut(&id) {
            entry.rendered = None;
        }
    }

    /// Drop everything stored for `id`.
    pub fn clear(&mut self, id: DocumentId) {
        self.snapshots.remove(&id);
    }

    /// Drop everything.
    pub fn clear_all(&mut self) {
        self.snapshots.clear();
    }
}

/// Clamp to `[0, 1]`, reading non-finite values as `0`.
pub fn clamp_ratio(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Greedy forward alignment of `plain` into `markdown`.
///
/// `boundaries[i]` is the markdown offset reached after consuming `i` plain characters: each
/// plain character is matched to its next occurrence at or after the current markdown offset.
/// Unmatched characters leave the offset where it was. The result has `plain.len() + 1` entries,
/// starts at `0`, and never decreases.
pub fn plain_to_markdown_boundaries(markdown: &str, plain: &str) -> Vec<usize> {
    let markdown: Vec<char> = markdown.chars().collect();
    let mut boundaries = Vec::with_capacity(plain.len() + 1);
    boundaries.push(0);

    let mut markdown_index = 0;
    for ch in plain.chars() {
        if let Some(found) = markdown[markdown_index..].iter().position(|&c| c == ch) {
            markdown_index += found + 1;
        }
        boundaries.push(markdown_index);
    }
    boundaries
}

/// Translate a plain-text offset into the corresponding markdown offset.
pub fn map_plain_offset_to_markdown_offset(markdown: &str, plain: &str, plain_offset: usize) -> usize {
    let boundaries = plain_to_markdown_boundaries(markdown, plain);
    let safe_offset = plain_offset.min(boundaries.len() - 1);
    boundaries[safe_offset].min(char_len(markdown))
}

/// Translate a markdown offset into the corresponding plain-text offset.
///
/// Picks the largest plain offset whose boundary does not pass `markdown_offset`.
pub fn map_markdown_offset_to_plain_offset(
    markdown: &str,
    plain: &str,
    markdown_offset: usize,
) -> usize {
    let boundaries = plain_to_markdown_boundaries(markdown, plain);
    let target = markdown_offset.min(char_len(markdown));
    // boundaries[0] == 0 <= target, so the partition point is at least 1.
    let plain_offset = boundaries.partition_point(|&boundary| boundary <= target) - 1;
    plain_offset.min(boundaries.len() - 1)
}

/// An identifier-like token found near a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorToken {
    /// Token text.
    pub text: String,
    /// Character offset of the token start.
    pub start: usize,
}

/// Find the token matching `[A-Za-z0-9][A-Za-z0-9_-]+` whose start is closest to `offset`,
/// searching `window` characters either side. Ties go to the earlier token.
///
/// Returns `None` for empty text or when the window holds no token.
pub fn extract_anchor_token(text: &str, offset: usize, window: usize) -> Option<AnchorToken> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return None;
    }

    let center = offset.min(chars.len() - 1);
    let start = center.saturating_sub(window);
    let end = chars.len().min(center.saturating_add(window));
    let window_text: String = chars[start..end].iter().collect();

    let mut best: Option<(usize, AnchorToken)> = None;
    let mut byte_cursor = 0;
    let mut char_cursor = 0;
    for m in ANCHOR_TOKEN.find_iter(&window_text) {
        char_cursor += window_text[byte_cursor..m.start()].chars().count();
        byte_cursor = m.start();

        let token_start = start + char_cursor;
        let distance = token_start.abs_diff(center);
        if best.as_ref().is_none_or(|(d, _)| distance < *d) {
            best = Some((
                distance,
                AnchorToken {
                    text: m.as_str().to_string(),
                    start: token_start,
                },
            ));
        }
    }
    best.map(|(_, token)| token)
}

/// Find the (ASCII case-insensitive) occurrence of `token` in `text` whose start is closest to
/// `expected_offset`. Ties go to the earlier occurrence. Tokens shorter than two characters
/// never match.
pub fn find_closest_occurrence(text: &str, token: &str, expected_offset: usize) -> Option<usize> {
    let needle: Vec<char> = token.chars().map(|c| c.to_ascii_lowercase()).collect();
    if needle.len() < 2 {
        return None;
    }
    let haystack: Vec<char> = text.chars().map(|c| c.to_ascii_lowercase()).collect();
    if haystack.len() < needle.len() {
        return None;
    }

    let mut best: Option<(usize, usize)> = None;
    for (index, candidate) in haystack.windows(needle.len()).enumerate() {
        if candidate != needle.as_slice() {
            continue;
        }
        let distance = index.abs_diff(expected_offset);
        if best.is_none_or(|(d, _)| distance < d) {
            best = Some((distance, index));
        }
    }
    best.map(|(_, index)| index)
}

/// Build the fallback anchor for a cursor in `text`.
pub fn build_anchor(
    mode: EditorMode,
    text: &str,
    cursor_offset: usize,
    scroll_ratio: f64,
    window: usize,
    at: SystemTime,
) -> SharedAnchor {
    let len = char_len(text);
    let safe_cursor = cursor_offset.min(len);
    let token_offset = if len > 0 { safe_cursor.min(len - 1) } else { 0 };

    let (token, token_relative_offset) = match extract_anchor_token(text, token_offset, window) {
        Some(found) => {
            let token_len = found.text.chars().count();
            let relative = safe_cursor.saturating_sub(found.start).min(token_len);
            (found.text, relative)
        }
        None => (String::new(), 0),
    };

    SharedAnchor {
        mode,
        token,
        token_relative_offset,
        cursor_ratio: if len > 0 {
            safe_cursor as f64 / len as f64
        } else {
            0.0
        },
        scroll_ratio: clamp_ratio(scroll_ratio),
        updated_at: at,
    }
}

/// Resolve an anchor against new text.
///
/// Predicts `round(cursor_ratio × len)`, then snaps to the closest occurrence of the anchor token
/// plus its relative offset. Without a match, the prediction is used as is.
pub fn resolve_offset_from_anchor(text: &str, anchor: &SharedAnchor) -> usize {
    let len = char_len(text);
    if len == 0 {
        return 0;
    }

    let expected = ((clamp_ratio(anchor.cursor_ratio) * len as f64).round() as usize).min(len);
    match find_closest_occurrence(text, &anchor.token, expected) {
        Some(index) => (index + anchor.token_relative_offset).min(len),
        None => expected,
    }
}
