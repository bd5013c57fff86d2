//! Editor event bus.
//!
//! Decouples the text-editing surface from the document model: toolbars and menus publish
//! [`EditorCommandEvent`]s, the editing surface subscribes to them, and publishes
//! [`EditorUiState`] updates back. Each subscription returns a [`Subscription`] handle that
//! removes exactly that handler.
//!
//! # Example
//!
//! ```rust
//! use kea_core::{EditorCommand, EditorEvents};
//! use std::sync::{Arc, Mutex};
//!
//! let mut events = EditorEvents::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//! let subscription = events.commands.subscribe(move |event| {
//!     sink.lock().unwrap().push(event.command);
//! });
//!
//! events.dispatch_command(EditorCommand::Bold, None);
//! events.commands.unsubscribe(subscription);
//! events.dispatch_command(EditorCommand::Italic, None);
//!
//! assert_eq!(*seen.lock().unwrap(), vec![EditorCommand::Bold]);
//! ```

use crate::error::UnknownEditorCommand;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// Boxed event handler.
pub type EventHandler<E> = Box<dyn FnMut(&E) + Send>;

/// Typed publish/subscribe channel.
pub struct EventBus<E> {
    handlers: Vec<(Subscription, EventHandler<E>)>,
    next_id: u64,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
            next_id: 1,
        }
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}

impl<E> EventBus<E> {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler`. Handlers run in subscription order.
    pub fn subscribe<F>(&mut self, handler: F) -> Subscription
    where
        F: FnMut(&E) + Send + 'static,
    {
        let subscription = Subscription(self.next_id);
        self.next_id += 1;
        self.handlers.push((subscription, Box::new(handler)));
        subscription
    }

    /// Remove a handler. Returns `false` if it was already removed.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(id, _)| *id != subscription);
        self.handlers.len() != before
    }

    /// Deliver `event` to every handler. Returns the number of handlers notified.
    pub fn publish(&mut self, event: &E) -> usize {
        for (_, handler) in &mut self.handlers {
            handler(event);
        }
        self.handlers.len()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Formatting and editing commands understood by the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum EditorCommand {
    Undo,
    Redo,
    Find,
    Bold,
    Italic,
    Strikethrough,
    Code,
    CodeBlock,
    Blockquote,
    BulletList,
    OrderedList,
    TaskList,
    InsertLink,
    InsertImage,
    InsertHr,
    InsertHighlight,
    HeadingParagraph,
    #[serde(rename = "heading-1")]
    Heading1,
    #[serde(rename = "heading-2")]
    Heading2,
    #[serde(rename = "heading-3")]
    Heading3,
    #[serde(rename = "heading-4")]
    Heading4,
    #[serde(rename = "heading-5")]
    Heading5,
    #[serde(rename = "heading-6")]
    Heading6,
}

impl EditorCommand {
    /// Every command, in declaration order.
    pub const ALL: [EditorCommand; 23] = [
        Self::Undo,
        Self::Redo,
        Self::Find,
        Self::Bold,
        Self::Italic,
        Self::Strikethrough,
        Self::Code,
        Self::CodeBlock,
        Self::Blockquote,
        Self::BulletList,
        Self::OrderedList,
        Self::TaskList,
        Self::InsertLink,
        Self::InsertImage,
        Self::InsertHr,
        Self::InsertHighlight,
        Self::HeadingParagraph,
        Self::Heading1,
        Self::Heading2,
        Self::Heading3,
        Self::Heading4,
        Self::Heading5,
        Self::Heading6,
    ];

    /// Kebab-case name, e.g. `"code-block"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::Find => "find",
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Strikethrough => "strikethrough",
            Self::Code => "code",
            Self::CodeBlock => "code-block",
            Self::Blockquote => "blockquote",
            Self::BulletList => "bullet-list",
            Self::OrderedList => "ordered-list",
            Self::TaskList => "task-list",
            Self::InsertLink => "insert-link",
            Self::InsertImage => "insert-image",
            Self::InsertHr => "insert-hr",
            Self::InsertHighlight => "insert-highlight",
            Self::HeadingParagraph => "heading-paragraph",
            Self::Heading1 => "heading-1",
            Self::Heading2 => "heading-2",
            Self::Heading3 => "heading-3",
            Self::Heading4 => "heading-4",
            Self::Heading5 => "heading-5",
            Self::Heading6 => "heading-6",
        }
    }

    /// Heading command for `level` 1-6; `0` is the paragraph command.
    pub fn heading(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::HeadingParagraph),
            1 => Some(Self::Heading1),
            2 => Some(Self::Heading2),
            3 => Some(Self::Heading3),
            4 => Some(Self::Heading4),
            5 => Some(Self::Heading5),
            6 => Some(Self::Heading6),
            _ => None,
        }
    }
}

impl fmt::Display for EditorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditorCommand {
    type Err = UnknownEditorCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|command| command.as_str() == s)
            .ok_or_else(|| UnknownEditorCommand(s.to_string()))
    }
}

/// A command request with an optional command-specific payload (e.g. a link URL).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorCommandEvent {
    /// Requested command.
    pub command: EditorCommand,
    /// Command-specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// Partial UI state reported by the editing surface. `None` fields are unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorUiState {
    /// Whether the find panel is open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub find_open: Option<bool>,
    /// Whether undo is available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_undo: Option<bool>,
    /// Whether redo is available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_redo: Option<bool>,
}

impl EditorUiState {
    /// Overlay the fields set in `update` onto `self`.
    pub fn merge(&mut self, update: &EditorUiState) {
        if update.find_open.is_some() {
            self.find_open = update.find_open;
        }
        if update.can_undo.is_some() {
            self.can_undo = update.can_undo;
        }
        if update.can_redo.is_some() {
            self.can_redo = update.can_redo;
        }
    }
}

/// The two editor channels.
#[derive(Debug, Default)]
pub struct EditorEvents {
    /// Command requests, toolbar to editing surface.
    pub commands: EventBus<EditorCommandEvent>,
    /// UI state updates, editing surface to toolbar.
    pub ui_state: EventBus<EditorUiState>,
}

impl EditorEvents {
    /// Create both channels with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a command request. Returns the number of handlers notified.
    pub fn dispatch_command(
        &mut self,
        command: EditorCommand,
        payload: Option<serde_json::Value>,
    ) -> usize {
        tracing::trace!(command = command.as_str(), "editor command");
        self.commands.publish(&EditorCommandEvent { command, payload })
    }

    /// Publish a UI state update. Returns the number of handlers notified.
    pub fn dispatch_ui_state(&mut self, state: EditorUiState) -> usize {
        self.ui_state.publish(&state)
    }
}
