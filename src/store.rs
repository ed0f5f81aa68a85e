//! Ordered log of displayed message entries

use crate::format::{format, FormattedText};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an entry within one [`MessageStore`]
///
/// Allocated from a per-store counter, so ids stay unique no matter how fast
/// entries are appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// Author of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    User,
    Bot,
    /// Transient "assistant is typing" placeholder
    SystemTyping,
}

/// What the view layer draws for an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderedContent {
    Formatted(FormattedText),
    Typing,
}

/// Entry before it is given an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub role: Role,
    pub content: RenderedContent,
    pub raw_text: Option<String>,
}

impl NewMessage {
    /// Format `text` and attribute it to `role`
    pub fn formatted(role: Role, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            role,
            content: RenderedContent::Formatted(format(&text)),
            raw_text: Some(text),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::formatted(Role::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::formatted(Role::Bot, text)
    }

    pub fn typing() -> Self {
        Self {
            role: Role::SystemTyping,
            content: RenderedContent::Typing,
            raw_text: None,
        }
    }
}

/// One line item in the displayed conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub id: MessageId,
    pub role: Role,
    pub content: RenderedContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MessageEntry {
    pub fn is_typing(&self) -> bool {
        self.role == Role::SystemTyping
    }

    /// Formatted content, `None` for the typing placeholder
    pub fn formatted(&self) -> Option<&FormattedText> {
        match &self.content {
            RenderedContent::Formatted(text) => Some(text),
            RenderedContent::Typing => None,
        }
    }
}

/// Insertion-ordered message log
///
/// Entries are only ever appended or removed, never reordered. Because ids
/// come from a monotonic counter the log is also sorted by id.
#[derive(Debug, Default)]
pub struct MessageStore {
    entries: Vec<MessageEntry>,
    next_id: u64,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return its fresh id
    pub fn append(&mut self, message: NewMessage) -> MessageId {
        self.next_id += 1;
        let id = MessageId(self.next_id);
        self.entries.push(MessageEntry {
            id,
            role: message.role,
            content: message.content,
            raw_text: message.raw_text,
            created_at: Utc::now(),
        });
        id
    }

    /// Remove the entry with `id`, returning it if it was still present
    ///
    /// Removing an unknown or already-removed id is a no-op.
    pub fn remove(&mut self, id: MessageId) -> Option<MessageEntry> {
        let index = self
            .entries
            .binary_search_by_key(&id, |entry| entry.id)
            .ok()?;
        Some(self.entries.remove(index))
    }

    /// Read-only ordered view for rendering
    pub fn snapshot(&self) -> &[MessageEntry] {
        &self.entries
    }

    pub fn get(&self, id: MessageId) -> Option<&MessageEntry> {
        self.entries
            .binary_search_by_key(&id, |entry| entry.id)
            .ok()
            .map(|index| &self.entries[index])
    }

    /// Drop every entry; ids keep counting so old ids never come back
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn typing_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_typing()).count()
    }
}
