//! Conversation, message, folder and template types.
//!
//! `Conversation` keeps two denormalized fields, `preview` and `message_count`.
//! Both are private and only change through the mutation methods below, which
//! refresh them on every append or edit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::{ChatMessage, Role};

use super::ids::{ConversationId, FolderId, MessageId, TemplateId};

/// Number of characters of the latest message kept as preview.
pub const PREVIEW_CHARS: usize = 80;

/// Title given to a freshly created conversation.
pub const NEW_CHAT_TITLE: &str = "New Chat";

/// Preview shown before the first message.
pub const NEW_CHAT_PREVIEW: &str = "Say hello to start...";

/// Folder new conversations land in.
pub const DEFAULT_FOLDER: &str = "Work Projects";

/// First [`PREVIEW_CHARS`] characters of `content`.
#[must_use]
pub fn preview_of(content: &str) -> String {
    content.chars().take(PREVIEW_CHARS).collect()
}

/// One chat turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Identifier, unique within the conversation.
    pub id: MessageId,
    /// Author.
    pub role: Role,
    /// Text.
    pub content: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last edit time, if edited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Create a message stamped now.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: content.into(),
            created_at: Utc::now(),
            edited_at: None,
        }
    }

    /// Router input shape of this message.
    #[must_use]
    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage::new(self.role, self.content.clone())
    }
}

/// An ordered log of chat turns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Identifier.
    pub id: ConversationId,
    /// Display title.
    pub title: String,
    /// Whether the conversation is pinned.
    pub pinned: bool,
    /// Name of the folder the conversation is filed under.
    pub folder: String,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    messages: Vec<Message>,
    preview: String,
    message_count: usize,
}

impl Conversation {
    /// An empty "New Chat" conversation in the default folder.
    #[must_use]
    pub fn new_chat() -> Self {
        Self {
            id: ConversationId::new(),
            title: NEW_CHAT_TITLE.to_string(),
            pinned: false,
            folder: DEFAULT_FOLDER.to_string(),
            updated_at: Utc::now(),
            messages: Vec::new(),
            preview: NEW_CHAT_PREVIEW.to_string(),
            message_count: 0,
        }
    }

    /// A pre-populated conversation, used for startup seeding.
    #[must_use]
    pub fn seeded(
        title: impl Into<String>,
        folder: impl Into<String>,
        pinned: bool,
        messages: Vec<Message>,
    ) -> Self {
        let mut conversation = Self {
            title: title.into(),
            folder: folder.into(),
            pinned,
            ..Self::new_chat()
        };
        if let Some(latest) = messages.iter().map(|m| m.created_at).max() {
            conversation.updated_at = latest;
        }
        conversation.messages = messages;
        conversation.sync_derived();
        conversation
    }

    /// Messages in conversation order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// First characters of the latest message.
    #[must_use]
    pub fn preview(&self) -> &str {
        &self.preview
    }

    /// Denormalized message count.
    #[must_use]
    pub const fn message_count(&self) -> usize {
        self.message_count
    }

    /// Look up a message by id.
    #[must_use]
    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Full history in router input shape.
    #[must_use]
    pub fn history(&self) -> Vec<ChatMessage> {
        self.messages.iter().map(Message::to_chat_message).collect()
    }

    /// Append a message, refreshing preview, count and update time.
    pub fn push(&mut self, message: Message) -> MessageId {
        let id = message.id;
        self.updated_at = message.created_at;
        self.messages.push(message);
        self.sync_derived();
        id
    }

    /// Replace a message's content in place and stamp its edit time.
    ///
    /// Returns `false` if no message has this id.
    pub fn edit(&mut self, id: MessageId, content: impl Into<String>) -> bool {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == id) else {
            return false;
        };
        message.content = content.into();
        message.edited_at = Some(Utc::now());
        self.sync_derived();
        true
    }

    /// Case-insensitive substring match over title and preview.
    ///
    /// `needle` must already be lowercase.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.preview.to_lowercase().contains(needle)
    }

    fn sync_derived(&mut self) {
        self.message_count = self.messages.len();
        if let Some(last) = self.messages.last() {
            self.preview = preview_of(&last.content);
        }
    }
}

/// A named bucket conversations can be filed under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Identifier.
    pub id: FolderId,
    /// Name, unique case-insensitively.
    pub name: String,
}

impl Folder {
    /// Create a folder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: FolderId::new(),
            name: name.into(),
        }
    }
}

/// Reusable text inserted into a draft on demand.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Identifier.
    pub id: TemplateId,
    /// Short label shown in the sidebar.
    pub label: String,
    /// Text inserted verbatim.
    pub content: String,
}

impl Template {
    /// Create a template.
    #[must_use]
    pub fn new(label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: TemplateId::new(),
            label: label.into(),
            content: content.into(),
        }
    }
}
