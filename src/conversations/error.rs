//! Error types for the conversation store.

use thiserror::Error;

use super::ids::{ConversationId, MessageId, TemplateId};

/// Conversation store error type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No conversation with this id.
    #[error("conversation not found: {0}")]
    ConversationNotFound(ConversationId),
    /// No message with this id in the conversation.
    #[error("message {message} not found in conversation {conversation}")]
    MessageNotFound {
        /// Conversation searched.
        conversation: ConversationId,
        /// Missing message.
        message: MessageId,
    },
    /// No template with this id.
    #[error("template not found: {0}")]
    TemplateNotFound(TemplateId),
    /// Folder name already taken (case-insensitive).
    #[error("Folder already exists: {0}")]
    FolderExists(String),
    /// No folder with this name.
    #[error("folder not found: {0}")]
    FolderNotFound(String),
    /// Folder name empty after trimming.
    #[error("folder name must not be empty")]
    EmptyFolderName,
}

/// Convenience result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
