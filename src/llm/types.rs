//! Chat wire types shared by the router, the server and the conversation store.

use serde::{Deserialize, Serialize};

/// Author of a chat turn.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message typed by the end user.
    User,
    /// Message produced by a provider (or a synthesized error turn).
    Assistant,
}

/// One `{role, content}` entry of a completion request.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author of the turn.
    pub role: Role,
    /// Text of the turn.
    pub content: String,
}

impl ChatMessage {
    /// Build a turn.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[cfg(test)]
impl ChatMessage {
    /// Build a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Build an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Sampling parameters attached to every upstream completion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Sampling temperature.
    pub temperature: f32,
    /// Response length cap in tokens.
    pub max_tokens: u32,
}

impl SamplingConfig {
    /// Temperature used for every completion.
    pub const TEMPERATURE: f32 = 0.7;
    /// Token cap used for every completion.
    pub const MAX_TOKENS: u32 = 2_000;
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: Self::TEMPERATURE,
            max_tokens: Self::MAX_TOKENS,
        }
    }
}

/// A fully resolved upstream completion request.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    /// Concrete upstream model name.
    pub model: String,
    /// Full conversation history, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Sampling parameters.
    pub sampling: SamplingConfig,
}
