//! Error taxonomy of the provider router.

use thiserror::Error;

use crate::llm::UpstreamError;

/// Message used when the request carries no usable message list.
pub const MESSAGES_REQUIRED: &str = "Messages array is required";

/// Errors returned by [`super::ProviderRouter::route`].
#[derive(Debug, Error)]
pub enum RouterError {
    /// Bad request shape. Never reaches an upstream.
    #[error("{0}")]
    Validation(String),

    /// Model recognised but not wired to a provider.
    #[error("{0}")]
    Unimplemented(String),

    /// Upstream or routing failure after validation passed.
    #[error("{message}")]
    Upstream {
        /// Human-readable failure.
        message: String,
        /// Optional provider-supplied payload.
        details: Option<serde_json::Value>,
    },
}

impl RouterError {
    /// The "messages array is required" validation error.
    #[must_use]
    pub fn messages_required() -> Self {
        Self::Validation(MESSAGES_REQUIRED.to_string())
    }

    /// Build an upstream error without details.
    #[must_use]
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            details: None,
        }
    }
}

impl From<UpstreamError> for RouterError {
    fn from(err: UpstreamError) -> Self {
        let details = err.details();
        Self::Upstream {
            message: err.to_string(),
            details,
        }
    }
}

/// Convenience result alias for routing.
pub type RouterResult<T> = Result<T, RouterError>;
