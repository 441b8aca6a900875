//! Error types for upstream provider calls.

use thiserror::Error;

/// Errors produced while talking to an upstream chat-completion endpoint.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The provider credential is not configured.
    #[error("{0} is not set")]
    MissingCredential(&'static str),

    /// HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("{status} {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Provider-supplied error message, or the canonical reason.
        message: String,
        /// Raw JSON error body, when the provider sent one.
        details: Option<serde_json::Value>,
    },

    /// The provider answered 2xx but the body did not contain a completion.
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

impl UpstreamError {
    /// Structured detail payload for callers that surface it.
    #[must_use]
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Status { details, .. } => details.clone(),
            _ => None,
        }
    }
}

/// Convenience result alias for upstream calls.
pub type UpstreamResult<T> = Result<T, UpstreamError>;
