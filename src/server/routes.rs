//! HTTP route handlers for the assistant API.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::services::ServeDir;

use crate::llm::ChatMessage;
use crate::preferences::Preferences;
use crate::router::{ModelInfo, RouterError, MODEL_CATALOG};

use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let assets = ServeDir::new(&state.config.static_dir);
    Router::new()
        .route("/health", get(health_check))
        .route("/api/models", get(list_models))
        .route("/api/chat", post(chat_completion))
        .route("/api/preferences", get(get_preferences).put(put_preferences))
        .fallback_service(assets)
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "ai-assistant",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Selectable models, in picker order.
async fn list_models() -> Json<&'static [ModelInfo]> {
    Json(MODEL_CATALOG)
}

/// Current UI preferences.
async fn get_preferences(State(state): State<Arc<AppState>>) -> Json<Preferences> {
    Json(state.preferences.snapshot().await)
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorBody { error, details: None })).into_response()
}

/// Replace and persist the UI preferences.
///
/// A body that does not decode as [`Preferences`] is a 400 with a JSON error.
async fn put_preferences(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let preferences: Preferences = match serde_json::from_slice(&body) {
        Ok(preferences) => preferences,
        Err(e) => {
            tracing::warn!("Rejected preferences: {e}");
            return error_response(StatusCode::BAD_REQUEST, format!("Invalid preferences: {e}"));
        }
    };

    match state.preferences.replace(preferences).await {
        Ok(()) => Json(state.preferences.snapshot().await).into_response(),
        Err(e) => {
            tracing::error!("Failed to save preferences: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Chat completion request.
#[derive(Debug, Deserialize, Serialize)]
pub struct ChatRequest {
    /// Conversation history, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Logical model identifier.
    pub model: String,
}

/// Chat completion response.
#[derive(Debug, Deserialize, Serialize)]
pub struct ChatResponse {
    /// The assistant's response.
    pub message: String,
    /// Concrete model used.
    pub model: String,
}

/// Error body for 4xx/5xx answers.
#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorBody {
    /// Human-readable error.
    pub error: String,
    /// Provider payload, present on 500 answers only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Option<Value>>,
}

/// Router errors rendered as JSON responses.
#[derive(Debug)]
pub struct ApiError(pub RouterError);

impl From<RouterError> for ApiError {
    fn from(err: RouterError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            RouterError::Validation(error) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error,
                    details: None,
                },
            ),
            RouterError::Unimplemented(error) => (
                StatusCode::NOT_IMPLEMENTED,
                ErrorBody {
                    error,
                    details: None,
                },
            ),
            RouterError::Upstream { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: message,
                    details: Some(details),
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// Parse and validate the raw request body.
///
/// A body that is not JSON is an upstream-class failure (500); a missing,
/// non-array or empty `messages` field is a validation failure (400).
fn parse_chat_request(body: &[u8]) -> Result<ChatRequest, RouterError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| RouterError::upstream(e.to_string()))?;

    let raw_messages = match value.get("messages").and_then(Value::as_array) {
        Some(items) if !items.is_empty() => items,
        _ => return Err(RouterError::messages_required()),
    };

    let messages = raw_messages
        .iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<ChatMessage>(item.clone())
                .map_err(|e| RouterError::Validation(format!("Invalid message at index {index}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    // An absent model takes the same path as an unknown one.
    let model = value
        .get("model")
        .and_then(Value::as_str)
        .map_or_else(String::new, str::to_string);

    Ok(ChatRequest { messages, model })
}

/// Handle chat completion requests.
async fn chat_completion(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    let request = parse_chat_request(&body).inspect_err(|e| {
        tracing::warn!("Rejected chat request: {e}");
    })?;

    tracing::debug!(
        model = %request.model,
        messages = request.messages.len(),
        "Chat request"
    );

    let requested = if request.model.is_empty() {
        "<missing>"
    } else {
        request.model.as_str()
    };

    let outcome = state.router.route(&request.messages, requested).await?;

    Ok(Json(ChatResponse {
        message: outcome.text,
        model: outcome.resolved_model,
    }))
}
