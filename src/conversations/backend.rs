//! Backends the conversation store sends requests through.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::llm::ChatMessage;
use crate::router::{ProviderRouter, RouteOutcome, RouterError, RouterResult};
use crate::server::{ChatRequest, ChatResponse, ErrorBody};

/// Fallback error text when the server answers without an `error` field.
const GENERIC_FAILURE: &str = "Failed to get response";

/// Anything that can answer a message list for a logical model.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Run one completion for `messages` using `model`.
    async fn chat(&self, messages: Vec<ChatMessage>, model: &str) -> RouterResult<RouteOutcome>;
}

#[async_trait]
impl ChatBackend for ProviderRouter {
    async fn chat(&self, messages: Vec<ChatMessage>, model: &str) -> RouterResult<RouteOutcome> {
        self.route(&messages, model).await
    }
}

/// Backend that calls a running server's `POST /api/chat`.
pub struct HttpChatBackend {
    client: Client,
    endpoint: String,
}

impl HttpChatBackend {
    /// Create a backend for the server at `base_url` (e.g. `http://127.0.0.1:3000`).
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/chat", base_url.trim_end_matches('/')),
        })
    }
}

/// Map a non-success answer of `/api/chat` back onto the router taxonomy.
fn error_from_response(status: StatusCode, body: &[u8]) -> RouterError {
    let parsed: Option<ErrorBody> = serde_json::from_slice(body).ok();
    let message = parsed
        .as_ref()
        .map(|b| b.error.clone())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE.to_string());

    match status {
        StatusCode::BAD_REQUEST => RouterError::Validation(message),
        StatusCode::NOT_IMPLEMENTED => RouterError::Unimplemented(message),
        _ => RouterError::Upstream {
            message,
            details: parsed.and_then(|b| b.details.flatten()),
        },
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn chat(&self, messages: Vec<ChatMessage>, model: &str) -> RouterResult<RouteOutcome> {
        let request = ChatRequest {
            messages,
            model: model.to_string(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| RouterError::upstream(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| RouterError::upstream(e.to_string()))?;

        if !status.is_success() {
            return Err(error_from_response(status, &body));
        }

        let reply: ChatResponse = serde_json::from_slice(&body)
            .map_err(|e| RouterError::upstream(e.to_string()))?;

        Ok(RouteOutcome {
            text: reply.message,
            resolved_model: reply.model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnknownModelPolicy;
    use crate::router::testing::fixture;

    #[tokio::test]
    async fn test_router_backend_routes_in_process() {
        let (router, fakes) = fixture(UnknownModelPolicy::Fallback);
        let out = router
            .chat(vec![ChatMessage::user("hi")], "deepseek-chat")
            .await
            .ok();

        assert_eq!(out.map(|o| o.text).as_deref(), Some("from deepseek"));
        assert_eq!(fakes.deepseek.calls().len(), 1);
    }

    #[test]
    fn test_error_mapping_by_status() {
        let body = br#"{"error":"Messages array is required"}"#;
        assert!(matches!(
            error_from_response(StatusCode::BAD_REQUEST, body),
            RouterError::Validation(m) if m == "Messages array is required"
        ));

        let body = br#"{"error":"Gemini integration coming soon. Please use another model."}"#;
        assert!(matches!(
            error_from_response(StatusCode::NOT_IMPLEMENTED, body),
            RouterError::Unimplemented(_)
        ));

        let body = br#"{"error":"401 bad key","details":{"code":"invalid_api_key"}}"#;
        match error_from_response(StatusCode::INTERNAL_SERVER_ERROR, body) {
            RouterError::Upstream { message, details } => {
                assert_eq!(message, "401 bad key");
                assert_eq!(details.unwrap_or_default()["code"], "invalid_api_key");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_error_without_body_uses_generic_message() {
        let err = error_from_response(StatusCode::BAD_GATEWAY, b"");
        assert_eq!(err.to_string(), "Failed to get response");
    }

    #[tokio::test]
    async fn test_http_backend_against_running_server() {
        use crate::config::AssistantConfig;
        use crate::server::{build_app, AppState};

        let (router, _) = fixture(UnknownModelPolicy::Fallback);
        let app = build_app(AppState::with_router(router, AssistantConfig::default()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        let backend = HttpChatBackend::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap();

        let out = backend.chat(vec![ChatMessage::user("hi")], "gpt-4o").await.unwrap();
        assert_eq!(out.text, "Hello!");
        assert_eq!(out.resolved_model, "gpt-4o");

        let err = backend.chat(vec![ChatMessage::user("hi")], "gemini-pro").await.err();
        assert!(matches!(err, Some(RouterError::Unimplemented(_))));

        let err = backend.chat(Vec::new(), "gpt-4o").await.err();
        assert!(matches!(err, Some(RouterError::Validation(m)) if m == "Messages array is required"));
    }

    #[test]
    fn test_endpoint_from_base_url() {
        let backend = HttpChatBackend::new("http://127.0.0.1:3000/", Duration::from_secs(1));
        assert!(backend.is_ok_and(|b| b.endpoint == "http://127.0.0.1:3000/api/chat"));
    }
}
