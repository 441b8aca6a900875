//! Async client for OpenAI-compatible `chat/completions` endpoints.
//!
//! OpenAI, xAI and DeepSeek all expose the same request/response shape, so a
//! single client type parameterised by base URL and credential covers all three.
//!
//! Behaviour:
//! - One `POST {base_url}/chat/completions` per call, `stream: false`.
//! - No retries; the only timeout is the one configured on the HTTP client.
//! - A missing credential is reported at call time, not at construction.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::{UpstreamError, UpstreamResult};
use super::types::{ChatMessage, CompletionRequest};

/// Connect timeout for upstream providers.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Something that can turn a resolved request into completion text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Human-readable provider name for logs.
    fn provider_name(&self) -> &str;

    /// Issue exactly one completion request.
    async fn complete(&self, request: &CompletionRequest) -> UpstreamResult<String>;
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Credentialed client for one OpenAI-compatible provider.
pub struct OpenAiCompatClient {
    client: Client,
    name: String,
    base_url: String,
    api_key: Option<String>,
    api_key_env: &'static str,
}

impl OpenAiCompatClient {
    /// Build a client for `base_url`.
    ///
    /// `api_key_env` names the variable the key came from and is only used in
    /// the error reported when `api_key` is `None`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
        api_key_env: &'static str,
        timeout: Duration,
    ) -> UpstreamResult<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_key_env,
        })
    }

    /// Endpoint that receives completion requests.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompatClient {
    fn provider_name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> UpstreamResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::MissingCredential(self.api_key_env))?;

        let body = ChatCompletionBody {
            model: &request.model,
            messages: &request.messages,
            temperature: request.sampling.temperature,
            max_tokens: request.sampling.max_tokens,
            stream: false,
        };

        tracing::debug!(
            provider = %self.name,
            model = %request.model,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(status_error(status, &bytes));
        }

        parse_completion(&bytes)
    }
}

/// Build a [`UpstreamError::Status`] from a failed response body.
fn status_error(status: reqwest::StatusCode, body: &[u8]) -> UpstreamError {
    let details: Option<serde_json::Value> = serde_json::from_slice(body).ok();
    let message = details
        .as_ref()
        .and_then(|d| d.pointer("/error/message").or_else(|| d.get("error")))
        .and_then(serde_json::Value::as_str)
        .map_or_else(
            || status.canonical_reason().unwrap_or("request failed").to_string(),
            str::to_string,
        );

    UpstreamError::Status {
        status: status.as_u16(),
        message,
        details,
    }
}

/// Extract the first choice's text from a completion body.
fn parse_completion(body: &[u8]) -> UpstreamResult<String> {
    let parsed: ChatCompletionResponse = serde_json::from_slice(body)
        .map_err(|e| UpstreamError::MalformedResponse(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| UpstreamError::MalformedResponse("no choices in response".to_string()))
}
