//! Provider router: maps a logical model identifier onto a credentialed
//! upstream client and a concrete model name, then forwards the message list.
//!
//! The router holds no per-request state. Each [`ProviderRouter::route`] call
//! validates, resolves, and issues at most one upstream request.

pub mod catalog;
pub mod error;

pub use catalog::{display_name, ModelInfo, ModelRoute, Provider, DEFAULT_MODEL, MODEL_CATALOG};
pub use error::{RouterError, RouterResult, MESSAGES_REQUIRED};

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::{AssistantConfig, ProviderConfig, UnknownModelPolicy};
use crate::config::env;
use crate::llm::{
    ChatMessage, CompletionClient, CompletionRequest, OpenAiCompatClient, SamplingConfig,
    UpstreamResult,
};

/// Successful routing result.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RouteOutcome {
    /// Assistant text returned by the upstream.
    pub text: String,
    /// Concrete model name actually used.
    pub resolved_model: String,
}

/// A resolved route for a logical model identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Resolution {
    /// Upstream provider.
    pub provider: Provider,
    /// Concrete model name.
    pub model: &'static str,
    /// Whether the requested identifier was unknown and remapped.
    pub fallback: bool,
}

/// Dispatch table from logical models to upstream clients.
pub struct ProviderRouter {
    clients: HashMap<Provider, Arc<dyn CompletionClient>>,
    sampling: SamplingConfig,
    unknown_model: UnknownModelPolicy,
}

impl ProviderRouter {
    /// Create a router with no upstream clients registered.
    #[must_use]
    pub fn new(sampling: SamplingConfig, unknown_model: UnknownModelPolicy) -> Self {
        Self {
            clients: HashMap::new(),
            sampling,
            unknown_model,
        }
    }

    /// Build the router with one OpenAI-compatible client per configured provider.
    ///
    /// # Errors
    /// Returns an error if an HTTP client cannot be built.
    pub fn from_config(config: &AssistantConfig) -> UpstreamResult<Self> {
        let timeout = config.request_timeout;
        let build = |name: &str, cfg: &ProviderConfig, key_env: &'static str| {
            OpenAiCompatClient::new(name, cfg.base_url.clone(), cfg.api_key.clone(), key_env, timeout)
        };

        let providers = &config.providers;
        let router = Self::new(config.sampling, config.unknown_model)
            .with_client(
                Provider::OpenAi,
                Arc::new(build("openai", &providers.openai, env::OPENAI_API_KEY)?),
            )
            .with_client(
                Provider::Xai,
                Arc::new(build("xai", &providers.xai, env::XAI_API_KEY)?),
            )
            .with_client(
                Provider::DeepSeek,
                Arc::new(build("deepseek", &providers.deepseek, env::DEEPSEEK_API_KEY)?),
            );

        Ok(router)
    }

    /// Register (or replace) the client used for `provider`.
    #[must_use]
    pub fn with_client(mut self, provider: Provider, client: Arc<dyn CompletionClient>) -> Self {
        self.clients.insert(provider, client);
        self
    }

    /// Resolve a logical model identifier without calling anything.
    ///
    /// # Errors
    /// Returns `Unimplemented` for recognised-but-unwired models and
    /// `Validation` for unknown models under [`UnknownModelPolicy::Reject`].
    pub fn resolve(&self, model_id: &str) -> RouterResult<Resolution> {
        match catalog::lookup(model_id) {
            Some(ModelRoute::Upstream { provider, model }) => Ok(Resolution {
                provider,
                model,
                fallback: false,
            }),
            Some(ModelRoute::Unimplemented { message }) => {
                Err(RouterError::Unimplemented(message.to_string()))
            }
            None => match self.unknown_model {
                UnknownModelPolicy::Reject => {
                    Err(RouterError::Validation(format!("Unknown model: {model_id}")))
                }
                UnknownModelPolicy::Fallback => {
                    tracing::warn!(
                        requested = %model_id,
                        fallback = DEFAULT_MODEL,
                        "Unknown model identifier, falling back to default"
                    );
                    let Some(ModelRoute::Upstream { provider, model }) =
                        catalog::lookup(DEFAULT_MODEL)
                    else {
                        return Err(RouterError::upstream("default model is not routable"));
                    };
                    Ok(Resolution {
                        provider,
                        model,
                        fallback: true,
                    })
                }
            },
        }
    }

    /// Forward `messages` to the upstream selected by `model_id`.
    ///
    /// # Errors
    /// - `Validation` if `messages` is empty (no upstream call is made).
    /// - `Unimplemented` for recognised-but-unwired models (no upstream call).
    /// - `Upstream` for any failure of the single upstream call.
    pub async fn route(&self, messages: &[ChatMessage], model_id: &str) -> RouterResult<RouteOutcome> {
        if messages.is_empty() {
            return Err(RouterError::messages_required());
        }

        let resolution = self.resolve(model_id)?;
        let client = self.clients.get(&resolution.provider).ok_or_else(|| {
            RouterError::upstream(format!(
                "no client configured for provider {}",
                resolution.provider
            ))
        })?;

        let request = CompletionRequest {
            model: resolution.model.to_string(),
            messages: messages.to_vec(),
            sampling: self.sampling,
        };

        match client.complete(&request).await {
            Ok(text) => {
                tracing::info!(
                    provider = client.provider_name(),
                    model = resolution.model,
                    fallback = resolution.fallback,
                    "Completion succeeded"
                );
                Ok(RouteOutcome {
                    text,
                    resolved_model: resolution.model.to_string(),
                })
            }
            Err(e) => {
                tracing::error!(
                    provider = client.provider_name(),
                    model = resolution.model,
                    fallback = resolution.fallback,
                    "Completion failed: {e}"
                );
                Err(e.into())
            }
        }
    }
}
