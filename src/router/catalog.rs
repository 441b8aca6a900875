//! Static model catalog and the logical-model dispatch table.

use std::fmt;

use serde::Serialize;

/// Logical model used when none (or an unknown one) is requested.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Upstream vendor behind a logical model.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// OpenAI.
    OpenAi,
    /// xAI (OpenAI-compatible API).
    Xai,
    /// DeepSeek (OpenAI-compatible API).
    DeepSeek,
}

impl Provider {
    /// Stable string representation (for logs).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Xai => "xai",
            Self::DeepSeek => "deepseek",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a logical model identifier leads.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ModelRoute {
    /// Forward to `provider` using the concrete `model` name.
    Upstream {
        /// Credentialed upstream.
        provider: Provider,
        /// Concrete model name the upstream expects.
        model: &'static str,
    },
    /// Recognised but not wired to any provider.
    Unimplemented {
        /// Message returned to the caller.
        message: &'static str,
    },
}

/// A selectable model as shown in the model picker.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct ModelInfo {
    /// Logical model identifier.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
}

/// Models offered to the user, in picker order.
pub const MODEL_CATALOG: &[ModelInfo] = &[
    ModelInfo { id: "gpt-4o", name: "GPT-4" },
    ModelInfo { id: "claude-sonnet-4", name: "Claude Sonnet 4" },
    ModelInfo { id: "gemini-pro", name: "Gemini" },
    ModelInfo { id: "grok-2", name: "Grok" },
    ModelInfo { id: "deepseek-chat", name: "Deepseek" },
];

/// Display name for a logical model, falling back to the first catalog entry.
#[must_use]
pub fn display_name(model_id: &str) -> &'static str {
    MODEL_CATALOG
        .iter()
        .find(|m| m.id == model_id)
        .unwrap_or(&MODEL_CATALOG[0])
        .name
}

/// Look up a logical model identifier. `None` means unrecognised.
#[must_use]
pub fn lookup(model_id: &str) -> Option<ModelRoute> {
    let route = match model_id {
        "gpt-4o" => ModelRoute::Upstream {
            provider: Provider::OpenAi,
            model: "gpt-4o",
        },
        "grok-2" => ModelRoute::Upstream {
            provider: Provider::Xai,
            model: "grok-2-1212",
        },
        "deepseek-chat" => ModelRoute::Upstream {
            provider: Provider::DeepSeek,
            model: "deepseek-chat",
        },
        "claude-sonnet-4" => ModelRoute::Unimplemented {
            message: "Claude integration coming soon. Please use another model.",
        },
        "gemini-pro" => ModelRoute::Unimplemented {
            message: "Gemini integration coming soon. Please use another model.",
        },
        _ => return None,
    };
    Some(route)
}
