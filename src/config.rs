//! Configuration for the assistant server.
//!
//! Values come from the process environment; everything has a default so the
//! server can start with no configuration at all. Provider credentials are
//! optional here and only checked when a request is routed to that provider.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::llm::SamplingConfig;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default upstream request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Environment variable names.
pub mod env {
    /// Listening port.
    pub const PORT: &str = "ASSISTANT_PORT";
    /// Unknown model policy (`fallback` or `reject`).
    pub const UNKNOWN_MODEL: &str = "ASSISTANT_UNKNOWN_MODEL";
    /// Upstream request timeout in seconds.
    pub const REQUEST_TIMEOUT_SECS: &str = "ASSISTANT_REQUEST_TIMEOUT_SECS";
    /// `SQLite` file holding UI preferences.
    pub const PREFERENCES_DB: &str = "ASSISTANT_PREFERENCES_DB";
    /// Directory of static frontend assets.
    pub const STATIC_DIR: &str = "ASSISTANT_STATIC_DIR";
    /// OpenAI credential.
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    /// OpenAI base URL override.
    pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
    /// xAI credential.
    pub const XAI_API_KEY: &str = "XAI_API_KEY";
    /// xAI base URL override.
    pub const XAI_BASE_URL: &str = "XAI_BASE_URL";
    /// DeepSeek credential.
    pub const DEEPSEEK_API_KEY: &str = "DEEPSEEK_API_KEY";
    /// DeepSeek base URL override.
    pub const DEEPSEEK_BASE_URL: &str = "DEEPSEEK_BASE_URL";
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held an unusable value.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Raw value found.
        value: String,
    },

    /// A provider base URL does not parse.
    #[error("invalid base URL for {provider}: {source}")]
    InvalidBaseUrl {
        /// Provider the URL belongs to.
        provider: &'static str,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },

    /// Structurally invalid configuration.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Convenience result alias for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// What the router does with a model identifier it does not know.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownModelPolicy {
    /// Route to the default model and log a warning.
    #[default]
    Fallback,
    /// Fail with a validation error.
    Reject,
}

impl fmt::Display for UnknownModelPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fallback => f.write_str("fallback"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

impl FromStr for UnknownModelPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fallback" => Ok(Self::Fallback),
            "reject" => Ok(Self::Reject),
            other => Err(other.to_string()),
        }
    }
}

/// Credential and endpoint of one upstream provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key, if configured.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
}

impl ProviderConfig {
    fn new(base_url: &str) -> Self {
        Self {
            api_key: None,
            base_url: base_url.to_string(),
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Upstream providers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// OpenAI.
    pub openai: ProviderConfig,
    /// xAI.
    pub xai: ProviderConfig,
    /// DeepSeek.
    pub deepseek: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: ProviderConfig::new("https://api.openai.com/v1"),
            xai: ProviderConfig::new("https://api.x.ai/v1"),
            deepseek: ProviderConfig::new("https://api.deepseek.com"),
        }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// HTTP listening port.
    pub port: u16,
    /// Upstream providers.
    pub providers: ProvidersConfig,
    /// Fixed sampling parameters.
    pub sampling: SamplingConfig,
    /// Unknown model handling.
    pub unknown_model: UnknownModelPolicy,
    /// Upstream request timeout.
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
    /// Preferences database path.
    pub preferences_db: PathBuf,
    /// Static frontend assets served for non-API paths.
    pub static_dir: PathBuf,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            providers: ProvidersConfig::default(),
            sampling: SamplingConfig::default(),
            unknown_model: UnknownModelPolicy::default(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            preferences_db: PathBuf::from("preferences.sqlite"),
            static_dir: PathBuf::from("static"),
        }
    }
}

impl AssistantConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns an error if a variable holds an unusable value.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns an error if a value is unusable or validation fails.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(env::PORT) {
            config.port = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: env::PORT,
                value: raw.clone(),
            })?;
        }

        if let Some(raw) = lookup(env::UNKNOWN_MODEL) {
            config.unknown_model = raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: env::UNKNOWN_MODEL,
                value: raw.clone(),
            })?;
        }

        if let Some(raw) = lookup(env::REQUEST_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: env::REQUEST_TIMEOUT_SECS,
                value: raw.clone(),
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup(env::PREFERENCES_DB) {
            config.preferences_db = PathBuf::from(raw);
        }

        if let Some(raw) = lookup(env::STATIC_DIR) {
            config.static_dir = PathBuf::from(raw);
        }

        let providers = &mut config.providers;
        providers.openai.api_key = lookup(env::OPENAI_API_KEY);
        providers.xai.api_key = lookup(env::XAI_API_KEY);
        providers.deepseek.api_key = lookup(env::DEEPSEEK_API_KEY);

        if let Some(url) = lookup(env::OPENAI_BASE_URL) {
            providers.openai.base_url = url;
        }
        if let Some(url) = lookup(env::XAI_BASE_URL) {
            providers.xai.base_url = url;
        }
        if let Some(url) = lookup(env::DEEPSEEK_BASE_URL) {
            providers.deepseek.base_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if a base URL is invalid or the timeout is zero.
    pub fn validate(&self) -> ConfigResult<()> {
        for (provider, cfg) in [
            ("openai", &self.providers.openai),
            ("xai", &self.providers.xai),
            ("deepseek", &self.providers.deepseek),
        ] {
            Url::parse(&cfg.base_url)
                .map_err(|source| ConfigError::InvalidBaseUrl { provider, source })?;
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "request_timeout must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Serde module for whole-second durations.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
