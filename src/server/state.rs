//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::config::AssistantConfig;
use crate::llm::UpstreamResult;
use crate::preferences::{MemoryStorage, PreferencesHandle};
use crate::router::ProviderRouter;

/// Shared application state.
pub struct AppState {
    /// Logical-model dispatch table.
    pub router: ProviderRouter,
    /// UI preferences.
    pub preferences: PreferencesHandle,
    /// Configuration the server was started with.
    pub config: AssistantConfig,
}

impl AppState {
    /// Create the application state from configuration and loaded preferences.
    ///
    /// # Errors
    /// Returns an error if an upstream HTTP client cannot be built.
    pub fn new(config: AssistantConfig, preferences: PreferencesHandle) -> UpstreamResult<Arc<Self>> {
        let router = ProviderRouter::from_config(&config)?;
        Ok(Arc::new(Self {
            router,
            preferences,
            config,
        }))
    }

    /// Create the application state around an existing router, with
    /// in-memory default preferences.
    #[must_use]
    pub fn with_router(router: ProviderRouter, config: AssistantConfig) -> Arc<Self> {
        Arc::new(Self {
            router,
            preferences: PreferencesHandle::with_defaults(Arc::new(MemoryStorage::new())),
            config,
        })
    }
}
