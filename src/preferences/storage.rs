//! Key/value storage capability behind the preferences.

use std::future::Future;
use std::pin::Pin;

use dashmap::DashMap;
use thiserror::Error;

/// Boxed future type for storage operations.
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Preference persistence error.
#[derive(Debug, Error)]
pub enum PreferenceError {
    /// Database failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] tokio_rusqlite::Error),

    /// Stored value could not be encoded or decoded.
    #[error("invalid stored value: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result alias for preference operations.
pub type PreferenceResult<T> = Result<T, PreferenceError>;

/// String key/value store preferences are persisted in.
pub trait PreferenceStorage: Send + Sync {
    /// Read a raw value.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn get(&self, key: &str) -> StorageFuture<'_, PreferenceResult<Option<String>>>;

    /// Write a raw value, replacing any previous one.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn set(&self, key: &str, value: &str) -> StorageFuture<'_, PreferenceResult<()>>;
}

/// Process-local storage. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: DashMap<String, String>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStorage for MemoryStorage {
    fn get(&self, key: &str) -> StorageFuture<'_, PreferenceResult<Option<String>>> {
        let value = self.values.get(key).map(|v| v.value().clone());
        Box::pin(async move { Ok(value) })
    }

    fn set(&self, key: &str, value: &str) -> StorageFuture<'_, PreferenceResult<()>> {
        self.values.insert(key.to_string(), value.to_string());
        Box::pin(async { Ok(()) })
    }
}
