//! Process startup for the assistant server.

use std::process::ExitCode;
use std::sync::Arc;

use crate::config::AssistantConfig;
use crate::preferences::{
    MemoryStorage, PreferenceStorage, PreferencesHandle, SqlitePreferenceStorage,
};
use crate::server::{self, AppState};

/// Run the server until Ctrl-C.
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting AI assistant v{}", env!("CARGO_PKG_VERSION"));

    let config = match AssistantConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(serve(config)) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

async fn serve(config: AssistantConfig) -> Result<(), server::ServerError> {
    let preferences = load_preferences(&config).await;
    let state = AppState::new(config, preferences)?;
    server::serve(state, shutdown_signal()).await
}

/// Open the preferences database, falling back to memory if it cannot be opened.
async fn load_preferences(config: &AssistantConfig) -> PreferencesHandle {
    let storage: Arc<dyn PreferenceStorage> =
        match SqlitePreferenceStorage::open(&config.preferences_db).await {
            Ok(storage) => {
                tracing::info!("Preferences stored in {}", config.preferences_db.display());
                Arc::new(storage)
            }
            Err(e) => {
                tracing::warn!("Preferences will not persist: {e}");
                Arc::new(MemoryStorage::new())
            }
        };
    PreferencesHandle::load(storage).await
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await;
}

/// Resolve once `signal` fires. If the signal cannot be listened for, never
/// resolve, so the server keeps running instead of shutting down at once.
async fn wait_for_shutdown(signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(e) = signal.await {
        tracing::error!("Failed to listen for Ctrl-C, serving until killed: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_shutdown_follows_signal() {
        let waited =
            tokio::time::timeout(Duration::from_secs(1), wait_for_shutdown(async { Ok::<(), io::Error>(()) })).await;
        assert!(waited.is_ok());
    }

    #[tokio::test]
    async fn test_signal_failure_keeps_serving() {
        let failing = async { Err::<(), _>(io::Error::other("no signal handler")) };
        let waited = tokio::time::timeout(Duration::from_millis(50), wait_for_shutdown(failing)).await;
        assert!(waited.is_err());
    }
}
