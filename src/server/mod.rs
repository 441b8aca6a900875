//! HTTP server for the assistant API.
//!
//! Provides:
//! - `POST /api/chat`: proxy a message list to the selected provider
//! - `GET /api/models`: selectable models
//! - `GET`/`PUT /api/preferences`: UI preferences
//! - `GET /health`: liveness
//! - static frontend assets for every other path

pub mod routes;
pub mod state;

pub use routes::{create_router, ApiError, ChatRequest, ChatResponse, ErrorBody};
pub use state::AppState;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Boxed error returned by the server entrypoints.
pub type ServerError = Box<dyn std::error::Error + Send + Sync>;

/// Full application: routes plus CORS and request tracing.
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serve on the configured port until `shutdown_signal` completes.
///
/// # Errors
/// Returns an error if the listener cannot be bound or serving fails.
pub async fn serve<F>(state: Arc<AppState>, shutdown_signal: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Assistant server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
