//! HTTP server implementation using axum.

use crate::error::ServerError;
use crate::server::AppState;
use axum::Router;
use axum::routing::get;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod handlers;
pub mod response;

/// Create HTTP router with all endpoints.
///
/// `/status` and `/reload` take precedence over archive paths of the same
/// name.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/status", get(handlers::handle_status))
        .route("/reload", get(handlers::handle_reload))
        .route("/", get(handlers::serve_root))
        .route("/{*path}", get(handlers::serve_file))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start HTTP server, running until `shutdown` resolves.
///
/// # Errors
///
/// Returns `ServerError` if the server fails to bind or encounters a runtime error.
pub async fn start_server<F>(
    bind_addr: SocketAddr,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|source| ServerError::HttpBindFailed {
            addr: bind_addr,
            source,
        })?;

    tracing::info!("HTTP server listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::Shutdown(format!("HTTP server error: {e}")))?;

    Ok(())
}
