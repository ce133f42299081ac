//! HTTP request handlers.

use crate::http::response::Requested;
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use bigpack_format::{Fingerprint, path};
use bigpack_storage::StorageError;
use std::sync::Arc;

/// Handle GET / (the archive's root `index.html`).
pub async fn serve_root(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    serve(&state, "", &headers).await
}

/// Handle GET /{*path}.
///
/// The path arrives percent-decoded and without its leading slash.
pub async fn serve_file(
    Path(request_path): Path<String>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    serve(&state, &request_path, &headers).await
}

async fn serve(state: &Arc<AppState>, request_path: &str, headers: &HeaderMap) -> Response {
    state.count_request();

    let key = path::normalize(request_path);
    let fingerprint = Fingerprint::from_path(&key);
    tracing::debug!("Serving {} ({})", key, fingerprint);

    let archive = Arc::clone(state.archive());
    let result = tokio::task::spawn_blocking(move || archive.lookup_fingerprint(&fingerprint))
        .await
        .unwrap_or_else(|e| Err(StorageError::Io(std::io::Error::other(e))));

    let requested = Requested::new(&key, &fingerprint, headers);
    match result {
        Ok(result) => state.adapter().render(&requested, result),
        Err(err) => state.adapter().failure(&requested, &err),
    }
}

/// Handle GET /status.
///
/// Plain text summary of the server and the loaded index.
pub async fn handle_status(State(state): State<Arc<AppState>>) -> Response {
    let stats = state.archive().stats();

    let body = format!(
        "uptime: {}s\ngeneration: {}\nloaded: {}s ago\npages: {}\ncached pages: {}\nrequests: {}\n",
        state.uptime().as_secs(),
        stats.generation,
        stats.age.as_secs(),
        stats.pages,
        stats.cached_pages,
        state.requests(),
    );

    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; charset=utf-8",
        )],
        body,
    )
        .into_response()
}

/// Handle GET /reload.
///
/// Rebuilds the top index from disk. On failure the previous index stays
/// in service and the error is reported with a 500.
pub async fn handle_reload(State(state): State<Arc<AppState>>) -> Response {
    tracing::info!("Reload requested over HTTP");

    match state.reload().await {
        Ok(generation) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; charset=utf-8",
            )],
            format!("done\ngeneration: {generation}\n"),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Reload failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(
                    axum::http::header::CONTENT_TYPE,
                    "text/plain; charset=utf-8",
                )],
                format!("reload failed: {e}\n"),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use axum::body::to_bytes;
    use bigpack_storage::testing::ArchiveBuilder;
    use tempfile::TempDir;

    fn create_test_state() -> (TempDir, Arc<AppState>) {
        let dir = TempDir::new().unwrap();
        ArchiveBuilder::new()
            .add("index.html", b"home")
            .add("docs/index.html", b"docs home")
            .add("style.css", b"body {}")
            .write_to(dir.path())
            .unwrap();

        let config = ServerConfig::new("127.0.0.1:0".parse().unwrap(), dir.path());
        (dir, Arc::new(AppState::new(&config).unwrap()))
    }

    async fn text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_serve_root() {
        let (_dir, state) = create_test_state();
        let response = serve_root(State(state), HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "home");
    }

    #[tokio::test]
    async fn test_serve_file() {
        let (_dir, state) = create_test_state();

        let response = serve_file(
            Path("style.css".to_string()),
            State(Arc::clone(&state)),
            HeaderMap::new(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[axum::http::header::CONTENT_TYPE],
            "text/css"
        );

        let response = serve_file(
            Path("docs/".to_string()),
            State(Arc::clone(&state)),
            HeaderMap::new(),
        )
        .await;
        assert_eq!(text(response).await, "docs home");

        assert_eq!(state.requests(), 2);
    }

    #[tokio::test]
    async fn test_serve_file_not_found() {
        let (_dir, state) = create_test_state();
        let response = serve_file(
            Path("missing.png".to_string()),
            State(state),
            HeaderMap::new(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_handle_status() {
        let (_dir, state) = create_test_state();
        let response = handle_status(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = text(response).await;
        assert!(body.contains("generation: 1"));
        assert!(body.contains("pages: 1"));
        assert!(body.contains("requests: 0"));
        assert_eq!(body.lines().count(), 6);
        assert!(body.starts_with("uptime: "));
    }

    #[tokio::test]
    async fn test_handle_reload() {
        let (dir, state) = create_test_state();

        let response = handle_reload(State(Arc::clone(&state))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(text(response).await.starts_with("done"));

        std::fs::remove_file(dir.path().join("BigPack.map2")).unwrap();
        let response = handle_reload(State(Arc::clone(&state))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(state.archive().stats().generation, 2);
    }
}
