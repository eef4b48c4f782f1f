/// HTTP API for the identity service
///
/// - `POST /api/auth/login`
/// - `POST /api/auth/register`
/// - `GET /health` (readiness probe target)
mod auth;

use crate::services::AuthService;
use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the HTTP router with all public endpoints
pub fn build_router(auth: Arc<AuthService>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/register", post(auth::register))
        .layer(TraceLayer::new_for_http())
        .with_state(auth)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Serve the API until `shutdown` resolves
pub async fn start_http_server<S>(
    auth: Arc<AuthService>,
    host: &str,
    port: u16,
    shutdown: S,
) -> anyhow::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let app = build_router(auth);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Starting HTTP API server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    Ok(())
}
