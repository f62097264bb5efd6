use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State, rejection::BytesRejection},
    http::Method,
    response::IntoResponse,
    routing::{any, get},
};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::info;

use crate::state::{AppState, HEALTH_PATH};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub relay: String,
}

/// Run the HTTP server until Ctrl-C
pub async fn run(state: Arc<AppState>, bind_addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(bind_addr).await?;
    info!("Server listening on {}", bind_addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

/// Serve on an already-bound listener (no shutdown hook)
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    axum::serve(listener, create_router(state)).await
}

/// Create the router with all routes
///
/// The chat route accepts every method so that non-POST requests get the
/// relay's JSON 405 instead of axum's empty one. Its body limit comes from
/// settings; oversized bodies also get a JSON reply.
pub fn create_router(state: Arc<AppState>) -> Router {
    let chat_path = state.chat_path.clone();
    let chat_route = any(chat_handler).layer(DefaultBodyLimit::max(state.max_body_bytes));

    Router::new()
        .route(HEALTH_PATH, get(health_handler))
        .route(&chat_path, chat_route)
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        relay: state.relay_mode().to_string(),
    })
}

/// Chat handler - relays to upstream
async fn chat_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> impl IntoResponse {
    match body {
        Ok(body) => state.proxy.handle(&method, &body).await,
        Err(rejection) => state.proxy.handle_unreadable(&method, rejection),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
