//! Axum HTTP gateway for the chat front-end, with body limits and request
//! timeouts.

mod handlers;

use handlers::{handle_chat, handle_health, handle_invalidate};

use crate::app::DocQaService;
use crate::query::ChatMessage;
use anyhow::Result;
use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (256KB); chat history travels with each turn.
pub const MAX_BODY_SIZE: usize = 262_144;
/// Request timeout. Covers one primary attempt plus one fallback attempt.
pub const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DocQaService>,
}

/// `POST /api/chat` body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    /// Document id; defaults to the `DOC_PATH` document.
    #[serde(default)]
    pub document: Option<String>,
}

/// `POST /api/chat` response: cleared input plus updated history.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub input: String,
    pub history: Vec<ChatMessage>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/api/chat", post(handle_chat))
        .route("/api/documents/{id}/invalidate", post(handle_invalidate))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
}

/// Run the HTTP gateway.
pub async fn run_gateway(host: &str, port: u16, service: Arc<DocQaService>) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    run_gateway_with_listener(host, listener, service).await
}

/// Run the HTTP gateway from a pre-bound listener.
pub async fn run_gateway_with_listener(
    host: &str,
    listener: tokio::net::TcpListener,
    service: Arc<DocQaService>,
) -> Result<()> {
    let actual_port = listener.local_addr()?.port();

    println!("◆ docqa listening on http://{host}:{actual_port}");
    println!("  POST /api/chat");
    println!("  POST /api/documents/{{id}}/invalidate");
    println!("  GET  /health");
    match service.default_document() {
        Some(doc) => println!("  Active document: {doc}"),
        None => println!("  ! No DOC_PATH set; requests must name a document"),
    }
    println!("  Press Ctrl+C to stop.\n");

    let app = build_router(AppState { service });
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
