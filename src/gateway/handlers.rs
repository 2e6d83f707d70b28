use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};

use super::{AppState, ChatReply, ChatRequest};
use crate::query::chat_response;
use crate::retrieval::DocumentId;

/// GET /health: provider names and per-slot usage counts, never credentials
pub(super) async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let router = state.service.handler().router();
    let body = serde_json::json!({
        "status": "ok",
        "primary": router.primary_name(),
        "fallback": router.fallback_name(),
        "credentials": router.credential_usage(),
        "cached_answers": state.service.handler().cache().len(),
    });
    Json(body)
}

/// POST /api/chat: one chat turn against the requested or default document
pub(super) async fn handle_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, axum::extract::rejection::JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match body {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("Chat JSON parse error: {e}");
            let err = serde_json::json!({
                "error": "Invalid JSON body. Expected: {\"message\": \"...\", \"history\": [...]}"
            });
            return (StatusCode::BAD_REQUEST, Json(err)).into_response();
        }
    };

    let document = match request.document.as_deref() {
        Some(raw) => match DocumentId::new(raw) {
            Ok(id) => Some(id),
            Err(e) => {
                let err = serde_json::json!({ "error": e.to_string() });
                return (StatusCode::BAD_REQUEST, Json(err)).into_response();
            }
        },
        None => state.service.default_document(),
    };

    let (input, history) = chat_response(
        state.service.handler(),
        &request.message,
        request.history,
        document.as_ref(),
    )
    .await;

    (StatusCode::OK, Json(ChatReply { input, history })).into_response()
}

/// POST /api/documents/{id}/invalidate: drop cached answers for a document
pub(super) async fn handle_invalidate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match DocumentId::new(&id) {
        Ok(document) => {
            let invalidated = state.service.invalidate(&document);
            tracing::info!(document = %document, invalidated, "Cache invalidated via API");
            let body = serde_json::json!({
                "document": document,
                "invalidated": invalidated,
            });
            (StatusCode::OK, Json(body))
        }
        Err(e) => {
            let err = serde_json::json!({ "error": e.to_string() });
            (StatusCode::BAD_REQUEST, Json(err))
        }
    }
}
