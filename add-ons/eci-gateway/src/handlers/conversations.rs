//! Conversation history endpoints backed by the sled conversation log.

use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(serde::Deserialize)]
pub(crate) struct HistoryQuery {
    #[serde(default)]
    limit: Option<usize>,
}

/// GET /api/v1/conversations
pub(crate) async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let sessions = state.conversations.sessions().map_err(|e| {
        tracing::error!(target: "eci::conversation", "Listing sessions failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(serde_json::json!({ "sessions": sessions })))
}

fn read_failed(e: impl std::fmt::Display) -> StatusCode {
    tracing::error!(target: "eci::conversation", "Reading history failed: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}

/// GET /api/v1/conversations/:session_id?limit=N – 404 only for sessions with no exchanges.
pub(crate) async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    if !state.conversations.contains_session(&session_id).map_err(read_failed)? {
        return Err(StatusCode::NOT_FOUND);
    }
    let limit = q.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let exchanges = state.conversations.history(&session_id, limit).map_err(read_failed)?;
    Ok(Json(serde_json::json!({
        "sessionId": session_id,
        "exchanges": exchanges,
    })))
}

/// DELETE /api/v1/conversations/:session_id
pub(crate) async fn clear_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let removed = state.conversations.clear(&session_id).map_err(|e| {
        tracing::error!(target: "eci::conversation", "Clearing history failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(serde_json::json!({
        "sessionId": session_id,
        "removed": removed,
    })))
}
