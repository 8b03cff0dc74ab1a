//! Session listing and removal

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/sessions - Live sessions, ordered by id
pub async fn list_sessions_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let sessions = state.sessions.list_sessions().await;
    Json(json!({
        "max_sessions": state.sessions.max_sessions(),
        "count": sessions.len(),
        "sessions": sessions,
    }))
}

/// DELETE /api/sessions/:id - Drop a session and everything it holds
pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !state.sessions.delete(&id).await {
        return Err(ng_core::Error::not_found(format!("session '{}'", id)).into());
    }
    tracing::info!(session = %id, "Session deleted");
    Ok(Json(json!({ "ok": true, "session_id": id })))
}
