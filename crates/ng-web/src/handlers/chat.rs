//! Chat API Handler

use axum::{extract::State, http::HeaderMap, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use ng_chat::ChatOutcome;
use ng_core::Error;
use ng_llm::ChatMessage;

use super::header_session;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    #[serde(flatten)]
    pub outcome: ChatOutcome,
}

/// POST /agent/chat - Run the agent loop on a session.
///
/// The session mutex is held for the whole request, so concurrent chats on
/// one session run one after another.
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.messages.is_empty() {
        return Err(Error::validation("messages must not be empty").into());
    }
    let session_id = request.session_id.or_else(|| header_session(&headers));
    let session = state.session(session_id.as_deref()).await;
    let mut session = session.lock().await;
    info!(
        session = %session.id,
        "Chat request: {} message(s)",
        request.messages.len()
    );

    let outcome = state.orchestrator.run(&mut session, request.messages).await;
    Ok(Json(ChatResponse {
        session_id: session.id.clone(),
        outcome,
    }))
}
