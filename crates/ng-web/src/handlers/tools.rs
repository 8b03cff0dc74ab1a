//! Tool API Handlers

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use ng_core::Error;
use ng_tools::{catalog, is_error_result};

use super::header_session;
use crate::error::{status_for_kind, ApiError};
use crate::state::AppState;

/// GET /api/tools - Catalogue with schemas and mutating flags
pub async fn list_tools_handler() -> Json<Value> {
    let tools = catalog();
    Json(json!({
        "count": tools.len(),
        "tools": tools,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ToolQuery {
    /// `1` or `true` sets `mask: true` in the arguments
    #[serde(default)]
    pub mask: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ToolQuery {
    fn mask_requested(&self) -> bool {
        matches!(self.mask.as_deref(), Some("1") | Some("true"))
    }
}

/// POST /tools/:name - Execute a tool directly against a session.
///
/// The body is optional; an empty body means `{}`. Error results keep their
/// `{error, kind}` shape and get a matching status code.
pub async fn execute_tool_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<ToolQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut args: Value = if body.iter().all(u8::is_ascii_whitespace) {
        json!({})
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| Error::validation(format!("Invalid JSON body: {}", e)))?
    };
    if query.mask_requested() {
        if let Value::Object(map) = &mut args {
            map.insert("mask".to_string(), Value::Bool(true));
        }
    }

    let session_id = query.session_id.clone().or_else(|| header_session(&headers));
    info!(tool = %name, session = ?session_id, "Direct tool execution");

    let session = state.session(session_id.as_deref()).await;
    let mut session = session.lock().await;
    let result = state
        .orchestrator
        .dispatcher()
        .execute(&mut session.workspace, &name, args)
        .await;
    session.touch();

    let status = if is_error_result(&result) {
        status_for_kind(result["kind"].as_str().unwrap_or("internal"))
    } else {
        StatusCode::OK
    };
    Ok((status, Json(result)))
}
