//! File upload handler

use axum::{
    extract::{Multipart, Query, State},
    http::HeaderMap,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use ng_core::Error;

use super::header_session;
use crate::error::ApiError;
use crate::state::AppState;

pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// POST /upload_file - Store a CSV from the multipart field `file`.
///
/// Returns `{ok: true, file}`; an oversized file is a 413 with
/// `{ok: false, error}`.
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or("upload.csv").to_string();
        let data = field.bytes().await.map_err(multipart_error)?;
        upload = Some((name, data.to_vec()));
        break;
    }
    let (name, data) = upload
        .ok_or_else(|| Error::validation(format!("Missing multipart field '{}'", UPLOAD_FIELD)))?;

    let session_id = query.session_id.or_else(|| header_session(&headers));
    let session = state.session(session_id.as_deref()).await;
    let mut session = session.lock().await;
    let meta = session.workspace.tables.add_file(&name, &data).map_err(|e| {
        warn!("Upload of {} rejected: {}", name, e);
        e
    })?;
    session.touch();
    info!(session = %session.id, "Uploaded {} ({} bytes)", name, data.len());

    Ok(Json(json!({"ok": true, "file": meta})))
}

/// Body-limit overflows surface as multipart errors; report them as capacity
fn multipart_error(err: axum::extract::multipart::MultipartError) -> Error {
    let message = err.body_text();
    if err.status() == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
        Error::capacity(format!("Upload too large: {}", message))
    } else {
        Error::validation(format!("Invalid multipart body: {}", message))
    }
}
