//! HTTP error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

/// Status code for an error kind tag (see `ng_core::Error::kind`)
pub fn status_for_kind(kind: &str) -> StatusCode {
    match kind {
        "validation" | "state_parse" => StatusCode::BAD_REQUEST,
        "not_found" => StatusCode::NOT_FOUND,
        "capacity" => StatusCode::PAYLOAD_TOO_LARGE,
        "upstream" => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Handler error rendered as `{ok: false, error, kind}`
#[derive(Debug)]
pub struct ApiError(pub ng_core::Error);

impl From<ng_core::Error> for ApiError {
    fn from(err: ng_core::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let body = json!({
            "ok": false,
            "error": self.0.to_string(),
            "kind": kind,
        });
        (status_for_kind(kind), Json(body)).into_response()
    }
}
