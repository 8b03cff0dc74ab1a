//! HTTP Request Handlers

pub mod chat;
pub mod debug;
pub mod health;
pub mod sessions;
pub mod tools;
pub mod upload;

use axum::http::HeaderMap;

pub const SESSION_HEADER: &str = "x-session-id";

/// Session id from the `x-session-id` header, if present and valid UTF-8
pub fn header_session(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
