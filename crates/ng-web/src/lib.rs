//! ng-web: HTTP surface for the viewer agent
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                    ng-web Server (:8080)                        │
//! ├───────────────────────────────────────────────────────────────┤
//! │  GET  /api/health      - Health check                          │
//! │  GET  /api/tools       - Tool catalogue with schemas           │
//! │  POST /agent/chat      - Run the agent loop on a session       │
//! │  POST /upload_file     - Multipart CSV upload                  │
//! │  POST /tools/:name     - Direct tool dispatch                  │
//! │  GET  /debug/traces    - Recent execution traces               │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Requests pick their session with a `session_id` field or the
//! `x-session-id` header; both default to `"default"`.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
