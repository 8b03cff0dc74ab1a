//! Router construction

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Multipart framing allowance on top of the file size cap
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the complete router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let upload_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD;

    let api_routes = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/tools", get(handlers::tools::list_tools_handler))
        .route("/sessions", get(handlers::sessions::list_sessions_handler))
        .route(
            "/sessions/:id",
            delete(handlers::sessions::delete_session_handler),
        );

    Router::new()
        .nest("/api", api_routes)
        .route("/agent/chat", post(handlers::chat::chat_handler))
        .route(
            "/upload_file",
            post(handlers::upload::upload_handler).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/tools/:name", post(handlers::tools::execute_tool_handler))
        .route("/debug/traces", get(handlers::debug::traces_handler))
        .route("/debug/timing", get(handlers::debug::timing_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
