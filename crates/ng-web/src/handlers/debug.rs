//! Trace inspection and timing statistics

use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use ng_chat::TimingStats;

use crate::state::AppState;

const DEFAULT_TRACE_COUNT: usize = 20;

#[derive(Debug, Default, Deserialize)]
pub struct TraceQuery {
    pub n: Option<usize>,
}

/// GET /debug/traces?n= - Most recent full execution traces, newest last
pub async fn traces_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TraceQuery>,
) -> Json<Value> {
    let n = query.n.unwrap_or(DEFAULT_TRACE_COUNT);
    let traces = state.traces.recent(n).await;
    Json(json!({
        "capacity": state.traces.capacity(),
        "count": traces.len(),
        "traces": traces,
    }))
}

const DEFAULT_RECENT_TIMINGS: usize = 20;

/// GET /debug/timing?n= - Latency percentiles over retained traces
pub async fn timing_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TraceQuery>,
) -> Json<TimingStats> {
    let n = query.n.unwrap_or(DEFAULT_RECENT_TIMINGS);
    Json(state.traces.timing_stats(n).await)
}
