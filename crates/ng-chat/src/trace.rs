//! Execution traces
//!
//! One [`TraceRecord`] per chat request, holding untruncated tool arguments
//! and results. The [`TraceLog`] keeps only the most recent records and
//! derives latency statistics from them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One executed tool call
#[derive(Debug, Clone, Serialize)]
pub struct ToolTrace {
    pub call_id: String,
    pub name: String,
    pub args: Value,
    pub result: Value,
    pub success: bool,
    pub duration_ms: u64,
}

/// One model round
#[derive(Debug, Clone, Serialize)]
pub struct RoundTrace {
    pub round: usize,
    pub model_ms: u64,
    pub assistant: String,
    pub tools: Vec<ToolTrace>,
}

impl RoundTrace {
    pub fn new(round: usize, model_ms: u64) -> Self {
        Self {
            round,
            model_ms,
            assistant: String::new(),
            tools: Vec::new(),
        }
    }
}

/// Full trace of one chat request
#[derive(Debug, Clone, Serialize)]
pub struct TraceRecord {
    pub request_id: String,
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub prompt: String,
    pub rounds: Vec<RoundTrace>,
    pub total_ms: u64,
    pub mutated: bool,
    pub error: Option<String>,
}

impl TraceRecord {
    /// Time spent waiting on the model across all rounds
    pub fn llm_ms(&self) -> u64 {
        self.rounds.iter().map(|r| r.model_ms).sum()
    }

    /// Time spent executing tools across all rounds
    pub fn tool_ms(&self) -> u64 {
        self.rounds
            .iter()
            .flat_map(|r| r.tools.iter())
            .map(|t| t.duration_ms)
            .sum()
    }

    pub fn tool_count(&self) -> usize {
        self.rounds.iter().map(|r| r.tools.len()).sum()
    }

    pub fn new(
        request_id: impl Into<String>,
        session_id: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            session_id: session_id.into(),
            started_at: Utc::now(),
            prompt: prompt.into(),
            rounds: Vec::new(),
            total_ms: 0,
            mutated: false,
            error: None,
        }
    }
}

/// Latency distribution over a set of requests, in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DurationStats {
    pub avg_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

impl DurationStats {
    pub fn from_samples(samples: &[u64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let mut sorted: Vec<f64> = samples.iter().map(|&ms| ms as f64).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let sum: f64 = sorted.iter().sum();
        Self {
            avg_ms: sum / sorted.len() as f64,
            p50_ms: percentile(&sorted, 50.0),
            p95_ms: percentile(&sorted, 95.0),
            p99_ms: percentile(&sorted, 99.0),
            min_ms: sorted[0],
            max_ms: sorted[sorted.len() - 1],
        }
    }
}

/// Linear interpolation between closest ranks; `sorted` must be ascending and non-empty
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = (sorted.len() - 1) as f64 * (p / 100.0);
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    sorted[lower] + (rank - lower as f64) * (sorted[upper] - sorted[lower])
}

/// Per-request timing line in [`TimingStats::recent`]
#[derive(Debug, Clone, Serialize)]
pub struct RequestTiming {
    pub request_id: String,
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub prompt: String,
    pub total_ms: u64,
    pub llm_ms: u64,
    pub tool_ms: u64,
    pub rounds: usize,
    pub tools: usize,
    pub mutated: bool,
}

impl From<&TraceRecord> for RequestTiming {
    fn from(record: &TraceRecord) -> Self {
        Self {
            request_id: record.request_id.clone(),
            session_id: record.session_id.clone(),
            started_at: record.started_at,
            prompt: record.prompt.clone(),
            total_ms: record.total_ms,
            llm_ms: record.llm_ms(),
            tool_ms: record.tool_ms(),
            rounds: record.rounds.len(),
            tools: record.tool_count(),
            mutated: record.mutated,
        }
    }
}

/// Summary of the retained traces
#[derive(Debug, Clone, Serialize)]
pub struct TimingStats {
    pub requests: usize,
    pub total: DurationStats,
    pub llm: DurationStats,
    pub tools: DurationStats,
    /// Newest last
    pub recent: Vec<RequestTiming>,
}

/// Ring buffer of the last `capacity` traces, shared across sessions
#[derive(Debug, Clone)]
pub struct TraceLog {
    records: Arc<RwLock<VecDeque<TraceRecord>>>,
    capacity: usize,
}

impl TraceLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn push(&self, record: TraceRecord) {
        if self.capacity == 0 {
            return;
        }
        let mut records = self.records.write().await;
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Up to `n` most recent traces, newest last
    pub async fn recent(&self, n: usize) -> Vec<TraceRecord> {
        let records = self.records.read().await;
        let skip = records.len().saturating_sub(n);
        records.iter().skip(skip).cloned().collect()
    }

    /// Latency statistics over every retained trace, plus the `recent` newest
    pub async fn timing_stats(&self, recent: usize) -> TimingStats {
        let records = self.records.read().await;
        let total: Vec<u64> = records.iter().map(|r| r.total_ms).collect();
        let llm: Vec<u64> = records.iter().map(TraceRecord::llm_ms).collect();
        let tools: Vec<u64> = records.iter().map(TraceRecord::tool_ms).collect();
        let skip = records.len().saturating_sub(recent);
        TimingStats {
            requests: records.len(),
            total: DurationStats::from_samples(&total),
            llm: DurationStats::from_samples(&llm),
            tools: DurationStats::from_samples(&tools),
            recent: records.iter().skip(skip).map(RequestTiming::from).collect(),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for TraceLog {
    fn default() -> Self {
        Self::new(ng_core::config::DEFAULT_TRACE_CAPACITY)
    }
}
