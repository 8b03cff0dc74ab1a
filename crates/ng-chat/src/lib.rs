//! ng-chat: the agent loop and its per-session context
//!
//! - `orchestrator`: bounded model/tool rounds producing a [`ChatOutcome`]
//! - `session`: keyed session store, one mutex per session
//! - `memory`: rolling interaction snippets for the model preface
//! - `trace`: ring buffer of full execution traces and timing statistics
//! - `prompt`: system instructions and context preface

pub mod memory;
pub mod orchestrator;
pub mod prompt;
pub mod session;
pub mod trace;

pub use memory::InteractionMemory;
pub use orchestrator::{ChatOutcome, Orchestrator, OrchestratorConfig, ToolResult};
pub use session::{Session, SessionInfo, SessionStore, SharedSession, DEFAULT_SESSION_ID};
pub use trace::{
    DurationStats, RequestTiming, RoundTrace, TimingStats, ToolTrace, TraceLog, TraceRecord,
};
