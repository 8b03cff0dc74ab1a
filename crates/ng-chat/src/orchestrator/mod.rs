//! Agent loop
//!
//! Drives a bounded number of model/tool rounds against one session:
//!
//! 1. Preface (instructions, viewer and data summaries, memory) plus the
//!    caller's turns go to the model together with the tool catalogue.
//! 2. No tool calls: the answer is masked and returned.
//! 3. Tool calls run in the order returned; each result is echoed back as a
//!    `tool` turn keyed by its call id.
//! 4. After the last round a fresh link is attached if anything mutated.

mod process;
mod types;

pub use types::{ChatOutcome, OrchestratorConfig, ToolResult, MEMORY_SNIPPET_CHARS};

use ng_llm::SharedProvider;
use ng_tools::Dispatcher;

use crate::trace::TraceLog;

pub struct Orchestrator {
    config: OrchestratorConfig,
    provider: SharedProvider,
    dispatcher: Dispatcher,
    traces: TraceLog,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        provider: SharedProvider,
        dispatcher: Dispatcher,
        traces: TraceLog,
    ) -> Self {
        Self {
            config,
            provider,
            dispatcher,
            traces,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn traces(&self) -> &TraceLog {
        &self.traces
    }

    pub fn provider(&self) -> &SharedProvider {
        &self.provider
    }

    fn model(&self) -> String {
        self.config
            .model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }
}
