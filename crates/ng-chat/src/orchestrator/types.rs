use ng_core::config::{
    DEFAULT_LLM_TIMEOUT_SECS, DEFAULT_MAX_ROUNDS, DEFAULT_TOOL_ECHO_CHARS,
};
use ng_core::AgentConfig;
use ng_tools::StateLink;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Characters kept from each side of the exchange in interaction memory
pub const MEMORY_SNIPPET_CHARS: usize = 400;

/// Configuration for the orchestrator
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Model name; `None` uses the provider's default
    pub model: Option<String>,
    pub max_rounds: usize,
    /// Character budget for each echoed tool argument and result
    pub tool_echo_chars: usize,
    pub llm_timeout: Duration,
    pub memory_snippet_chars: usize,
}

impl OrchestratorConfig {
    pub fn from_agent_config(config: &AgentConfig) -> Self {
        Self {
            model: Some(config.model.clone()),
            max_rounds: config.max_rounds.max(1),
            tool_echo_chars: config.tool_echo_chars,
            llm_timeout: Duration::from_secs(config.llm_timeout_secs),
            memory_snippet_chars: MEMORY_SNIPPET_CHARS,
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_rounds: DEFAULT_MAX_ROUNDS,
            tool_echo_chars: DEFAULT_TOOL_ECHO_CHARS,
            llm_timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
            memory_snippet_chars: MEMORY_SNIPPET_CHARS,
        }
    }
}

/// Response from tool execution
#[derive(Clone, Debug, Serialize)]
pub struct ToolResult {
    pub name: String,
    pub call_id: String,
    pub success: bool,
    pub result: Value,
}

/// Final response from orchestration
#[derive(Clone, Debug, Serialize)]
pub struct ChatOutcome {
    pub request_id: String,
    pub message: String,
    pub mutated: bool,
    pub state_link: Option<StateLink>,
    pub tools_executed: Vec<String>,
    pub tool_results: Vec<ToolResult>,
    pub rounds: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
