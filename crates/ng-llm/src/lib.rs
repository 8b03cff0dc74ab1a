//! ng-llm: Reasoning Collaborator
//!
//! | Provider | Selected when | Behaviour |
//! |----------|---------------|-----------|
//! | `OpenAiClient` | `OPENAI_API_KEY` set | chat completions with tool calling |
//! | `DisabledProvider` | no key | fixed "disabled" reply, no tools |
//! | `ScriptedProvider` | tests | replays canned responses |

pub mod disabled;
pub mod openai;
pub mod provider;
pub mod scripted;

use anyhow::Result;
use ng_core::AgentConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub use disabled::{DisabledProvider, DISABLED_MESSAGE};
pub use openai::OpenAiClient;
pub use provider::{
    ChatMessage, ChatRequest, ChatResponse, LlmProvider, ProviderType, SharedProvider,
    TokenUsage, ToolCallInfo, ToolDefinition,
};
pub use scripted::{ScriptStep, ScriptedProvider};

/// Pick the provider for a configuration: OpenAI when a key is present,
/// otherwise the disabled fallback.
pub fn provider_from_config(config: &AgentConfig) -> Result<SharedProvider> {
    match &config.openai_api_key {
        Some(key) if !key.trim().is_empty() => {
            info!("LLM provider: openai (model {})", config.model);
            let client = OpenAiClient::new(
                key.trim(),
                config.model.clone(),
                Duration::from_secs(config.llm_timeout_secs),
            )?
            .with_base_url(&config.openai_base_url);
            Ok(Arc::new(client))
        }
        _ => {
            info!("LLM provider: disabled (no OPENAI_API_KEY)");
            Ok(Arc::new(DisabledProvider))
        }
    }
}
