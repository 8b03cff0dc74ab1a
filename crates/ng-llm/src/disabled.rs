//! Fallback provider used when no API credential is configured

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::provider::{ChatRequest, ChatResponse, LlmProvider, ProviderType};

/// Fixed reply of the disabled provider
pub const DISABLED_MESSAGE: &str = "(LLM disabled: no OPENAI_API_KEY set)";

/// Answers every request with [`DISABLED_MESSAGE`] and never calls tools.
#[derive(Debug, Default, Clone)]
pub struct DisabledProvider;

#[async_trait]
impl LlmProvider for DisabledProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Disabled
    }

    fn default_model(&self) -> &str {
        "none"
    }

    async fn chat_with_request(&self, model: &str, request: ChatRequest) -> Result<ChatResponse> {
        debug!("LLM disabled, skipping request with {} messages", request.messages.len());
        Ok(ChatResponse::text(&ProviderType::Disabled, model, DISABLED_MESSAGE))
    }
}
