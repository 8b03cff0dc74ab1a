//! Scripted provider replaying canned responses
//!
//! Responses are served in order; once the script runs out the last response
//! repeats. Every request is recorded so callers can inspect the
//! conversation the orchestrator built.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::provider::{
    ChatMessage, ChatRequest, ChatResponse, LlmProvider, ProviderType, ToolCallInfo,
};

/// One scripted step
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Reply(ChatResponse),
    Fail(String),
    /// Sleep before replying (exercises caller timeouts)
    Delay(Duration, ChatResponse),
}

pub struct ScriptedProvider {
    steps: Mutex<VecDeque<ScriptStep>>,
    last: Mutex<Option<ScriptStep>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Final text answer step
    pub fn text(content: &str) -> ScriptStep {
        ScriptStep::Reply(ChatResponse::text(&ProviderType::Scripted, "scripted", content))
    }

    /// Tool-call step. `calls` are `(name, arguments)`; ids are `call_<n>`.
    pub fn tools(content: &str, calls: Vec<(&str, Value)>) -> ScriptStep {
        let calls = calls
            .into_iter()
            .enumerate()
            .map(|(i, (name, args))| ToolCallInfo::new(format!("call_{}", i + 1), name, args))
            .collect();
        ScriptStep::Reply(ChatResponse::with_tool_calls(
            &ProviderType::Scripted,
            "scripted",
            content,
            calls,
        ))
    }

    /// Conversations seen so far, one per request
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    fn next_step(&self) -> Result<ScriptStep> {
        let mut steps = self.steps.lock().map_err(|_| anyhow!("script lock poisoned"))?;
        let mut last = self.last.lock().map_err(|_| anyhow!("script lock poisoned"))?;
        match steps.pop_front() {
            Some(step) => {
                *last = Some(step.clone());
                Ok(step)
            }
            None => last.clone().ok_or_else(|| anyhow!("Empty script")),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Scripted
    }

    fn default_model(&self) -> &str {
        "scripted"
    }

    async fn chat_with_request(&self, _model: &str, request: ChatRequest) -> Result<ChatResponse> {
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request.messages.clone());
        }
        match self.next_step()? {
            ScriptStep::Reply(resp) => Ok(resp),
            ScriptStep::Fail(msg) => Err(anyhow!(msg)),
            ScriptStep::Delay(wait, resp) => {
                tokio::time::sleep(wait).await;
                Ok(resp)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_script_order_and_repeat() {
        let provider = ScriptedProvider::new(vec![
            ScriptedProvider::tools("", vec![("ng_state_link", json!({}))]),
            ScriptedProvider::text("done"),
        ]);
        let first = provider.chat_with_request("", ChatRequest::new(vec![])).await.unwrap();
        assert_eq!(first.calls()[0].name, "ng_state_link");
        let second = provider.chat_with_request("", ChatRequest::new(vec![])).await.unwrap();
        assert_eq!(second.message.content, "done");
        let third = provider.chat_with_request("", ChatRequest::new(vec![])).await.unwrap();
        assert_eq!(third.message.content, "done");
        assert_eq!(provider.request_count(), 3);
    }

    #[tokio::test]
    async fn test_failure_step() {
        let provider = ScriptedProvider::new(vec![ScriptStep::Fail("boom".into())]);
        assert!(provider.chat_with_request("", ChatRequest::new(vec![])).await.is_err());
    }
}
