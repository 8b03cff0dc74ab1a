//! LLM Provider Traits and Types
//!
//! The common interface every reasoning collaborator implements: an ordered
//! list of role-tagged messages plus a tool catalogue in, either assistant
//! text or a batch of tool calls out.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Provider types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProviderType {
    OpenAI,
    /// No credential configured
    Disabled,
    /// Canned responses (tests, demos)
    Scripted,
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderType::OpenAI => write!(f, "openai"),
            ProviderType::Disabled => write!(f, "disabled"),
            ProviderType::Scripted => write!(f, "scripted"),
        }
    }
}

impl FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "open_ai" => Ok(ProviderType::OpenAI),
            "disabled" | "none" => Ok(ProviderType::Disabled),
            "scripted" => Ok(ProviderType::Scripted),
            other => Err(format!("Unknown provider type: {}", other)),
        }
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Assistant turn that requested tool calls
    pub fn assistant_with_tools(content: impl Into<String>, calls: Vec<ToolCallInfo>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
            tool_calls: Some(calls),
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: content.into(),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// Tool call information from LLM response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallInfo {
    pub id: String,
    pub name: String,
    /// Parsed JSON arguments. Undecodable argument text is kept as a string
    /// so the dispatcher can report it.
    pub arguments: Value,
}

impl ToolCallInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Tool definition for LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    /// Convert to OpenAI function calling format
    pub fn to_openai_format(&self) -> Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters
            }
        })
    }
}

/// Full chat request with tools
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Offered with `tool_choice: auto`; empty means a plain completion
    pub tools: Vec<ToolDefinition>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            tools: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }
}

/// Token usage information
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Chat response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: ChatMessage,
    pub model: String,
    pub provider: String,
    pub finish_reason: Option<String>,
    pub usage: Option<TokenUsage>,
    pub tool_calls: Option<Vec<ToolCallInfo>>,
}

impl ChatResponse {
    /// Final text answer
    pub fn text(provider: &ProviderType, model: &str, content: impl Into<String>) -> Self {
        Self {
            message: ChatMessage::assistant(content),
            model: model.to_string(),
            provider: provider.to_string(),
            finish_reason: Some("stop".to_string()),
            usage: None,
            tool_calls: None,
        }
    }

    /// Tool-call batch, optionally with explanatory text
    pub fn with_tool_calls(
        provider: &ProviderType,
        model: &str,
        content: impl Into<String>,
        calls: Vec<ToolCallInfo>,
    ) -> Self {
        Self {
            message: ChatMessage::assistant_with_tools(content, calls.clone()),
            model: model.to_string(),
            provider: provider.to_string(),
            finish_reason: Some("tool_calls".to_string()),
            usage: None,
            tool_calls: Some(calls),
        }
    }

    /// Requested tool calls, in the order the model returned them
    pub fn calls(&self) -> &[ToolCallInfo] {
        self.tool_calls.as_deref().unwrap_or(&[])
    }
}

/// Shared provider handle
pub type SharedProvider = std::sync::Arc<dyn LlmProvider>;

/// LLM Provider trait
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get provider type
    fn provider_type(&self) -> ProviderType;

    /// Model used when the caller does not name one
    fn default_model(&self) -> &str;

    /// Chat with full request including tools
    ///
    /// Implementations offer the tools to the model and parse tool_calls
    /// from the response.
    async fn chat_with_request(&self, model: &str, request: ChatRequest) -> Result<ChatResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_definition_openai_format() {
        let def = ToolDefinition {
            name: "ng_state_link".into(),
            description: "Current link".into(),
            parameters: json!({"type": "object", "properties": {}}),
        };
        let v = def.to_openai_format();
        assert_eq!(v["type"], "function");
        assert_eq!(v["function"]["name"], "ng_state_link");
    }

    #[test]
    fn test_request_builder() {
        let request = ChatRequest::new(vec![ChatMessage::user("hi")]).with_tools(vec![
            ToolDefinition {
                name: "data_info".into(),
                description: "Table info".into(),
                parameters: json!({"type": "object"}),
            },
        ]);
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.tools[0].name, "data_info");
    }

    #[test]
    fn test_message_deserializes_without_content() {
        let m: ChatMessage = serde_json::from_value(json!({"role": "user"})).unwrap();
        assert_eq!(m.content, "");
        assert!(m.tool_calls.is_none());
    }
}
