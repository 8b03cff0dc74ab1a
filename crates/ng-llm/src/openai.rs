//! OpenAI-compatible chat completions client with tool calling

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::provider::{
    ChatMessage, ChatRequest, ChatResponse, LlmProvider, ProviderType, TokenUsage, ToolCallInfo,
};

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: ng_core::config::DEFAULT_OPENAI_BASE_URL.to_string(),
            model: model.into(),
        })
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn message_to_api(m: &ChatMessage) -> Value {
        let mut msg = json!({
            "role": m.role,
            "content": m.content
        });

        if let Some(ref id) = m.tool_call_id {
            msg["tool_call_id"] = json!(id);
        }

        if let Some(ref calls) = m.tool_calls {
            msg["tool_calls"] = json!(calls
                .iter()
                .map(|tc| {
                    let arguments = match &tc.arguments {
                        Value::String(raw) => raw.clone(),
                        other => serde_json::to_string(other).unwrap_or_default(),
                    };
                    json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {
                            "name": tc.name,
                            "arguments": arguments
                        }
                    })
                })
                .collect::<Vec<_>>());
            // An assistant turn that only carries tool calls sends null content
            if m.content.is_empty() {
                msg["content"] = Value::Null;
            }
        }

        msg
    }

    /// Parse `choices[0].message.tool_calls`. Argument text that is not valid
    /// JSON is kept verbatim as a string.
    fn parse_tool_calls(message: &Value) -> Option<Vec<ToolCallInfo>> {
        let calls = message.get("tool_calls")?.as_array()?;
        let parsed: Vec<ToolCallInfo> = calls
            .iter()
            .filter_map(|call| {
                let id = call.get("id")?.as_str()?.to_string();
                let function = call.get("function")?;
                let name = function.get("name")?.as_str()?.to_string();
                let arguments = match function.get("arguments") {
                    Some(Value::String(raw)) if raw.trim().is_empty() => json!({}),
                    Some(Value::String(raw)) => serde_json::from_str(raw).unwrap_or_else(|e| {
                        warn!("Tool call {} has undecodable arguments: {}", name, e);
                        Value::String(raw.clone())
                    }),
                    Some(other) => other.clone(),
                    None => json!({}),
                };
                Some(ToolCallInfo {
                    id,
                    name,
                    arguments,
                })
            })
            .collect();
        if parsed.is_empty() {
            None
        } else {
            Some(parsed)
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    fn provider_type(&self) -> ProviderType {
        ProviderType::OpenAI
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn chat_with_request(&self, model: &str, request: ChatRequest) -> Result<ChatResponse> {
        let model = if model.is_empty() { self.model.as_str() } else { model };
        let url = format!("{}/chat/completions", self.base_url);

        let messages: Vec<Value> = request.messages.iter().map(Self::message_to_api).collect();

        let tools: Vec<Value> = request
            .tools
            .iter()
            .map(|t| t.to_openai_format())
            .collect();

        let mut body = json!({
            "model": model,
            "messages": messages,
        });

        if !tools.is_empty() {
            body["tools"] = json!(tools);
            body["tool_choice"] = json!("auto");
            debug!("Sending request with {} tools", tools.len());
        }

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Failed to send request to OpenAI")?;

        let status = response.status();
        let response_text = response.text().await?;

        debug!(
            "OpenAI response ({}): {}",
            status,
            ng_core::text::truncate_chars(&response_text, 500)
        );

        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "OpenAI API error ({}): {}",
                status,
                response_text
            ));
        }

        let response_json: Value =
            serde_json::from_str(&response_text).context("Failed to parse OpenAI response")?;

        let choice = response_json
            .get("choices")
            .and_then(|c| c.get(0))
            .ok_or_else(|| anyhow::anyhow!("No choices in response"))?;

        let message = choice
            .get("message")
            .ok_or_else(|| anyhow::anyhow!("No message in response"))?;

        let content = message
            .get("content")
            .and_then(|c| c.as_str())
            .unwrap_or("")
            .to_string();

        let tool_calls = Self::parse_tool_calls(message);
        if let Some(ref calls) = tool_calls {
            info!("Parsed {} tool calls from response", calls.len());
            for call in calls {
                debug!("  Tool call: {} ({})", call.name, call.id);
            }
        }

        let finish_reason = choice
            .get("finish_reason")
            .and_then(|f| f.as_str())
            .map(|s| s.to_string());

        let usage = response_json.get("usage").map(|u| TokenUsage {
            prompt_tokens: u.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            completion_tokens: u
                .get("completion_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32,
            total_tokens: u.get("total_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        });

        Ok(ChatResponse {
            message: ChatMessage {
                role: "assistant".to_string(),
                content,
                tool_calls: tool_calls.clone(),
                tool_call_id: None,
            },
            model: model.to_string(),
            provider: ProviderType::OpenAI.to_string(),
            finish_reason,
            usage,
            tool_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tool_calls_keeps_order_and_bad_args() {
        let message = json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [
                {"id": "c1", "type": "function", "function": {"name": "ng_set_lut", "arguments": "{\"layer\":\"img\",\"vmin\":0,\"vmax\":1}"}},
                {"id": "c2", "type": "function", "function": {"name": "data_info", "arguments": "{not json"}},
                {"id": "c3", "type": "function", "function": {"name": "ng_state_link", "arguments": ""}}
            ]
        });
        let calls = OpenAiClient::parse_tool_calls(&message).unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].name, "ng_set_lut");
        assert_eq!(calls[0].arguments["layer"], "img");
        assert_eq!(calls[1].arguments, Value::String("{not json".into()));
        assert_eq!(calls[2].arguments, json!({}));
    }

    #[test]
    fn test_tool_only_assistant_message_has_null_content() {
        let msg = ChatMessage::assistant_with_tools(
            "",
            vec![ToolCallInfo::new("c1", "ng_state_link", json!({}))],
        );
        let api = OpenAiClient::message_to_api(&msg);
        assert!(api["content"].is_null());
        assert_eq!(api["tool_calls"][0]["function"]["arguments"], "{}");
    }
}
