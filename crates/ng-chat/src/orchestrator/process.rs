use ng_core::text::{snippet, truncate_chars};
use ng_core::Error;
use ng_llm::{ChatMessage, ChatRequest};
use ng_tools::{is_error_result, is_mutating, tool_definitions};
use serde_json::json;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{ChatOutcome, Orchestrator, ToolResult};
use crate::prompt::build_preface;
use crate::session::Session;
use crate::trace::{RoundTrace, ToolTrace, TraceRecord};

fn millis(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

impl Orchestrator {
    /// Run one chat request against `session`.
    ///
    /// Never fails: a model failure or timeout ends the loop early with the
    /// best answer so far and is reported in `error`. Tool failures are fed
    /// back to the model as `{error, kind}` results.
    pub async fn run(&self, session: &mut Session, messages: Vec<ChatMessage>) -> ChatOutcome {
        let request_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let user_prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default();
        info!(
            request = %request_id,
            session = %session.id,
            "📩 User request: \"{}\"",
            snippet(&user_prompt, 80)
        );

        let mut trace = TraceRecord::new(&request_id, &session.id, &user_prompt);
        let tools = tool_definitions();
        let model = self.model();
        let masker = self.dispatcher.masker();
        let echo_chars = self.config.tool_echo_chars;

        let mut history = messages;
        let mut final_message: Option<String> = None;
        let mut best_effort = String::new();
        let mut failure: Option<String> = None;
        let mut mutated = false;
        let mut rounds = 0;
        let mut tools_executed = Vec::new();
        let mut tool_results = Vec::new();

        for round in 0..self.config.max_rounds {
            rounds = round + 1;

            // Preface is rebuilt each round so it reflects earlier mutations
            let mut conversation = Vec::with_capacity(history.len() + 1);
            conversation.push(ChatMessage::system(build_preface(
                &session.workspace,
                &session.memory,
            )));
            conversation.extend(history.iter().cloned());
            let request = ChatRequest::new(conversation).with_tools(tools.clone());

            info!(round = rounds, "🧠 Calling model");
            let call_started = Instant::now();
            let response = match tokio::time::timeout(
                self.config.llm_timeout,
                self.provider.chat_with_request(&model, request),
            )
            .await
            {
                Ok(Ok(resp)) => resp,
                Ok(Err(e)) => {
                    let err = Error::upstream(format!("Model call failed at round {}: {}", rounds, e));
                    error!(round = rounds, "❌ {}", err);
                    failure = Some(err.to_string());
                    break;
                }
                Err(_) => {
                    let err = Error::upstream(format!(
                        "Model call timed out after {}s at round {}",
                        self.config.llm_timeout.as_secs(),
                        rounds
                    ));
                    error!(round = rounds, "⏱️ {}", err);
                    failure = Some(err.to_string());
                    break;
                }
            };
            let mut round_trace = RoundTrace::new(rounds, millis(call_started));

            let calls = response.calls().to_vec();
            if calls.is_empty() {
                let answer = masker.mask(&response.message.content);
                info!(round = rounds, "💬 Model answered");
                round_trace.assistant = answer.clone();
                trace.rounds.push(round_trace);
                final_message = Some(answer);
                break;
            }

            let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
            info!(
                round = rounds,
                "🔧 Model requested {} tool(s): {}",
                calls.len(),
                names.join(", ")
            );
            let content = response.message.content.trim();
            let assistant_text = if content.is_empty() {
                format!("Executing tools: {}", names.join(", "))
            } else {
                masker.mask(content)
            };
            round_trace.assistant = assistant_text.clone();
            best_effort = assistant_text.clone();
            history.push(ChatMessage::assistant_with_tools(assistant_text, calls.clone()));

            // In model order: later calls may depend on earlier mutations
            for call in calls {
                let tool_started = Instant::now();
                let result = self
                    .dispatcher
                    .execute(&mut session.workspace, &call.name, call.arguments.clone())
                    .await;
                let success = !is_error_result(&result);
                if success && is_mutating(&call.name) {
                    mutated = true;
                }
                debug!(tool = %call.name, success, "Tool finished");

                let echo = json!({
                    "tool": call.name,
                    "args": truncate_chars(&call.arguments.to_string(), echo_chars),
                    "result": truncate_chars(&result.to_string(), echo_chars),
                });
                history.push(ChatMessage::tool_result(&call.id, echo.to_string()));

                round_trace.tools.push(ToolTrace {
                    call_id: call.id.clone(),
                    name: call.name.clone(),
                    args: call.arguments.clone(),
                    result: result.clone(),
                    success,
                    duration_ms: millis(tool_started),
                });
                tools_executed.push(call.name.clone());
                tool_results.push(ToolResult {
                    name: call.name,
                    call_id: call.id,
                    success,
                    result,
                });
            }
            trace.rounds.push(round_trace);
        }

        let message = match final_message {
            Some(answer) => answer,
            None => {
                if failure.is_none() {
                    warn!(
                        "⚠️ Round cap ({}) reached with tool calls pending",
                        self.config.max_rounds
                    );
                }
                match (&failure, best_effort.is_empty()) {
                    (_, false) => best_effort,
                    (Some(e), true) => format!("Sorry, the request could not be completed: {}", e),
                    (None, true) => "No answer was produced.".to_string(),
                }
            }
        };

        // Computed from the post-mutation state, never before tools ran
        let state_link = if mutated {
            match self.dispatcher.state_link(&session.workspace.viewer) {
                Ok(link) => {
                    info!("🔗 Refreshed state link");
                    Some(link)
                }
                Err(e) => {
                    warn!("Failed to build state link: {}", e);
                    failure.get_or_insert_with(|| e.to_string());
                    None
                }
            }
        } else {
            None
        };

        let n = self.config.memory_snippet_chars;
        if !user_prompt.trim().is_empty() {
            session
                .memory
                .remember(format!("User: {}", snippet(&user_prompt, n)));
        }
        if !message.trim().is_empty() {
            session
                .memory
                .remember(format!("Assistant: {}", snippet(&message, n)));
        }
        session.touch();

        trace.total_ms = millis(started);
        trace.mutated = mutated;
        trace.error = failure.clone();
        self.traces.push(trace).await;

        info!(
            request = %request_id,
            rounds,
            mutated,
            "✅ Chat finished in {}ms",
            millis(started)
        );

        ChatOutcome {
            request_id,
            message,
            mutated,
            state_link,
            tools_executed,
            tool_results,
            rounds,
            error: failure,
        }
    }
}
