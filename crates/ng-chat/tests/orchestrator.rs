use std::sync::Arc;
use std::time::Duration;

use ng_chat::{InteractionMemory, Orchestrator, OrchestratorConfig, Session, TraceLog};
use ng_llm::{ChatMessage, DisabledProvider, ScriptStep, ScriptedProvider, DISABLED_MESSAGE};
use ng_tools::{Dispatcher, Workspace};
use serde_json::json;

const BASE: &str = "https://viewer.example";

fn orchestrator(provider: Arc<ScriptedProvider>, config: OrchestratorConfig) -> Orchestrator {
    Orchestrator::new(config, provider, Dispatcher::new(BASE), TraceLog::new(10))
}

fn session() -> Session {
    Session::new("test", Workspace::default(), InteractionMemory::default())
}

fn ask(text: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(text)]
}

#[tokio::test]
async fn test_non_mutating_tool_produces_no_link() {
    let mut session = session();
    let meta = session
        .workspace
        .tables
        .add_file("mini.csv", b"id,val\n1,10\n2,20\n3,30\n")
        .unwrap();
    let fid = meta["file_id"].as_str().unwrap().to_string();

    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptedProvider::tools("", vec![("data_info", json!({"file_id": fid}))]),
        ScriptedProvider::text("File has 3 rows."),
    ]));
    let orch = orchestrator(provider.clone(), OrchestratorConfig::default());

    let outcome = orch.run(&mut session, ask("How many rows?")).await;
    assert!(!outcome.mutated);
    assert!(outcome.state_link.is_none());
    assert_eq!(outcome.message, "File has 3 rows.");
    assert_eq!(outcome.tools_executed, vec!["data_info"]);
    assert_eq!(outcome.rounds, 2);
    assert!(outcome.tool_results[0].success);
}

#[tokio::test]
async fn test_mutating_tool_returns_fresh_link() {
    let mut session = session();
    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptedProvider::tools(
            "",
            vec![(
                "ng_set_view",
                json!({"center": {"x": 1, "y": 2, "z": 3}, "zoom": "fit", "orientation": "xy"}),
            )],
        ),
        ScriptedProvider::text("View updated."),
    ]));
    let orch = orchestrator(provider, OrchestratorConfig::default());

    let outcome = orch.run(&mut session, ask("Center on 1 2 3.")).await;
    assert!(outcome.mutated);
    let link = outcome.state_link.expect("link after mutation");
    assert!(link.url.starts_with(BASE));
    assert!(link.masked_markdown.contains("Updated Neuroglancer view"));

    // The link reflects the post-mutation position
    let restored = ng_state::from_link(&link.url).unwrap();
    assert_eq!(restored.position, vec![1.0, 2.0, 3.0]);
}

#[tokio::test]
async fn test_round_cap_terminates() {
    let mut session = session();
    // The last step repeats, so the model asks for tools forever
    let provider = Arc::new(ScriptedProvider::new(vec![ScriptedProvider::tools(
        "",
        vec![("ng_state_summary", json!({}))],
    )]));
    let config = OrchestratorConfig {
        max_rounds: 3,
        ..OrchestratorConfig::default()
    };
    let orch = orchestrator(provider.clone(), config);

    let outcome = orch.run(&mut session, ask("loop")).await;
    assert_eq!(outcome.rounds, 3);
    assert_eq!(provider.request_count(), 3);
    assert_eq!(outcome.tools_executed.len(), 3);
    assert_eq!(outcome.message, "Executing tools: ng_state_summary");
    assert!(outcome.error.is_none());
}

#[tokio::test]
async fn test_tool_results_keyed_by_call_id() {
    let mut session = session();
    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptedProvider::tools(
            "Adding a layer.",
            vec![
                ("ng_add_layer", json!({"name": "em"})),
                ("ng_set_layer_visibility", json!({"name": "em", "visible": false})),
            ],
        ),
        ScriptedProvider::text("Done."),
    ]));
    let orch = orchestrator(provider.clone(), OrchestratorConfig::default());

    orch.run(&mut session, ask("add em hidden")).await;

    // Second request sees: preface, user, assistant, tool, tool
    let second = &provider.requests()[1];
    assert_eq!(second[0].role, "system");
    assert_eq!(second[2].content, "Adding a layer.");
    assert_eq!(second[3].tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(second[4].tool_call_id.as_deref(), Some("call_2"));
    let echo: serde_json::Value = serde_json::from_str(&second[4].content).unwrap();
    assert_eq!(echo["tool"], "ng_set_layer_visibility");

    // Calls ran in order: the visibility change found the new layer
    assert_eq!(session.workspace.viewer.layers[0].visible, Some(false));
    // The refreshed preface lists the new layer
    assert!(second[0].content.contains("em (image) hidden"));
}

#[tokio::test]
async fn test_tool_error_is_fed_back_not_fatal() {
    let mut session = session();
    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptedProvider::tools("", vec![("ng_teleport", json!({}))]),
        ScriptedProvider::text("That tool does not exist."),
    ]));
    let orch = orchestrator(provider.clone(), OrchestratorConfig::default());

    let outcome = orch.run(&mut session, ask("teleport")).await;
    assert!(!outcome.mutated);
    assert!(!outcome.tool_results[0].success);
    assert!(provider.requests()[1][3].content.contains("Unknown tool"));
    assert_eq!(outcome.message, "That tool does not exist.");
}

#[tokio::test]
async fn test_failed_mutation_does_not_count() {
    let mut session = session();
    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptedProvider::tools("", vec![("ng_set_view", json!({"center": {"x": 1}}))]),
        ScriptedProvider::text("Bad arguments."),
    ]));
    let orch = orchestrator(provider, OrchestratorConfig::default());

    let outcome = orch.run(&mut session, ask("move")).await;
    assert!(!outcome.mutated);
    assert!(outcome.state_link.is_none());
}

#[tokio::test]
async fn test_upstream_failure_keeps_partial_work() {
    let mut session = session();
    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptedProvider::tools("", vec![("ng_add_layer", json!({"name": "em"}))]),
        ScriptStep::Fail("connection reset".to_string()),
    ]));
    let orch = orchestrator(provider, OrchestratorConfig::default());

    let outcome = orch.run(&mut session, ask("add em")).await;
    let error = outcome.error.expect("upstream error reported");
    assert!(error.contains("connection reset"));
    assert!(outcome.mutated);
    assert!(outcome.state_link.is_some());
    assert_eq!(outcome.message, "Executing tools: ng_add_layer");
}

#[tokio::test]
async fn test_model_timeout_is_upstream_error() {
    let mut session = session();
    let provider = Arc::new(ScriptedProvider::new(vec![ScriptStep::Delay(
        Duration::from_secs(5),
        match ScriptedProvider::text("too late") {
            ScriptStep::Reply(resp) => resp,
            _ => unreachable!(),
        },
    )]));
    let config = OrchestratorConfig {
        llm_timeout: Duration::from_millis(20),
        ..OrchestratorConfig::default()
    };
    let orch = orchestrator(provider, config);

    let outcome = orch.run(&mut session, ask("hello")).await;
    let error = outcome.error.expect("timeout reported");
    assert!(error.contains("timed out"));
    assert!(outcome.message.starts_with("Sorry"));
    assert_eq!(outcome.rounds, 1);
}

#[tokio::test]
async fn test_answer_links_are_masked() {
    let mut session = session();
    let raw = format!("{}/#!%7B%22a%22%3A1%7D", BASE);
    let provider = Arc::new(ScriptedProvider::new(vec![ScriptedProvider::text(&format!(
        "Here: {} and again {}.",
        raw, raw
    ))]));
    let orch = orchestrator(provider, OrchestratorConfig::default());

    let outcome = orch.run(&mut session, ask("link?")).await;
    assert_eq!(
        outcome.message,
        format!(
            "Here: [Updated Neuroglancer view]({}) and again [Updated Neuroglancer view]({}).",
            raw, raw
        )
    );
}

#[tokio::test]
async fn test_memory_and_trace_updated() {
    let mut session = session();
    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptedProvider::tools("", vec![("ng_state_link", json!({}))]),
        ScriptedProvider::text("Here is the view."),
    ]));
    let orch = orchestrator(provider.clone(), OrchestratorConfig::default());

    orch.run(&mut session, ask("share   the\nview")).await;
    assert_eq!(
        session.memory.recall(),
        "User: share the view | Assistant: Here is the view."
    );

    let traces = orch.traces().recent(5).await;
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].prompt, "share   the\nview");
    assert_eq!(traces[0].rounds.len(), 2);
    // Traces keep the full, untruncated result
    assert!(traces[0].rounds[0].tools[0].result["url"]
        .as_str()
        .unwrap()
        .starts_with(BASE));

    // Memory shows up in the next request's preface
    orch.run(&mut session, ask("again")).await;
    let last = provider.requests().last().cloned().unwrap();
    assert!(last[0].content.contains("User: share the view"));
}

#[tokio::test]
async fn test_long_tool_echo_is_truncated() {
    let mut session = session();
    let rows: String = (0..400).map(|i| format!("{},{}\n", i, i * 2)).collect();
    let csv = format!("id,val\n{}", rows);
    let meta = session.workspace.tables.add_file("big.csv", csv.as_bytes()).unwrap();
    let fid = meta["file_id"].as_str().unwrap().to_string();

    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptedProvider::tools("", vec![("data_preview", json!({"file_id": fid, "n": 100}))]),
        ScriptedProvider::text("ok"),
    ]));
    let config = OrchestratorConfig {
        tool_echo_chars: 200,
        ..OrchestratorConfig::default()
    };
    let orch = orchestrator(provider.clone(), config);

    let outcome = orch.run(&mut session, ask("preview")).await;
    let echo: serde_json::Value =
        serde_json::from_str(&provider.requests()[1][3].content).unwrap();
    assert!(echo["result"].as_str().unwrap().contains("chars]"));
    // The returned result itself is complete
    assert_eq!(outcome.tool_results[0].result["rows"].as_array().unwrap().len(), 100);
}

#[tokio::test]
async fn test_disabled_provider_degrades_gracefully() {
    let mut session = session();
    let orch = Orchestrator::new(
        OrchestratorConfig::default(),
        Arc::new(DisabledProvider),
        Dispatcher::new(BASE),
        TraceLog::new(1),
    );
    let outcome = orch.run(&mut session, ask("hello")).await;
    assert_eq!(outcome.message, DISABLED_MESSAGE);
    assert!(outcome.error.is_none());
    assert!(!outcome.mutated);
}
