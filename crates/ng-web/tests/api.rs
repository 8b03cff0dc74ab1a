use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use ng_core::AgentConfig;
use ng_llm::{ScriptedProvider, SharedProvider};
use ng_web::{create_router, AppState};

const BOUNDARY: &str = "ngtestboundary";

fn config() -> AgentConfig {
    AgentConfig {
        viewer_base_url: "https://viewer.example".to_string(),
        max_upload_bytes: 256,
        ..AgentConfig::default()
    }
}

fn app_with(provider: SharedProvider) -> Router {
    let mut config = config();
    // Scripted provider ignores the model name
    config.model = "scripted".to_string();
    create_router(Arc::new(AppState::with_provider(config, provider)))
}

fn app() -> Router {
    app_with(Arc::new(ScriptedProvider::new(vec![ScriptedProvider::text("ok")])))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload_request(name: &str, content: &[u8], session: Option<&str>) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{n}\"\r\nContent-Type: text/csv\r\n\r\n",
            b = BOUNDARY,
            n = name
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri("/upload_file")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(id) = session {
        builder = builder.header("x-session-id", id);
    }
    builder.body(Body::from(body)).unwrap()
}

async fn upload_small(app: &Router) -> String {
    let (status, body) = send(app, upload_request("mini.csv", b"id,val\n1,10\n2,20\n3,30\n", None)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["ok"], true);
    body["file"]["file_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_and_tools() {
    let app = app();
    let (status, body) = send(
        &app,
        Request::builder().uri("/api/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["provider"], "scripted");

    let (_, tools) = send(
        &app,
        Request::builder().uri("/api/tools").body(Body::empty()).unwrap(),
    )
    .await;
    let entries = tools["tools"].as_array().unwrap();
    let set_view = entries.iter().find(|t| t["name"] == "ng_set_view").unwrap();
    assert_eq!(set_view["mutating"], true);
    assert!(set_view["parameters"]["properties"]["center"].is_object());
}

#[tokio::test]
async fn test_upload_and_data_tools() {
    let app = app();
    let fid = upload_small(&app).await;

    let (_, files) = send(&app, post_json("/tools/data_list_files", json!({}))).await;
    assert_eq!(files["files"].as_array().unwrap().len(), 1);

    let (_, preview) = send(&app, post_json("/tools/data_preview", json!({"file_id": fid, "n": 2}))).await;
    assert_eq!(preview["rows"].as_array().unwrap().len(), 2);

    let (_, sample) = send(
        &app,
        post_json("/tools/data_sample", json!({"file_id": fid, "n": 3, "seed": 7})),
    )
    .await;
    let (_, again) = send(
        &app,
        post_json("/tools/data_sample", json!({"file_id": fid, "n": 3, "seed": 7})),
    )
    .await;
    assert_eq!(sample["returned"], 3);
    assert_eq!(sample["rows"], again["rows"]);
}

#[tokio::test]
async fn test_oversized_upload_is_413() {
    let app = app();
    let big = vec![b'1'; 1024];
    let (status, body) = send(&app, upload_request("big.csv", &big, None)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["ok"], false);
    assert!(body["error"].as_str().unwrap().contains("too large"));
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let app = app();
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nx\r\n--{b}--\r\n",
        b = BOUNDARY
    );
    let request = Request::builder()
        .method("POST")
        .uri("/upload_file")
        .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn test_direct_tool_empty_body_and_mask_query() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/tools/state_save?mask=1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["sid"].is_string());
    assert!(body["url"].as_str().unwrap().starts_with("https://viewer.example/#!"));
    assert!(body["masked_markdown"]
        .as_str()
        .unwrap()
        .starts_with("[Updated Neuroglancer view]"));

    let (_, plain) = send(&app, post_json("/tools/state_save", json!({}))).await;
    assert!(plain.get("masked_markdown").is_none());
}

#[tokio::test]
async fn test_direct_tool_errors_map_to_status() {
    let app = app();
    let (status, body) = send(&app, post_json("/tools/ng_teleport", json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");

    let (status, body) = send(
        &app,
        post_json("/tools/state_load", json!({"link": "https://viewer.example/#!%7Bbroken"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "state_parse");

    let request = Request::builder()
        .method("POST")
        .uri("/tools/ng_set_view")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_non_mutating_has_no_link() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptedProvider::tools("", vec![("data_list_files", json!({}))]),
        ScriptedProvider::text("One file is uploaded."),
    ]));
    let app = app_with(provider);
    upload_small(&app).await;

    let (status, body) = send(
        &app,
        post_json(
            "/agent/chat",
            json!({"messages": [{"role": "user", "content": "Which files do I have?"}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mutated"], false);
    assert!(body["state_link"].is_null());
    assert_eq!(body["message"], "One file is uploaded.");
    assert_eq!(body["tools_executed"], json!(["data_list_files"]));
    assert_eq!(body["session_id"], "default");
}

#[tokio::test]
async fn test_chat_mutation_returns_link() {
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
    let app = app_with(provider);

    let (status, body) = send(
        &app,
        post_json(
            "/agent/chat",
            json!({"messages": [{"role": "user", "content": "Center on 1 2 3."}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mutated"], true);
    let url = body["state_link"]["url"].as_str().unwrap();
    assert!(url.starts_with("http"));
    assert!(body["state_link"]["masked_markdown"]
        .as_str()
        .unwrap()
        .contains("Updated Neuroglancer view"));
    let state = ng_state::from_link(url).unwrap();
    assert_eq!(state.position, vec![1.0, 2.0, 3.0]);

    let (_, traces) = send(
        &app,
        Request::builder().uri("/debug/traces?n=5").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(traces["count"], 1);
    assert_eq!(traces["traces"][0]["mutated"], true);

    let (status, timing) = send(
        &app,
        Request::builder().uri("/debug/timing").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(timing["requests"], 1);
    for part in ["total", "llm", "tools"] {
        for key in ["avg_ms", "p50_ms", "p95_ms", "p99_ms", "min_ms", "max_ms"] {
            assert!(timing[part][key].is_number(), "{}.{}", part, key);
        }
    }
    let recent = timing["recent"].as_array().unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0]["rounds"], 2);
    assert_eq!(recent[0]["tools"], 1);
    assert_eq!(recent[0]["mutated"], true);
    assert_eq!(recent[0]["prompt"], "Center on 1 2 3.");
}

#[tokio::test]
async fn test_timing_without_requests() {
    let app = app();
    let (status, timing) = send(
        &app,
        Request::builder().uri("/debug/timing?n=5").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(timing["requests"], 0);
    assert_eq!(timing["total"]["p95_ms"], 0.0);
    assert!(timing["recent"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_rejects_empty_messages() {
    let app = app();
    let (status, body) = send(&app, post_json("/agent/chat", json!({"messages": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let app = app();
    let (status, _) = send(&app, upload_request("mini.csv", b"id\n1\n", Some("alice"))).await;
    assert_eq!(status, StatusCode::OK);

    let mut request = post_json("/tools/data_list_files", json!({}));
    request
        .headers_mut()
        .insert("x-session-id", "alice".parse().unwrap());
    let (_, alice) = send(&app, request).await;
    assert_eq!(alice["files"].as_array().unwrap().len(), 1);

    let (_, default) = send(&app, post_json("/tools/data_list_files", json!({}))).await;
    assert!(default["files"].as_array().unwrap().is_empty());

    let (_, bob) = send(
        &app,
        post_json("/tools/data_list_files?session_id=bob", json!({})),
    )
    .await;
    assert!(bob["files"].as_array().unwrap().is_empty());
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_list_and_delete_sessions() {
    let app = app();
    send(&app, upload_request("mini.csv", b"id\n1\n", Some("alice"))).await;
    send(&app, post_json("/tools/data_list_files", json!({}))).await;

    let (status, listing) = send(&app, get("/api/sessions")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["count"], 2);
    assert_eq!(listing["max_sessions"], 100);
    let sessions = listing["sessions"].as_array().unwrap();
    assert_eq!(sessions[0]["id"], "alice");
    assert_eq!(sessions[0]["files"], 1);
    assert_eq!(sessions[1]["id"], "default");

    let delete = |id: &str| {
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/sessions/{}", id))
            .body(Body::empty())
            .unwrap()
    };
    let (status, body) = send(&app, delete("alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, body) = send(&app, delete("alice")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");

    let (_, listing) = send(&app, get("/api/sessions")).await;
    assert_eq!(listing["count"], 1);
}

#[tokio::test]
async fn test_session_count_is_capped() {
    let mut config = config();
    config.max_sessions = 3;
    let provider: SharedProvider = Arc::new(ScriptedProvider::new(vec![]));
    let app = create_router(Arc::new(AppState::with_provider(config, provider)));

    for i in 0..10 {
        let (status, _) = send(
            &app,
            post_json(&format!("/tools/data_list_files?session_id=s{}", i), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, health) = send(&app, get("/api/health")).await;
    assert_eq!(health["sessions"], 3);
    let (_, listing) = send(&app, get("/api/sessions")).await;
    let ids: Vec<&str> = listing["sessions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["s7", "s8", "s9"]);
}
