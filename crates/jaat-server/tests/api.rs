//! Router-level tests: requests go through the full axum stack without a socket.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use jaat_config::ServerConfig;
use jaat_core::ChatError;
use jaat_llm::{CompletionBackend, CompletionRequest, LlmMetrics, LlmResponse};
use jaat_server::{app, ServerState};
use serde_json::{json, Value};
use tower::ServiceExt;

struct CountingBackend {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl CompletionBackend for CountingBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<LlmResponse, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail {
            true => Err(ChatError::Upstream("502 Bad Gateway".into())),
            false => Ok(LlmResponse {
                content: format!("echo: {} ({} prior)", request.user_input, request.history.len()),
                metrics: LlmMetrics::default(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        "test-model"
    }
}

struct TestServer {
    router: Router,
    backend: Arc<CountingBackend>,
    _assets: tempfile::TempDir,
}

fn write_assets(root: &Path) {
    let public = root.join("public");
    fs::create_dir_all(public.join("features")).unwrap();
    fs::write(public.join("index.html"), "<!doctype html><title>JAAT-AI</title>").unwrap();
    fs::write(public.join("features/theme-toggle.js"), "export {}").unwrap();
    fs::write(root.join("README.md"), "# docs").unwrap();
    fs::write(
        root.join("features.json"),
        r#"{ "version": 1, "features": [
            { "id": "smart-search", "name": "Smart Search" },
            { "id": "mode1-coder", "name": "Coder", "type": "mode", "number": "1" }
        ] }"#,
    )
    .unwrap();
}

fn server(api_key: Option<&str>, fail: bool, manifest: bool) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    write_assets(dir.path());

    let config = ServerConfig {
        api_key: api_key.map(String::from),
        asset_root: dir.path().join("public"),
        asset_fallback_root: dir.path().to_path_buf(),
        features_manifest: manifest.then(|| dir.path().join("features.json")),
        ..ServerConfig::default()
    };

    let backend = Arc::new(CountingBackend { calls: AtomicUsize::new(0), fail });
    let state = ServerState::with_backend(config, backend.clone()).unwrap();

    TestServer { router: app(Arc::new(state)), backend, _assets: dir }
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    send(router, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post_chat(router: &Router, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, bytes) = send(router, req).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn chat_without_credential_returns_fallback() {
    let server = server(None, false, false);

    let (status, body) = post_chat(&server.router, json!({ "message": "hi" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "assistant");
    assert!(body["response"].as_str().unwrap().contains("API key is not configured"));
    assert_eq!(server.backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn chat_requires_message() {
    let server = server(Some("sk-test"), false, false);

    for body in [json!({}), json!({ "message": "" }), json!({ "message": null, "mode": "coder" })] {
        let (status, body) = post_chat(&server.router, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Message is required" }));
    }
    assert_eq!(server.backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_chat_body_is_a_json_error() {
    let server = server(Some("sk-test"), false, false);

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, bytes) = send(&server.router, req).await;
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(server.backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn chat_relays_completion_with_history() {
    let server = server(Some("sk-test"), false, false);
    let history: Vec<Value> = (0..15)
        .map(|i| json!({ "isUser": i % 2 == 0, "text": format!("turn {}", i) }))
        .collect();

    let (status, body) = post_chat(
        &server.router,
        json!({ "message": "hello", "mode": "coder", "history": history }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "response": "echo: hello (10 prior)", "mode": "coder" }));
    assert_eq!(server.backend.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn upstream_failure_still_returns_mode() {
    let server = server(Some("sk-test"), true, false);

    let (status, body) = post_chat(&server.router, json!({ "message": "hello", "mode": "tutor" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "tutor");
    assert!(body["response"].as_str().unwrap().contains("502 Bad Gateway"));
}

#[tokio::test]
async fn root_serves_entry_document() {
    let server = server(None, false, false);

    let response = server
        .router
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(body.starts_with(b"<!doctype html>"));
}

#[tokio::test]
async fn static_files_resolve_through_both_roots() {
    let server = server(None, false, false);

    let (status, body) = get(&server.router, "/features/theme-toggle.js").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"export {}");

    let (status, body) = get(&server.router, "/README.md").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"# docs");
}

#[tokio::test]
async fn missing_files_and_directories_are_404() {
    let server = server(None, false, false);

    for uri in ["/nope.html", "/features", "/public", "/features/../../etc/passwd"] {
        let (status, body) = get(&server.router, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body, b"File not found");
    }
}

#[tokio::test]
async fn builtin_features_are_listed() {
    let server = server(None, false, false);

    let (status, body) = get(&server.router, "/api/features").await;
    let features: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(features.as_array().unwrap().len(), 3);
    assert_eq!(features[0]["id"], "neural-machine-translation");
    assert_eq!(features[0]["type"], "feature");
}

#[tokio::test]
async fn manifest_features_are_idempotent_and_modes_filter() {
    let server = server(None, false, true);

    let (_, first) = get(&server.router, "/api/features").await;
    let (_, second) = get(&server.router, "/api/features").await;
    assert_eq!(first, second);

    let features: Value = serde_json::from_slice(&first).unwrap();
    assert_eq!(features.as_array().unwrap().len(), 2);

    let (status, body) = get(&server.router, "/api/modes").await;
    let modes: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(modes, json!([{ "id": "mode1-coder", "name": "Coder", "type": "mode", "number": "1" }]));
}

#[tokio::test]
async fn health_is_constant() {
    let server = server(None, false, false);

    for uri in ["/health", "/api/health"] {
        let (status, body) = get(&server.router, uri).await;
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok", "message": "JAAT-AI server is running" }));
    }
}
