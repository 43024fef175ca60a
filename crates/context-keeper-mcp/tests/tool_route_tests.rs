//! Integration tests for the bearer-protected tool routes.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use context_keeper_mcp::config::Config;
use context_keeper_mcp::server::oauth::{Grant, OAuthServer};
use context_keeper_mcp::server::transport::{HttpState, create_router};
use context_keeper_mcp::store::ContextStore;

struct TestApp {
    router: axum::Router,
    state: Arc<HttpState>,
}

impl TestApp {
    fn new() -> Self {
        let config = Config::for_testing("https://keeper.example.com");
        let state = Arc::new(HttpState::new(
            OAuthServer::new(&config),
            ContextStore::new(),
            config.base_url.clone(),
        ));
        Self { router: create_router(Arc::clone(&state)), state }
    }

    /// Mint an access token directly in the grant store.
    async fn token(&self, client_id: &str) -> String {
        self.state
            .oauth
            .grants()
            .issue(Grant::access_token(client_id, "read write mcp", chrono::Duration::seconds(3600)))
            .await
    }

    async fn call(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if body.is_empty() { Value::Null } else { serde_json::from_slice(&body).unwrap() };
        (status, json)
    }
}

// ─── Bearer gate ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_bearer_is_unauthorized() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/tools").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let challenge = response.headers()[header::WWW_AUTHENTICATE].to_str().unwrap();
    assert!(challenge.starts_with("Bearer"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "unauthorized");
}

#[tokio::test]
async fn test_unknown_bearer_is_invalid_token() {
    let app = TestApp::new();

    let (status, json) = app.call("GET", "/tools", Some("not-a-real-token"), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "invalid_token");
}

#[tokio::test]
async fn test_non_bearer_scheme_is_unauthorized() {
    let app = TestApp::new();

    let (status, json) = app
        .call("POST", "/mcp", None, Some(json!({"jsonrpc": "2.0", "method": "ping", "id": 1})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "unauthorized");

    let response = app
        .router
        .clone()
        .oneshot(
            Request::get("/tools")
                .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bearer_scheme_is_case_insensitive() {
    let app = TestApp::new();
    let token = app.token("client-a").await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::get("/tools")
                .header(header::AUTHORIZATION, format!("bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// ─── REST tool routes ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_tools() {
    let app = TestApp::new();
    let token = app.token("client-a").await;

    let (status, json) = app.call("GET", "/tools", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["save_context", "get_context"]);
    assert_eq!(json["tools"][0]["inputSchema"]["required"], json!(["project", "status"]));
}

#[tokio::test]
async fn test_save_and_get_context() {
    let app = TestApp::new();
    let token = app.token("client-a").await;

    let (status, json) = app
        .call(
            "POST",
            "/tools/call",
            Some(&token),
            Some(json!({
                "name": "save_context",
                "arguments": {"project": "keeper", "status": "in review", "working_on": "sweeper"}
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["content"][0]["type"], "text");
    assert_eq!(json["content"][0]["text"], "Saved context for keeper\nStatus: in review");

    let (_, json) = app
        .call(
            "POST",
            "/tools/call",
            Some(&token),
            Some(json!({"name": "get_context", "arguments": {"project": "keeper"}})),
        )
        .await;
    let text = json["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("**Status:** in review"));
    assert!(text.contains("**Working on:** sweeper"));
    assert!(text.contains("**Next:** Not specified"));

    assert_eq!(app.state.contexts.get("keeper").await.unwrap().client_id, "client-a");

    let (_, health) = app.call("GET", "/health", None, None).await;
    assert_eq!(health["projects"], 1);
}

#[tokio::test]
async fn test_get_missing_project() {
    let app = TestApp::new();
    let token = app.token("client-a").await;

    let (status, json) = app
        .call(
            "POST",
            "/tools/call",
            Some(&token),
            Some(json!({"name": "get_context", "arguments": {"project": "ghost"}})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["content"][0]["text"], "Project ghost not found");
}

#[tokio::test]
async fn test_unknown_tool() {
    let app = TestApp::new();
    let token = app.token("client-a").await;

    let (status, json) = app
        .call("POST", "/tools/call", Some(&token), Some(json!({"name": "drop_tables", "arguments": {}})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Unknown tool");
}

#[tokio::test]
async fn test_invalid_tool_arguments() {
    let app = TestApp::new();
    let token = app.token("client-a").await;

    let (status, _) = app
        .call(
            "POST",
            "/tools/call",
            Some(&token),
            Some(json!({"name": "save_context", "arguments": {"project": "keeper"}})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            "POST",
            "/tools/call",
            Some(&token),
            Some(json!({"name": "save_context", "arguments": {"project": "  ", "status": "x"}})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.state.contexts.is_empty().await);
}

// ─── JSON-RPC ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_mcp_initialize_and_list() {
    let app = TestApp::new();
    let token = app.token("client-a").await;

    let (status, json) = app
        .call(
            "POST",
            "/mcp",
            Some(&token),
            Some(json!({
                "jsonrpc": "2.0",
                "method": "initialize",
                "params": {"protocolVersion": "2025-03-26"},
                "id": 1
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], 1);
    assert_eq!(json["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(json["result"]["serverInfo"]["name"], "context-keeper-mcp");

    let (_, json) = app
        .call("POST", "/mcp", Some(&token), Some(json!({"jsonrpc": "2.0", "method": "tools/list", "id": 2})))
        .await;
    assert_eq!(json["result"]["tools"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_mcp_tools_call() {
    let app = TestApp::new();
    let token = app.token("client-a").await;

    let (_, json) = app
        .call(
            "POST",
            "/mcp",
            Some(&token),
            Some(json!({
                "jsonrpc": "2.0",
                "method": "tools/call",
                "params": {"name": "save_context", "arguments": {"project": "p", "status": "s"}},
                "id": "a"
            })),
        )
        .await;
    assert_eq!(json["id"], "a");
    assert_eq!(json["result"]["content"][0]["text"], "Saved context for p\nStatus: s");

    let (_, json) = app
        .call(
            "POST",
            "/mcp",
            Some(&token),
            Some(json!({
                "jsonrpc": "2.0",
                "method": "tools/call",
                "params": {"name": "nope"},
                "id": 3
            })),
        )
        .await;
    assert_eq!(json["error"]["code"], -32602);
}

#[tokio::test]
async fn test_mcp_unknown_method_and_notification() {
    let app = TestApp::new();
    let token = app.token("client-a").await;

    let (_, json) = app
        .call("POST", "/mcp", Some(&token), Some(json!({"jsonrpc": "2.0", "method": "resources/list", "id": 4})))
        .await;
    assert_eq!(json["error"]["code"], -32601);

    let (status, _) = app
        .call(
            "POST",
            "/mcp",
            Some(&token),
            Some(json!({"jsonrpc": "2.0", "method": "notifications/initialized"})),
        )
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
}
