//! HTTP transport.
//!
//! Public routes serve discovery, health and the OAuth endpoints. Tool routes,
//! both the plain REST pair and the JSON-RPC `/mcp` endpoint, sit behind the
//! bearer gate and see the caller's verified grant.

use std::any::Any;
use std::borrow::Cow;
use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::oauth::handlers::{self, paths};
use super::oauth::middleware::require_bearer;
use super::oauth::{GrantContext, OAuthServer};
use crate::error::{OAuthError, ToolError};
use crate::store::ContextStore;
use crate::tools::{self, McpTool, ToolContext};

/// JSON-RPC 2.0 request.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: Cow<'static, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcResponse {
    /// JSON-RPC version constant.
    const VERSION: &'static str = "2.0";

    #[must_use]
    pub fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: Cow::Borrowed(Self::VERSION),
            result: Some(result),
            error: None,
            id,
        }
    }

    #[must_use]
    pub fn error(id: Option<serde_json::Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: Cow::Borrowed(Self::VERSION),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
            id,
        }
    }
}

/// MCP tool info for tool listings.
#[derive(Debug, Serialize)]
pub struct McpToolInfo {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Body of `POST /tools/call`.
#[derive(Debug, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// Shared state for HTTP handlers.
pub struct HttpState {
    pub oauth: OAuthServer,
    pub contexts: ContextStore,
    pub tools: Vec<Box<dyn McpTool>>,
    /// Issuer URL override; derived from the request when `None`.
    pub base_url: Option<String>,
}

impl HttpState {
    #[must_use]
    pub fn new(oauth: OAuthServer, contexts: ContextStore, base_url: Option<String>) -> Self {
        Self {
            oauth,
            contexts,
            tools: tools::register_all_tools(),
            base_url,
        }
    }
}

/// Create the HTTP router.
pub fn create_router(state: Arc<HttpState>) -> Router {
    let protected = Router::new()
        .route("/tools", get(handle_tools_list))
        .route("/tools/call", post(handle_tools_call))
        .route("/mcp", post(handle_mcp_post))
        .route_layer(middleware::from_fn_with_state(state.oauth.clone(), require_bearer));

    Router::new()
        .route("/", get(server_info))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route(paths::METADATA, get(handlers::handle_auth_server_metadata))
        .route(paths::REGISTER, post(handlers::handle_register))
        .route(paths::AUTHORIZE, get(handlers::handle_authorize))
        .route(paths::TOKEN, post(handlers::handle_token))
        .route(paths::USERINFO, get(handlers::handle_userinfo))
        .merge(protected)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn handle_panic(_panic: Box<dyn Any + Send + 'static>) -> Response {
    OAuthError::internal("handler panicked").into_response()
}

async fn server_info() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "Context Keeper MCP",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "OAuth 2.0 protected MCP server for project context management",
        "protocol": "mcp",
        "oauth": {
            "authorization_endpoint": paths::AUTHORIZE,
            "token_endpoint": paths::TOKEN,
            "registration_endpoint": paths::REGISTER
        }
    }))
}

async fn health_check(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "OK",
        "projects": state.contexts.len().await,
        "oauth": true,
        "mcp": true,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn readiness_check(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ready",
        "service": "context-keeper-mcp",
        "version": env!("CARGO_PKG_VERSION"),
        "clients": state.oauth.credentials().len().await,
        "grants": state.oauth.grants().len().await,
        "tools": state.tools.len()
    }))
}

fn tool_infos(tools: &[Box<dyn McpTool>]) -> Vec<McpToolInfo> {
    tools
        .iter()
        .map(|t| McpToolInfo {
            name: t.name().to_string(),
            description: t.description().to_string(),
            input_schema: t.input_schema(),
        })
        .collect()
}

/// `GET /tools`
async fn handle_tools_list(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    Json(serde_json::json!({ "tools": tool_infos(&state.tools) }))
}

/// `POST /tools/call`
async fn handle_tools_call(
    State(state): State<Arc<HttpState>>,
    Extension(grant): Extension<GrantContext>,
    Json(req): Json<ToolCallRequest>,
) -> Result<Json<serde_json::Value>, ToolError> {
    let ctx = ToolContext::new(state.contexts.clone(), grant);
    let text = tools::call_tool(&state.tools, &ctx, &req.name, req.arguments).await?;

    Ok(Json(serde_json::json!({
        "content": [{
            "type": "text",
            "text": text
        }]
    })))
}

/// `POST /mcp` (JSON-RPC 2.0)
async fn handle_mcp_post(
    State(state): State<Arc<HttpState>>,
    Extension(grant): Extension<GrantContext>,
    Json(req): Json<JsonRpcRequest>,
) -> Response {
    tracing::debug!(method = %req.method, "Handling MCP request");

    let is_notification = req.id.is_none();

    let response = match req.method.as_str() {
        "initialize" => JsonRpcResponse::success(req.id, handle_initialize(&req.params)),
        "tools/list" => JsonRpcResponse::success(
            req.id,
            serde_json::json!({ "tools": tool_infos(&state.tools) }),
        ),
        "tools/call" => {
            let ctx = ToolContext::new(state.contexts.clone(), grant);
            handle_rpc_tools_call(req.id, &req.params, &state.tools, &ctx).await
        }
        "ping" => JsonRpcResponse::success(req.id, serde_json::json!({})),
        _ if is_notification => return StatusCode::ACCEPTED.into_response(),
        _ => JsonRpcResponse::error(
            req.id,
            -32601,
            format!("Method not found: {}", req.method),
        ),
    };

    Json(response).into_response()
}

fn handle_initialize(params: &serde_json::Value) -> serde_json::Value {
    let protocol_version = params
        .get("protocolVersion")
        .and_then(|v| v.as_str())
        .unwrap_or("2024-11-05");

    tracing::info!("MCP initialize: protocol version {}", protocol_version);

    serde_json::json!({
        "protocolVersion": protocol_version,
        "capabilities": {
            "tools": {
                "listChanged": false
            }
        },
        "serverInfo": {
            "name": "context-keeper-mcp",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

async fn handle_rpc_tools_call(
    id: Option<serde_json::Value>,
    params: &serde_json::Value,
    tools: &[Box<dyn McpTool>],
    ctx: &ToolContext,
) -> JsonRpcResponse {
    let Some(tool_name) = params.get("name").and_then(|v| v.as_str()) else {
        return JsonRpcResponse::error(id, -32602, "Missing 'name' parameter");
    };

    let arguments = params
        .get("arguments")
        .cloned()
        .unwrap_or(serde_json::json!({}));

    match tools::call_tool(tools, ctx, tool_name, arguments).await {
        Ok(text) => JsonRpcResponse::success(
            id,
            serde_json::json!({
                "content": [{
                    "type": "text",
                    "text": text
                }]
            }),
        ),
        Err(ToolError::UnknownTool(name)) => {
            JsonRpcResponse::error(id, -32602, format!("Tool not found: {name}"))
        }
        Err(e) => {
            tracing::warn!(tool = %tool_name, error = %e, "Tool execution failed");
            JsonRpcResponse::error(id, -32000, format!("Tool error: {}", e.to_user_message()))
        }
    }
}
