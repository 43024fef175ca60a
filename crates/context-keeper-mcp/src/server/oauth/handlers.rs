//! OAuth 2.0 endpoint handlers for MCP authentication.
//!
//! Implements:
//! - RFC 8414: OAuth Authorization Server Metadata
//! - RFC 7591: Dynamic Client Registration
//! - RFC 7636: PKCE (S256)
//! - RFC 6749: OAuth 2.0 Authorization Code Grant

use std::sync::Arc;

use axum::{
    Form, Json,
    body::Bytes,
    extract::{FromRequest, Query, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::pkce;
use super::types::{
    AuthorizationRequest, GRANT_TYPE_AUTHORIZATION_CODE, RESPONSE_TYPE_CODE, SUPPORTED_SCOPES,
    TOKEN_ENDPOINT_AUTH_METHOD, TokenRequest, TokenResponse,
};
use crate::error::{OAuthError, OAuthResult};
use crate::server::transport::HttpState;

/// Route paths, shared with the root info document.
pub mod paths {
    pub const METADATA: &str = "/.well-known/oauth-authorization-server";
    pub const REGISTER: &str = "/oauth/register";
    pub const AUTHORIZE: &str = "/oauth/authorize";
    pub const TOKEN: &str = "/oauth/token";
    pub const USERINFO: &str = "/oauth/userinfo";
}

// ─── RFC 8414: Authorization Server Metadata ─────────────────────────────────

/// `GET /.well-known/oauth-authorization-server`
///
/// Describes the OAuth endpoints and capabilities.
pub async fn handle_auth_server_metadata(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let issuer = issuer_url(state.base_url.as_deref(), &headers);
    Json(serde_json::json!({
        "issuer": issuer,
        "authorization_endpoint": format!("{issuer}{}", paths::AUTHORIZE),
        "token_endpoint": format!("{issuer}{}", paths::TOKEN),
        "registration_endpoint": format!("{issuer}{}", paths::REGISTER),
        "userinfo_endpoint": format!("{issuer}{}", paths::USERINFO),
        "response_types_supported": [RESPONSE_TYPE_CODE],
        "grant_types_supported": [GRANT_TYPE_AUTHORIZATION_CODE],
        "scopes_supported": SUPPORTED_SCOPES,
        "token_endpoint_auth_methods_supported": [TOKEN_ENDPOINT_AUTH_METHOD],
        "code_challenge_methods_supported": [pkce::METHOD_S256]
    }))
}

/// Issuer base URL: the configured override, else scheme and host of the request.
pub fn issuer_url(configured: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(base_url) = configured {
        return base_url.to_string();
    }

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("http");

    format!("{scheme}://{host}")
}

// ─── RFC 7591: Dynamic Client Registration ───────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

/// `POST /oauth/register`
///
/// Register a new OAuth client dynamically. An empty body registers a client
/// with no redirect URIs.
pub async fn handle_register(State(state): State<Arc<HttpState>>, body: Bytes) -> Response {
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        RegisterRequest::default()
    } else {
        match serde_json::from_slice::<RegisterRequest>(&body) {
            Ok(req) => req,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({
                        "error": "invalid_client_metadata",
                        "error_description": e.to_string()
                    })),
                )
                    .into_response();
            }
        }
    };

    let client = state.oauth.register(req.redirect_uris).await;
    (StatusCode::CREATED, no_store(Json(client).into_response())).into_response()
}

// ─── Authorization Endpoint ──────────────────────────────────────────────────

/// `GET /oauth/authorize`
///
/// Auto-approves any registered client and redirects back with the code.
/// Errors are returned as JSON, never as a redirect.
pub async fn handle_authorize(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<AuthorizationRequest>,
) -> OAuthResult<Response> {
    let redirect = state.oauth.authorize(&query).await?;
    Ok((StatusCode::FOUND, [(header::LOCATION, redirect.to_string())]).into_response())
}

// ─── Token Endpoint ──────────────────────────────────────────────────────────

/// Token request body accepted as JSON or `application/x-www-form-urlencoded`.
#[derive(Debug)]
pub struct TokenBody(pub TokenRequest);

impl<S> FromRequest<S> for TokenBody
where
    S: Send + Sync,
{
    type Rejection = OAuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(body) = Form::<TokenRequest>::from_request(req, state)
                .await
                .map_err(|e| OAuthError::invalid_request(e.body_text()))?;
            Ok(Self(body))
        } else {
            let Json(body) = Json::<TokenRequest>::from_request(req, state)
                .await
                .map_err(|e| OAuthError::invalid_request(e.body_text()))?;
            Ok(Self(body))
        }
    }
}

/// `POST /oauth/token`
///
/// Exchange an authorization code for an access token.
pub async fn handle_token(
    State(state): State<Arc<HttpState>>,
    TokenBody(req): TokenBody,
) -> OAuthResult<Response> {
    let token = state.oauth.exchange(&req).await?;
    Ok(token_success(&token))
}

/// Build a token response with required OAuth 2.0 cache headers (RFC 6749 §5.1).
fn token_success(token: &TokenResponse) -> Response {
    no_store(Json(token).into_response())
}

fn no_store(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    response
}

// ─── UserInfo Endpoint ───────────────────────────────────────────────────────

/// `GET /oauth/userinfo`
///
/// Every failure, including a missing header, is reported as `invalid_token`.
pub async fn handle_userinfo(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
) -> OAuthResult<Json<serde_json::Value>> {
    let authorization = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    let grant = state
        .oauth
        .verify(authorization)
        .await
        .map_err(|_| OAuthError::InvalidToken)?;

    tracing::debug!(client_id = %grant.client_id, "Served userinfo");

    Ok(Json(serde_json::json!({
        "sub": "user123",
        "name": "MCP User",
        "preferred_username": "mcp_user"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issuer_prefers_configured_url() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("internal:3000"));
        assert_eq!(issuer_url(Some("https://public.example"), &headers), "https://public.example");
    }

    #[test]
    fn test_issuer_from_request() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("keeper.example:8443"));
        assert_eq!(issuer_url(None, &headers), "http://keeper.example:8443");

        headers.insert("x-forwarded-proto", HeaderValue::from_static("https, http"));
        assert_eq!(issuer_url(None, &headers), "https://keeper.example:8443");
    }

    #[test]
    fn test_issuer_without_host() {
        assert_eq!(issuer_url(None, &HeaderMap::new()), "http://localhost");
    }
}
