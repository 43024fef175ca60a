//! OAuth 2.0 types for MCP authentication.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Scope granted to every client and token.
pub const DEFAULT_SCOPE: &str = "read write mcp";

/// Individual scopes advertised in server metadata.
pub const SUPPORTED_SCOPES: &[&str] = &["read", "write", "mcp"];

/// The only grant type this server issues tokens for.
pub const GRANT_TYPE_AUTHORIZATION_CODE: &str = "authorization_code";

/// The only response type the authorization endpoint accepts.
pub const RESPONSE_TYPE_CODE: &str = "code";

/// Clients authenticate at the token endpoint with credentials in the body.
pub const TOKEN_ENDPOINT_AUTH_METHOD: &str = "client_secret_post";

/// A dynamically registered OAuth client.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uris: Vec<String>,
    pub scope: String,
    pub created_at: DateTime<Utc>,
}

/// Registration result. The only place a client secret is ever handed out.
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredClient {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uris: Vec<String>,
    pub grant_types: Vec<&'static str>,
    pub response_types: Vec<&'static str>,
    pub scope: String,
    pub token_endpoint_auth_method: &'static str,
    pub client_id_issued_at: i64,
}

impl From<&OAuthClient> for RegisteredClient {
    fn from(client: &OAuthClient) -> Self {
        Self {
            client_id: client.client_id.clone(),
            client_secret: client.client_secret.clone(),
            redirect_uris: client.redirect_uris.clone(),
            grant_types: vec![GRANT_TYPE_AUTHORIZATION_CODE],
            response_types: vec![RESPONSE_TYPE_CODE],
            scope: client.scope.clone(),
            token_endpoint_auth_method: TOKEN_ENDPOINT_AUTH_METHOD,
            client_id_issued_at: client.created_at.timestamp(),
        }
    }
}

/// Client lookup view, without the secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub client_id: String,
    pub redirect_uris: Vec<String>,
    pub scope: String,
}

/// What a grant entry represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantKind {
    /// Single-use authorization code, bound to the authorization request.
    AuthorizationCode {
        redirect_uri: String,
        code_challenge: Option<String>,
    },
    /// Bearer access token.
    AccessToken,
}

/// An authorization code or access token record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub kind: GrantKind,
    pub client_id: String,
    pub scope: String,
    pub expires_at: DateTime<Utc>,
}

impl Grant {
    /// Authorization code issued now, valid for `ttl`.
    pub fn authorization_code(
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        code_challenge: Option<String>,
        scope: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            kind: GrantKind::AuthorizationCode { redirect_uri: redirect_uri.into(), code_challenge },
            client_id: client_id.into(),
            scope: scope.into(),
            expires_at: Utc::now() + ttl,
        }
    }

    /// Access token issued now, valid for `ttl`.
    pub fn access_token(client_id: impl Into<String>, scope: impl Into<String>, ttl: Duration) -> Self {
        Self {
            kind: GrantKind::AccessToken,
            client_id: client_id.into(),
            scope: scope.into(),
            expires_at: Utc::now() + ttl,
        }
    }

    /// A grant is only valid while `expires_at` lies in the future.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    #[must_use]
    pub const fn is_authorization_code(&self) -> bool {
        matches!(self.kind, GrantKind::AuthorizationCode { .. })
    }

    #[must_use]
    pub const fn is_access_token(&self) -> bool {
        matches!(self.kind, GrantKind::AccessToken)
    }
}

/// Resolved bearer token, attached to requests that passed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantContext {
    pub client_id: String,
    pub scope: String,
    pub expires_at: DateTime<Utc>,
}

impl From<&Grant> for GrantContext {
    fn from(grant: &Grant) -> Self {
        Self {
            client_id: grant.client_id.clone(),
            scope: grant.scope.clone(),
            expires_at: grant.expires_at,
        }
    }
}

/// Successful token endpoint response (RFC 6749 §5.1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub scope: String,
}

/// Query parameters of an authorization request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizationRequest {
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub response_type: Option<String>,
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
}

/// Token request body, JSON or form encoded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    pub grant_type: Option<String>,
    pub code: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub code_verifier: Option<String>,
    pub redirect_uri: Option<String>,
}
