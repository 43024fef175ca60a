//! Authorization server operations: registration, authorization, token
//! exchange and bearer verification.
//!
//! Transport-independent; the axum handlers in [`super::handlers`] only
//! translate HTTP requests into these calls.

use std::time::Duration as StdDuration;

use chrono::Duration;
use url::Url;

use super::credentials::CredentialStore;
use super::pkce;
use super::store::GrantStore;
use super::types::{
    AuthorizationRequest, DEFAULT_SCOPE, GRANT_TYPE_AUTHORIZATION_CODE, Grant, GrantContext,
    GrantKind, RESPONSE_TYPE_CODE, RegisteredClient, TokenRequest, TokenResponse,
};
use crate::config::Config;
use crate::error::{OAuthError, OAuthResult};

/// Upper bound on any configured grant lifetime.
const MAX_GRANT_TTL: StdDuration = StdDuration::from_secs(365 * 24 * 3600);

/// The OAuth 2.0 authorization server.
///
/// Cheap to clone; clones share the same credential and grant stores.
#[derive(Clone, Debug)]
pub struct OAuthServer {
    credentials: CredentialStore,
    grants: GrantStore,
    auth_code_ttl: Duration,
    access_token_ttl: Duration,
}

impl OAuthServer {
    /// Build a server with fresh, empty stores.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_stores(
            CredentialStore::new(),
            GrantStore::new(&config.secret_key),
            config.auth_code_ttl,
            config.access_token_ttl,
        )
    }

    /// Build a server over existing stores.
    #[must_use]
    pub fn with_stores(
        credentials: CredentialStore,
        grants: GrantStore,
        auth_code_ttl: StdDuration,
        access_token_ttl: StdDuration,
    ) -> Self {
        Self {
            credentials,
            grants,
            auth_code_ttl: to_ttl(auth_code_ttl),
            access_token_ttl: to_ttl(access_token_ttl),
        }
    }

    #[must_use]
    pub const fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    #[must_use]
    pub const fn grants(&self) -> &GrantStore {
        &self.grants
    }

    /// Register a new client. The returned record is the only copy of the secret.
    pub async fn register(&self, redirect_uris: Vec<String>) -> RegisteredClient {
        let client = self.credentials.register(redirect_uris).await;
        tracing::info!(client_id = %client.client_id, "Registered OAuth client");
        client
    }

    /// Handle an authorization request, returning the redirect target.
    ///
    /// Consent is auto-approved for any registered client. An unknown client is
    /// rejected before the redirect URI is looked at, since it cannot be trusted yet.
    pub async fn authorize(&self, req: &AuthorizationRequest) -> OAuthResult<Url> {
        let client_id = non_empty(req.client_id.as_deref()).ok_or(OAuthError::InvalidClient)?;
        let client = self.credentials.lookup(client_id).await.ok_or_else(|| {
            tracing::debug!(client_id = %client_id, "Authorization request from unknown client");
            OAuthError::InvalidClient
        })?;

        if let Some(response_type) = non_empty(req.response_type.as_deref()) {
            if response_type != RESPONSE_TYPE_CODE {
                return Err(OAuthError::UnsupportedResponseType);
            }
        }

        let redirect_uri = non_empty(req.redirect_uri.as_deref())
            .ok_or_else(|| OAuthError::invalid_request("Missing redirect_uri"))?;
        let mut redirect = Url::parse(redirect_uri)
            .map_err(|e| OAuthError::invalid_request(format!("Invalid redirect_uri: {e}")))?;
        if redirect.cannot_be_a_base() {
            return Err(OAuthError::invalid_request("Invalid redirect_uri: not a hierarchical URL"));
        }

        let code_challenge = non_empty(req.code_challenge.as_deref()).map(str::to_owned);
        if code_challenge.is_some() {
            if let Some(method) = non_empty(req.code_challenge_method.as_deref()) {
                if method != pkce::METHOD_S256 {
                    return Err(OAuthError::invalid_request("code_challenge_method must be S256"));
                }
            }
        }

        let code = self
            .grants
            .issue(Grant::authorization_code(
                client.client_id.as_str(),
                redirect_uri,
                code_challenge,
                DEFAULT_SCOPE,
                self.auth_code_ttl,
            ))
            .await;

        tracing::info!(client_id = %client.client_id, "Auto-approved authorization");

        // Existing code/state pairs are replaced; all other parameters are kept.
        let kept: Vec<(String, String)> = redirect
            .query_pairs()
            .filter(|(k, _)| k != "code" && k != "state")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        {
            let mut query = redirect.query_pairs_mut();
            query.clear().extend_pairs(&kept);
            query.append_pair("code", &code);
            if let Some(state) = non_empty(req.state.as_deref()) {
                query.append_pair("state", state);
            }
        }
        Ok(redirect)
    }

    /// Exchange an authorization code for an access token.
    ///
    /// Errors are reported in a fixed order: grant type, then code, then client
    /// credentials. No failure consumes the code.
    pub async fn exchange(&self, req: &TokenRequest) -> OAuthResult<TokenResponse> {
        if req.grant_type.as_deref() != Some(GRANT_TYPE_AUTHORIZATION_CODE) {
            return Err(OAuthError::UnsupportedGrantType);
        }

        let code = non_empty(req.code.as_deref())
            .ok_or(OAuthError::InvalidGrant("Missing authorization code"))?;
        if self.grants.get(code).await.filter(Grant::is_authorization_code).is_none() {
            tracing::debug!("Token request with unknown or expired code");
            return Err(OAuthError::InvalidGrant("Invalid or expired authorization code"));
        }

        let client = self
            .credentials
            .authenticate(req.client_id.as_deref(), req.client_secret.as_deref())
            .await
            .inspect_err(|_| tracing::debug!("Token request failed client authentication"))?;

        let ttl = self.access_token_ttl;
        let (access_token, grant) = self
            .grants
            .redeem_code(
                code,
                |code_grant| check_code_binding(code_grant, &client.client_id, req),
                |code_grant| Grant::access_token(code_grant.client_id.clone(), code_grant.scope.clone(), ttl),
            )
            .await?;

        tracing::info!(client_id = %client.client_id, "Issued access token");

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer",
            expires_in: ttl.num_seconds(),
            scope: grant.scope,
        })
    }

    /// Resolve an `Authorization` header value into a grant context.
    pub async fn verify(&self, authorization: Option<&str>) -> OAuthResult<GrantContext> {
        let token = bearer_token(authorization).ok_or(OAuthError::Unauthorized)?;
        self.grants.resolve_access_token(token).await.ok_or(OAuthError::InvalidToken)
    }
}

/// Extract the credentials of a `Bearer` authorization header.
///
/// The scheme is matched case-insensitively. An empty token is still returned,
/// so it fails lookup rather than looking like a missing header.
#[must_use]
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let (scheme, token) = header?.trim_start().split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
}

fn check_code_binding(grant: &Grant, client_id: &str, req: &TokenRequest) -> OAuthResult<()> {
    let GrantKind::AuthorizationCode { redirect_uri, code_challenge } = &grant.kind else {
        return Err(OAuthError::InvalidGrant("Invalid or expired authorization code"));
    };

    if grant.client_id != client_id {
        return Err(OAuthError::InvalidGrant("Authorization code was issued to another client"));
    }

    if let Some(sent) = non_empty(req.redirect_uri.as_deref()) {
        if sent != redirect_uri {
            return Err(OAuthError::InvalidGrant("redirect_uri mismatch"));
        }
    }

    if let Some(challenge) = code_challenge {
        match non_empty(req.code_verifier.as_deref()) {
            Some(verifier) if pkce::verify_s256(verifier, challenge) => {}
            Some(_) => return Err(OAuthError::InvalidGrant("PKCE verification failed")),
            None => return Err(OAuthError::InvalidGrant("Missing code_verifier")),
        }
    }

    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn to_ttl(ttl: StdDuration) -> Duration {
    Duration::from_std(ttl.min(MAX_GRANT_TTL)).unwrap_or_else(|_| Duration::zero())
}
