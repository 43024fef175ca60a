//! Error types for the Context Keeper MCP server.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

/// OAuth protocol errors (RFC 6749 §5.2, RFC 6750 §3.1).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OAuthError {
    /// Unknown client or wrong client secret
    #[error("Client authentication failed")]
    InvalidClient,

    /// Authorization code unknown, expired, consumed or bound elsewhere
    #[error("{0}")]
    InvalidGrant(&'static str),

    /// Grant type other than `authorization_code`
    #[error("Only the authorization_code grant is supported")]
    UnsupportedGrantType,

    /// Response type other than `code`
    #[error("Only the code response type is supported")]
    UnsupportedResponseType,

    /// Malformed or missing request parameter
    #[error("{0}")]
    InvalidRequest(String),

    /// Bearer token unknown or expired
    #[error("The access token is invalid or expired")]
    InvalidToken,

    /// No bearer credentials supplied
    #[error("Bearer token required")]
    Unauthorized,

    /// Internal fault; the message is logged, never returned
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OAuthError {
    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Wire-level error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidClient => "invalid_client",
            Self::InvalidGrant(_) => "invalid_grant",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidToken => "invalid_token",
            Self::Unauthorized => "unauthorized",
            Self::Internal(_) => "server_error",
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidToken | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// `WWW-Authenticate` challenge for 401 responses.
    fn challenge(&self) -> Option<HeaderValue> {
        match self {
            Self::Unauthorized => Some(HeaderValue::from_static(r#"Bearer realm="mcp""#)),
            Self::InvalidToken => Some(HeaderValue::from_static(
                r#"Bearer realm="mcp", error="invalid_token""#,
            )),
            _ => None,
        }
    }
}

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        let body = match &self {
            Self::Internal(message) => {
                tracing::error!(error = %message, "Internal error in OAuth handler");
                serde_json::json!({ "error": self.code() })
            }
            _ => serde_json::json!({
                "error": self.code(),
                "error_description": self.to_string()
            }),
        };

        let mut response = (self.status(), Json(body)).into_response();
        if let Some(challenge) = self.challenge() {
            response.headers_mut().insert(header::WWW_AUTHENTICATE, challenge);
        }
        response
    }
}

/// Errors from MCP tool execution.
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    /// Input validation failed
    #[error("Validation error: {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// No tool registered under this name
    #[error("Unknown tool")]
    UnknownTool(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ToolError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }

    /// Convert to a user-friendly error message for MCP response.
    #[must_use]
    pub fn to_user_message(&self) -> String {
        match self {
            Self::Validation { field, message } => {
                format!("Invalid input for '{field}': {message}")
            }
            Self::Serialization(e) => format!("Invalid arguments: {e}"),
            Self::UnknownTool(_) => self.to_string(),
        }
    }
}

impl IntoResponse for ToolError {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "Rejected tool call");
        (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": self.to_user_message() }))).into_response()
    }
}

/// Result type alias for OAuth operations.
pub type OAuthResult<T> = Result<T, OAuthError>;

/// Result type alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;
