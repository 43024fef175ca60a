//! OAuth 2.0 authorization server for MCP authentication.
//!
//! Implements a self-contained OAuth server embedded in the binary. Client
//! credentials and issued grants live in explicit in-memory stores created at
//! start-up and shared by every handler; a background sweeper purges expired
//! grants.
//!
//! ## Supported Standards
//! - RFC 8414: OAuth Authorization Server Metadata
//! - RFC 7591: Dynamic Client Registration
//! - RFC 7636: PKCE (S256)
//! - RFC 6749: Authorization Code Grant
//! - RFC 6750: Bearer Token Usage

pub mod credentials;
pub mod handlers;
pub mod middleware;
pub mod pkce;
pub mod service;
pub mod store;
pub mod sweeper;
pub mod types;

pub use credentials::CredentialStore;
pub use service::OAuthServer;
pub use store::GrantStore;
pub use sweeper::ExpirySweeper;
pub use types::{Grant, GrantContext};
