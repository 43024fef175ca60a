//! Context Keeper MCP Server
//!
//! An MCP server that stores per-project working context, protected by a
//! minimal embedded OAuth 2.0 authorization server.
//!
//! # Features
//!
//! - **Dynamic client registration** (RFC 7591) with auto-approved authorization
//! - **Authorization code grant** with optional PKCE (S256)
//! - **Bearer-protected tools**: `save_context` and `get_context`
//! - **In-memory stores** with a background sweeper for expired grants
//!
//! # Example
//!
//! ```no_run
//! use context_keeper_mcp::{config::Config, server::McpServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     McpServer::new(config).run_http().await
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod store;
pub mod tools;

pub use config::Config;
pub use error::{OAuthError, ToolError};
pub use server::McpServer;
pub use server::oauth::OAuthServer;
pub use store::ContextStore;
