//! MCP server implementation.
//!
//! Serves the OAuth authorization server and the protected MCP tools over
//! HTTP. A background sweeper purges expired grants for as long as the server
//! runs.

pub mod oauth;
pub mod transport;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::store::ContextStore;
use oauth::{ExpirySweeper, OAuthServer};
use transport::HttpState;

/// Context Keeper MCP server.
pub struct McpServer {
    config: Config,
    state: Arc<HttpState>,
}

impl McpServer {
    /// Create a server with empty stores.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let oauth = OAuthServer::new(&config);
        let state = HttpState::new(oauth, ContextStore::new(), config.base_url.clone());

        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// Run the server in HTTP mode until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns error if the listener cannot be bound or the server fails.
    pub async fn run_http(self) -> anyhow::Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        tracing::info!("Starting MCP server in HTTP mode on port {}", self.config.port);
        tracing::info!("Registered {} tools", self.state.tools.len());

        let cancel = CancellationToken::new();
        let sweeper = ExpirySweeper::spawn(
            self.state.oauth.grants().clone(),
            self.config.sweep_interval,
            cancel.clone(),
        );

        let router = transport::create_router(Arc::clone(&self.state));
        let listener = tokio::net::TcpListener::bind(addr).await?;

        tracing::info!("HTTP server listening on http://{}", addr);
        match &self.config.base_url {
            Some(url) => tracing::info!(issuer = %url, "OAuth issuer configured"),
            None => tracing::info!("OAuth issuer derived from request Host header"),
        }

        let served = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal(cancel.clone()))
            .await;

        if sweeper.is_finished() {
            tracing::warn!("Expiry sweeper exited before shutdown");
        }
        cancel.cancel();
        sweeper.shutdown().await;

        served?;
        tracing::info!("HTTP server shut down");
        Ok(())
    }

    /// Shared handler state.
    #[must_use]
    pub fn state(&self) -> Arc<HttpState> {
        Arc::clone(&self.state)
    }
}

impl std::fmt::Debug for McpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpServer")
            .field("config", &self.config)
            .field("tools", &self.state.tools.len())
            .finish()
    }
}

/// Resolves on Ctrl-C, or when `cancel` fires.
async fn shutdown_signal(cancel: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => tracing::info!("Received shutdown signal"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C; waiting for cancellation");
                cancel.cancelled().await;
            }
        },
        () = cancel.cancelled() => {}
    }
}
