//! Context Keeper MCP Server - Entry Point

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use context_keeper_mcp::{config::Config, server::McpServer};

#[derive(Parser, Debug)]
#[command(name = "context-keeper-mcp")]
#[command(about = "OAuth 2.0 protected MCP server for project context")]
#[command(version)]
struct Cli {
    /// HTTP server port
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Public issuer URL (e.g., https://keeper.example.com); derived from Host when unset
    #[arg(long, env = "BASE_URL")]
    base_url: Option<String>,

    /// Server secret keying the grant store; random per process when unset
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = Config::from_env()?;
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(base_url) = cli.base_url {
        config.base_url = Some(base_url.trim_end_matches('/').to_string());
    }
    if let Some(secret_key) = cli.secret_key.filter(|s| !s.is_empty()) {
        config.secret_key = secret_key;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.port,
        base_url = ?config.base_url,
        "Starting Context Keeper MCP server"
    );

    McpServer::new(config).run_http().await
}
