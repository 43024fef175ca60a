//! Configuration for the Context Keeper MCP server.

use std::time::Duration;

use crate::server::oauth::store::generate_token;

/// OAuth lifetime constants.
pub mod oauth {
    use std::time::Duration;

    /// Authorization code lifetime (10 minutes).
    pub const AUTH_CODE_TTL: Duration = Duration::from_secs(600);

    /// Access token lifetime (1 hour).
    pub const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(3600);

    /// Interval between expiry sweeps (5 minutes).
    pub const SWEEP_INTERVAL: Duration = Duration::from_secs(300);
}

/// HTTP server defaults.
pub mod http {
    /// Default listen port.
    pub const DEFAULT_PORT: u16 = 3000;
}

/// Server configuration.
#[derive(Clone)]
pub struct Config {
    /// Issuer base URL override. When unset, derived from each request's Host.
    pub base_url: Option<String>,

    /// Server-wide secret keying the grant store digest.
    pub secret_key: String,

    /// HTTP listen port.
    pub port: u16,

    /// Authorization code lifetime.
    pub auth_code_ttl: Duration,

    /// Access token lifetime.
    pub access_token_ttl: Duration,

    /// Interval between expiry sweeps.
    pub sweep_interval: Duration,
}

impl Config {
    /// Create a new configuration. A random secret is generated when none is given.
    #[must_use]
    pub fn new(base_url: Option<String>, secret_key: Option<String>) -> Self {
        let secret_key = secret_key.filter(|s| !s.is_empty()).unwrap_or_else(generate_token);
        Self {
            base_url: base_url.map(|url| url.trim_end_matches('/').to_string()),
            secret_key,
            port: http::DEFAULT_PORT,
            auth_code_ttl: oauth::AUTH_CODE_TTL,
            access_token_ttl: oauth::ACCESS_TOKEN_TTL,
            sweep_interval: oauth::SWEEP_INTERVAL,
        }
    }

    /// Create a test configuration with a fixed issuer and secret.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            port: 0,
            ..Self::new(Some(base_url.to_string()), Some("test-secret-key".to_string()))
        }
    }

    /// Create configuration from environment variables (and `.env`, if present).
    ///
    /// # Errors
    ///
    /// Returns error if environment variables are invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let base_url = std::env::var("BASE_URL").ok();
        let secret_key = std::env::var("SECRET_KEY").ok();
        let mut config = Self::new(base_url, secret_key);

        if let Ok(port) = std::env::var("PORT") {
            config.port = port.parse().map_err(|e| anyhow::anyhow!("invalid PORT {port:?}: {e}"))?;
        }
        if let Ok(secs) = std::env::var("SWEEP_INTERVAL_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid SWEEP_INTERVAL_SECS {secs:?}: {e}"))?;
            config.sweep_interval = Duration::from_secs(secs.max(1));
        }
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("secret_key", &"<redacted>")
            .field("port", &self.port)
            .field("auth_code_ttl", &self.auth_code_ttl)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("sweep_interval", &self.sweep_interval)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_generates_secret() {
        let a = Config::default();
        let b = Config::default();
        assert_eq!(a.secret_key.len(), 64);
        assert_ne!(a.secret_key, b.secret_key);
        assert!(a.base_url.is_none());
    }

    #[test]
    fn test_config_empty_secret_is_replaced() {
        let config = Config::new(None, Some(String::new()));
        assert!(!config.secret_key.is_empty());
    }

    #[test]
    fn test_config_trims_trailing_slash() {
        let config = Config::new(Some("https://example.com/".to_string()), None);
        assert_eq!(config.base_url.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_config_lifetimes() {
        let config = Config::default();
        assert_eq!(config.auth_code_ttl, Duration::from_secs(600));
        assert_eq!(config.access_token_ttl, Duration::from_secs(3600));
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = Config::new(None, Some("super-secret-key".to_string()));
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret-key"));
        assert!(debug.contains("<redacted>"));
    }
}
