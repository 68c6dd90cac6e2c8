//! Configuration data structures for storegate.
//!
//! These types map directly to YAML (also TOML / JSON / INI) configuration files and
//! `STOREGATE__*` environment overrides. Every section has defaults so a minimal config
//! only needs to name the upstream provider.
use serde::{Deserialize, Serialize};

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_public_scheme() -> String {
    "http".to_string()
}

/// Where and how the upstream metadata provider is reached.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the provider; operations are resolved relative to it
    pub base_url: String,
    /// Timeout for direct (unproxied) calls, in seconds
    pub timeout_secs: u64,
    /// Timeout for calls routed through a client-supplied proxy, in milliseconds
    pub proxy_timeout_ms: u64,
    /// User-Agent sent upstream
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/".to_string(),
            timeout_secs: 30,
            proxy_timeout_ms: 10_000,
            user_agent: format!("storegate/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set
    pub level: String,
    /// JSON lines when true, pretty console output otherwise
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Scheme used in generated links when the request carries no `X-Forwarded-Proto`
    #[serde(default = "default_public_scheme")]
    pub public_scheme: String,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServerConfig {
    /// Create a new server configuration builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            public_scheme: default_public_scheme(),
            upstream: UpstreamConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Builder for ServerConfig to allow for cleaner configuration creation
#[derive(Default)]
pub struct ServerConfigBuilder {
    listen_addr: Option<String>,
    public_scheme: Option<String>,
    upstream: Option<UpstreamConfig>,
    logging: Option<LoggingConfig>,
}

impl ServerConfigBuilder {
    /// Set the listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = Some(addr.into());
        self
    }

    /// Set the default scheme for generated links
    pub fn public_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.public_scheme = Some(scheme.into());
        self
    }

    /// Point at an upstream provider, keeping the other upstream defaults
    pub fn upstream_url(mut self, base_url: impl Into<String>) -> Self {
        let mut upstream = self.upstream.take().unwrap_or_default();
        upstream.base_url = base_url.into();
        self.upstream = Some(upstream);
        self
    }

    /// Set the full upstream configuration
    pub fn upstream(mut self, config: UpstreamConfig) -> Self {
        self.upstream = Some(config);
        self
    }

    /// Set logging configuration
    pub fn logging(mut self, config: LoggingConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// Build the final ServerConfig
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            listen_addr: self.listen_addr.unwrap_or_else(default_listen_addr),
            public_scheme: self.public_scheme.unwrap_or_else(default_public_scheme),
            upstream: self.upstream.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        }
    }
}
