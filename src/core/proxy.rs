//! Per-request outbound proxy selection.
//!
//! A client may route the upstream call through its own proxy by passing
//! `proxy=<descriptor>` (e.g. `http://user:pw@10.0.0.1:8080` or
//! `socks5://10.0.0.1:1080`). The descriptor is not validated here; a bad one
//! fails when the upstream adapter tries to connect through it.
use std::time::Duration;

use crate::core::query::QueryParams;

/// Query parameter carrying the proxy descriptor.
pub const PROXY_PARAM: &str = "proxy";
/// Timeout applied to proxied upstream calls unless configured otherwise.
pub const DEFAULT_PROXY_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Connection settings for a single proxied upstream call.
#[derive(Clone, PartialEq, Eq)]
pub struct OutboundConnectionConfig {
    pub proxy: String,
    pub timeout: Duration,
}

// Descriptors may embed credentials, so they stay out of Debug output.
impl std::fmt::Debug for OutboundConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundConnectionConfig")
            .field("proxy", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProxySelector {
    timeout: Duration,
}

impl ProxySelector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Split the proxy parameter off `query`.
    ///
    /// The parameter is always removed, even when empty, so it can never be
    /// forwarded or echoed into a link. Only a non-empty value yields a config.
    pub fn extract(&self, mut query: QueryParams) -> (QueryParams, Option<OutboundConnectionConfig>) {
        let config = query
            .remove(PROXY_PARAM)
            .map(|descriptor| descriptor.trim().to_string())
            .filter(|descriptor| !descriptor.is_empty())
            .map(|proxy| OutboundConnectionConfig {
                proxy,
                timeout: self.timeout,
            });
        (query, config)
    }
}

impl Default for ProxySelector {
    fn default() -> Self {
        Self::new(DEFAULT_PROXY_TIMEOUT)
    }
}
