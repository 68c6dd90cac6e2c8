use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::core::{
    options::CallOptions,
    symbols::{EnumerationFamily, store_families},
};

/// Failure of an upstream provider call.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum UpstreamError {
    /// The provider (or the proxy in front of it) could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// The call did not complete in time
    #[error("Upstream timed out after {0} ms")]
    Timeout(u64),

    /// The requested app or developer does not exist
    #[error("{0}")]
    NotFound(String),

    /// The provider answered with an error status
    #[error("Upstream returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The provider answered with something we cannot interpret
    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    /// The client-supplied proxy descriptor could not be turned into a connection
    #[error("Invalid proxy descriptor: {0}")]
    MalformedProxy(String),
}

/// Result type alias for upstream calls
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// The provider operations, one per resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Search,
    Suggest,
    List,
    App,
    Similar,
    Permissions,
    Reviews,
    Developer,
    Categories,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Search => "search",
            Operation::Suggest => "suggest",
            Operation::List => "list",
            Operation::App => "app",
            Operation::Similar => "similar",
            Operation::Permissions => "permissions",
            Operation::Reviews => "reviews",
            Operation::Developer => "developer",
            Operation::Categories => "categories",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// AppStore defines the port (interface) to the app-store metadata provider.
///
/// Each method is a single attempt; implementations must not retry.
#[async_trait]
pub trait AppStore: Send + Sync + 'static {
    /// Full-text app search
    async fn search(&self, options: CallOptions) -> UpstreamResult<Vec<Value>>;

    /// Search term completions
    async fn suggest(&self, options: CallOptions) -> UpstreamResult<Vec<String>>;

    /// Collection listing (top free, top paid, ...)
    async fn list(&self, options: CallOptions) -> UpstreamResult<Vec<Value>>;

    /// Detail object for one app
    async fn app(&self, options: CallOptions) -> UpstreamResult<Value>;

    async fn similar(&self, options: CallOptions) -> UpstreamResult<Vec<Value>>;

    async fn permissions(&self, options: CallOptions) -> UpstreamResult<Vec<Value>>;

    /// One page of reviews
    async fn reviews(&self, options: CallOptions) -> UpstreamResult<Vec<Value>>;

    /// Apps published by one developer
    async fn developer(&self, options: CallOptions) -> UpstreamResult<Vec<Value>>;

    /// Category list, returned to clients as-is
    async fn categories(&self, options: CallOptions) -> UpstreamResult<Value>;

    /// Enumeration tables the provider accepts symbols from. Read once at startup.
    fn enumerations(&self) -> Vec<EnumerationFamily> {
        store_families()
    }
}
