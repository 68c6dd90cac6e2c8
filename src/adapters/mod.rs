pub mod app_store_client;
pub mod http_handler;
pub mod middleware;

/// Re-export commonly used types from adapters
pub use app_store_client::RemoteAppStore;
pub use http_handler::{ApiError, HttpHandler};
pub use middleware::*;
