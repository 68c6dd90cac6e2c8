//! storegate - a REST gateway over an app-store metadata provider.
//!
//! storegate exposes apps, reviews, developers and categories as browsable JSON resources.
//! It translates each inbound HTTP request into a single call on an upstream metadata
//! provider, then shapes the answer: results are wrapped in `{results: [...]}` envelopes,
//! paged resources get absolute `prev`/`next` links, and search suggestions link back to
//! a search for the suggested term.
//!
//! # Features
//! - Symbolic enumeration names (`category=GAME_ACTION`, `sort=NEWEST`) resolved to
//!   provider values before forwarding
//! - Offset (`start`/`num`) and page (`page`) pagination with a 500 result ceiling
//! - Per-request outbound proxy via the `proxy=<descriptor>` query parameter
//! - Structured tracing via `tracing`, request ids and graceful shutdown
//!
//! # Quick Example
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use storegate::{GatewayService, HttpHandler, RemoteAppStore, config::ServerConfig};
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let cfg: ServerConfig = storegate::config::loader::load_config("config.toml").await?;
//! let store = Arc::new(RemoteAppStore::new(&cfg.upstream)?);
//! let gateway = Arc::new(GatewayService::new(
//!     store,
//!     Duration::from_millis(cfg.upstream.proxy_timeout_ms),
//! ));
//! let router = HttpHandler::new(gateway, cfg.public_scheme.clone()).into_router();
//! let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
//! axum::serve(listener, router).await?;
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits) from **adapters** (implementations) while keeping
//! request shaping inside `core`. `core` never sees HTTP types: the axum adapter extracts an
//! [`IncomingRequest`] and serializes whatever the [`GatewayService`] returns.
//!
//! # Error Handling
//! Library errors are `thiserror` enums ([`UpstreamError`], [`GatewayError`]); startup and
//! configuration paths return `eyre::Result<T>` with `WrapErr` context.
pub mod config;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

pub mod adapters;
pub mod core;

// Re-export the specific types needed by the binary crate
pub use crate::{
    adapters::{HttpHandler, RemoteAppStore},
    core::{GatewayError, GatewayService, IncomingRequest},
    ports::{AppStore, UpstreamError},
    utils::GracefulShutdown,
};
