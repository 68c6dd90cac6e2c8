//! Axum middleware attached to every gateway route.
//!
//! Each function is a plain `from_fn` layer: request id propagation, request
//! timing and response hardening headers. None of them hold state.
use std::time::Instant;

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Instrument;

use crate::tracing_setup;

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Log start/end of a request including latency.
pub async fn request_timing_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    // path only, the query may carry a proxy descriptor
    let path = req.uri().path().to_string();
    let version = req.version();

    tracing::info!("Started processing {} {} {:?}", method, path, version);

    let response = next.run(req).await;
    let duration = start.elapsed();

    tracing::info!(
        "Completed {} {} {:?} - {} in {:?}",
        method,
        path,
        version,
        response.status(),
        duration
    );

    response
}

/// Add hardening headers to every response.
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}

/// Generate a per-request UUID, run the request inside a span carrying it and
/// expose it via `X-Request-ID`.
pub async fn request_id_middleware(req: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let start = Instant::now();

    let span = tracing_setup::create_request_span(
        req.method().as_str(),
        req.uri().path(),
        &request_id,
    );

    let mut response = next.run(req).instrument(span.clone()).await;

    span.record("http.status_code", response.status().as_u16());
    span.record("duration_ms", start.elapsed().as_millis() as u64);

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER, header_value);
    }

    response
}
