use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{FromRequestParts, Path, State},
    http::{Request, StatusCode, Uri, header, request::Parts},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::{
    adapters::middleware::{
        request_id_middleware, request_timing_middleware, security_headers_middleware,
    },
    core::{
        GatewayError, GatewayService, IncomingRequest, QueryParams,
        envelope::{DeveloperApps, DeveloperGuidance, IndexLinks, ResultEnvelope},
        gateway::AppsResponse,
        url_builder::RequestOrigin,
    },
    ports::app_store::UpstreamError,
};

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// HTTP handler for the storegate REST API.
///
/// Holds the shared gateway service and is used as the router state, so every
/// route handler and the [`IncomingRequest`] extractor can reach it.
#[derive(Clone)]
pub struct HttpHandler {
    gateway_service: Arc<GatewayService>,
    default_scheme: Arc<str>,
}

impl HttpHandler {
    pub fn new(gateway_service: Arc<GatewayService>, default_scheme: impl Into<String>) -> Self {
        Self {
            gateway_service,
            default_scheme: default_scheme.into().into(),
        }
    }

    pub fn gateway_service(&self) -> &Arc<GatewayService> {
        &self.gateway_service
    }

    /// Build the full router: resource routes, the JSON 404 fallback and the
    /// middleware stack.
    pub fn into_router(self) -> Router {
        Router::new()
            .route("/", get(index))
            .route("/apps", get(apps))
            .route("/apps/", get(apps))
            .route("/apps/{app_id}", get(app_detail))
            .route("/apps/{app_id}/similar", get(similar))
            .route("/apps/{app_id}/permissions", get(permissions))
            .route("/apps/{app_id}/reviews", get(reviews))
            .route("/apps/{app_id}/reviews/", get(reviews))
            .route("/developers", get(developer_list))
            .route("/developers/", get(developer_list))
            .route("/developers/{dev_id}", get(developer))
            .route("/developers/{dev_id}/", get(developer))
            .route("/categories", get(categories))
            .route("/categories/", get(categories))
            .fallback(not_found)
            .with_state(self)
            .layer(middleware::from_fn(security_headers_middleware))
            .layer(middleware::from_fn(request_timing_middleware))
            .layer(middleware::from_fn(request_id_middleware))
            .layer(CompressionLayer::new())
            .layer(
                TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                    tracing::debug_span!(
                        "http",
                        method = %req.method(),
                        path = %req.uri().path(),
                    )
                }),
            )
    }
}

impl FromRequestParts<HttpHandler> for IncomingRequest {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpHandler,
    ) -> Result<Self, Self::Rejection> {
        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .filter(|host| !host.is_empty())
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(|authority| authority.to_string()))
            .ok_or(GatewayError::MissingHost)?;

        // first hop wins when a chain of proxies appended to the header
        let scheme = parts
            .headers
            .get(FORWARDED_PROTO)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|scheme| matches!(*scheme, "http" | "https"))
            .unwrap_or(state.default_scheme.as_ref());

        let query = parts.uri.query().map(QueryParams::parse).unwrap_or_default();

        Ok(IncomingRequest::new(RequestOrigin::new(scheme, host), query))
    }
}

/// Error responder: every failure becomes `{"error": "<message>"}`.
#[derive(Debug)]
pub struct ApiError(GatewayError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            GatewayError::MissingHost => StatusCode::BAD_REQUEST,
            GatewayError::Upstream(UpstreamError::NotFound(_)) => StatusCode::NOT_FOUND,
            GatewayError::Upstream(UpstreamError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(error: GatewayError) -> Self {
        Self(error)
    }
}

impl From<UpstreamError> for ApiError {
    fn from(error: UpstreamError) -> Self {
        Self(GatewayError::Upstream(error))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.0.to_string();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "Request failed: {}", message);
        } else {
            tracing::info!(status = status.as_u16(), "Request rejected: {}", message);
        }
        error_body(status, message)
    }
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn index(State(handler): State<HttpHandler>, request: IncomingRequest) -> Json<IndexLinks> {
    Json(handler.gateway_service.index(&request.origin))
}

async fn apps(
    State(handler): State<HttpHandler>,
    request: IncomingRequest,
) -> ApiResult<AppsResponse> {
    Ok(Json(handler.gateway_service.apps(&request).await?))
}

async fn app_detail(
    State(handler): State<HttpHandler>,
    Path(app_id): Path<String>,
    request: IncomingRequest,
) -> ApiResult<Value> {
    Ok(Json(handler.gateway_service.app(&request, &app_id).await?))
}

async fn similar(
    State(handler): State<HttpHandler>,
    Path(app_id): Path<String>,
    request: IncomingRequest,
) -> ApiResult<ResultEnvelope<Value>> {
    Ok(Json(handler.gateway_service.similar(&request, &app_id).await?))
}

async fn permissions(
    State(handler): State<HttpHandler>,
    Path(app_id): Path<String>,
    request: IncomingRequest,
) -> ApiResult<ResultEnvelope<Value>> {
    Ok(Json(
        handler
            .gateway_service
            .permissions(&request, &app_id)
            .await?,
    ))
}

async fn reviews(
    State(handler): State<HttpHandler>,
    Path(app_id): Path<String>,
    request: IncomingRequest,
) -> ApiResult<ResultEnvelope<Value>> {
    Ok(Json(handler.gateway_service.reviews(&request, &app_id).await?))
}

async fn developer_list(
    State(handler): State<HttpHandler>,
    request: IncomingRequest,
) -> Json<DeveloperGuidance> {
    Json(handler.gateway_service.developer_list(&request.origin))
}

async fn developer(
    State(handler): State<HttpHandler>,
    Path(dev_id): Path<String>,
    request: IncomingRequest,
) -> ApiResult<DeveloperApps> {
    Ok(Json(
        handler.gateway_service.developer(&request, &dev_id).await?,
    ))
}

async fn categories(
    State(handler): State<HttpHandler>,
    request: IncomingRequest,
) -> ApiResult<Value> {
    Ok(Json(handler.gateway_service.categories(&request).await?))
}

async fn not_found(uri: Uri) -> Response {
    tracing::debug!("No route for {}", uri.path());
    error_body(
        StatusCode::NOT_FOUND,
        format!("No resource at {}", uri.path()),
    )
}
