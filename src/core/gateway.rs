//! Core gateway orchestration service.
//!
//! `GatewayService` owns the startup-built symbol table, the proxy selector
//! and a handle to the upstream provider. It provides one operation per REST
//! resource, each following the same steps:
//! * strip the `proxy` parameter into per-call connection settings
//! * resolve enumeration symbols in the remaining query
//! * merge path identifiers and query into [`CallOptions`] and call upstream
//! * wrap the result and attach pagination links where the resource pages
//!
//! No HTTP types appear here; the axum adapter extracts an [`IncomingRequest`]
//! and serializes whatever these operations return.
use std::{sync::Arc, time::Duration};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    core::{
        envelope::{DeveloperApps, DeveloperGuidance, IndexLinks, ResultEnvelope, Suggestion},
        options::CallOptions,
        pagination::{offset_links, page_links},
        proxy::{OutboundConnectionConfig, ProxySelector},
        query::QueryParams,
        symbols::SymbolResolver,
        url_builder::{RequestOrigin, escape_segment, with_query},
    },
    ports::app_store::{AppStore, Operation, UpstreamError},
};

/// Developer id used in the `/developers/` guidance example.
const EXAMPLE_DEVELOPER: &str = "DxCo Games";

/// What the gateway needs to know about an inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingRequest {
    pub origin: RequestOrigin,
    pub query: QueryParams,
}

impl IncomingRequest {
    pub fn new(origin: RequestOrigin, query: QueryParams) -> Self {
        Self { origin, query }
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GatewayError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// No Host header and no authority in the request URI
    #[error("Cannot determine request host")]
    MissingHost,
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Which behaviour a request to `/apps/` asks for. Search wins over suggest,
/// suggest wins over the plain listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppsQuery {
    Search(String),
    Suggest(String),
    List,
}

impl AppsQuery {
    pub fn classify(query: &QueryParams) -> Self {
        if let Some(term) = query.get("q").filter(|q| !q.is_empty()) {
            AppsQuery::Search(term.to_string())
        } else if let Some(term) = query.get("suggest").filter(|s| !s.is_empty()) {
            AppsQuery::Suggest(term.to_string())
        } else {
            AppsQuery::List
        }
    }
}

/// Body of a `/apps/` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AppsResponse {
    Apps(ResultEnvelope<Value>),
    Suggestions(ResultEnvelope<Suggestion>),
}

/// A query split into what gets forwarded and what stays local.
struct PreparedQuery {
    /// Client query minus `proxy`, used to rebuild links.
    query: QueryParams,
    /// `query` with enumeration symbols resolved.
    resolved: Map<String, Value>,
    connection: Option<OutboundConnectionConfig>,
}

pub struct GatewayService {
    upstream: Arc<dyn AppStore>,
    resolver: SymbolResolver,
    proxy_selector: ProxySelector,
}

impl GatewayService {
    /// Build the service, reading the enumeration tables from `upstream` once.
    pub fn new(upstream: Arc<dyn AppStore>, proxy_timeout: Duration) -> Self {
        let resolver = SymbolResolver::new(upstream.enumerations());
        tracing::info!(
            "Symbol resolver ready with families: {}",
            resolver.family_names().join(", ")
        );
        Self::with_parts(upstream, resolver, ProxySelector::new(proxy_timeout))
    }

    pub fn with_parts(
        upstream: Arc<dyn AppStore>,
        resolver: SymbolResolver,
        proxy_selector: ProxySelector,
    ) -> Self {
        Self {
            upstream,
            resolver,
            proxy_selector,
        }
    }

    pub fn resolver(&self) -> &SymbolResolver {
        &self.resolver
    }

    fn prepare(&self, query: &QueryParams) -> PreparedQuery {
        let (query, connection) = self.proxy_selector.extract(query.clone());
        if connection.is_some() {
            tracing::debug!("Routing upstream call through client-supplied proxy");
        }
        let resolved = self.resolver.resolve_all(&query);
        PreparedQuery {
            query,
            resolved,
            connection,
        }
    }

    /// Identifiers first, then the resolved query over them.
    fn options(identifiers: CallOptions, prepared: &PreparedQuery) -> CallOptions {
        identifiers
            .merge(prepared.resolved.clone())
            .with_request_options(prepared.connection.clone())
    }

    fn log_call(operation: Operation, options: &CallOptions) {
        tracing::debug!(
            operation = %operation,
            proxied = options.request_options().is_some(),
            "Calling upstream with options: {:?}",
            options.params()
        );
    }

    /// `GET /`
    pub fn index(&self, origin: &RequestOrigin) -> IndexLinks {
        IndexLinks {
            apps: origin.absolute_url("apps"),
            developers: origin.absolute_url("developers"),
        }
    }

    /// `GET /apps/` — dispatches to search, suggest or list.
    pub async fn apps(&self, request: &IncomingRequest) -> GatewayResult<AppsResponse> {
        match AppsQuery::classify(&request.query) {
            AppsQuery::Search(term) => self.search(request, &term).await.map(AppsResponse::Apps),
            AppsQuery::Suggest(term) => self
                .suggest(request, &term)
                .await
                .map(AppsResponse::Suggestions),
            AppsQuery::List => self.list(request).await.map(AppsResponse::Apps),
        }
    }

    pub async fn search(
        &self,
        request: &IncomingRequest,
        term: &str,
    ) -> GatewayResult<ResultEnvelope<Value>> {
        let prepared = self.prepare(&request.query);
        let options = Self::options(CallOptions::new().with_param("term", term), &prepared);
        Self::log_call(Operation::Search, &options);

        let apps = self.upstream.search(options).await?;
        Ok(ResultEnvelope::new(apps))
    }

    /// Each suggested term links back to a search for it.
    pub async fn suggest(
        &self,
        request: &IncomingRequest,
        term: &str,
    ) -> GatewayResult<ResultEnvelope<Suggestion>> {
        let prepared = self.prepare(&request.query);
        let options = CallOptions::new()
            .with_param("term", term)
            .with_request_options(prepared.connection);
        Self::log_call(Operation::Suggest, &options);

        let terms = self.upstream.suggest(options).await?;
        let search_url = request.origin.absolute_url("/apps/");
        let suggestions = terms
            .into_iter()
            .map(|term| Suggestion {
                url: with_query(&search_url, &QueryParams::from([("q", term.as_str())])),
                term,
            })
            .collect();
        Ok(ResultEnvelope::new(suggestions))
    }

    /// Collection listing with offset pagination.
    pub async fn list(&self, request: &IncomingRequest) -> GatewayResult<ResultEnvelope<Value>> {
        let prepared = self.prepare(&request.query);
        let options = Self::options(CallOptions::new(), &prepared);
        Self::log_call(Operation::List, &options);

        let apps = self.upstream.list(options).await?;
        let links = offset_links(&request.origin.absolute_url("/apps/"), &prepared.query);
        Ok(ResultEnvelope::new(apps).with_links(links))
    }

    /// Raw upstream detail object.
    pub async fn app(&self, request: &IncomingRequest, app_id: &str) -> GatewayResult<Value> {
        let prepared = self.prepare(&request.query);
        let options = Self::options(CallOptions::new().with_param("appId", app_id), &prepared);
        Self::log_call(Operation::App, &options);

        Ok(self.upstream.app(options).await?)
    }

    pub async fn similar(
        &self,
        request: &IncomingRequest,
        app_id: &str,
    ) -> GatewayResult<ResultEnvelope<Value>> {
        let prepared = self.prepare(&request.query);
        let options = Self::options(CallOptions::new().with_param("appId", app_id), &prepared);
        Self::log_call(Operation::Similar, &options);

        let apps = self.upstream.similar(options).await?;
        Ok(ResultEnvelope::new(apps))
    }

    pub async fn permissions(
        &self,
        request: &IncomingRequest,
        app_id: &str,
    ) -> GatewayResult<ResultEnvelope<Value>> {
        let prepared = self.prepare(&request.query);
        let options = Self::options(CallOptions::new().with_param("appId", app_id), &prepared);
        Self::log_call(Operation::Permissions, &options);

        let permissions = self.upstream.permissions(options).await?;
        Ok(ResultEnvelope::new(permissions))
    }

    /// Reviews with page pagination; an empty page has no `next`.
    pub async fn reviews(
        &self,
        request: &IncomingRequest,
        app_id: &str,
    ) -> GatewayResult<ResultEnvelope<Value>> {
        let prepared = self.prepare(&request.query);
        let options = Self::options(CallOptions::new().with_param("appId", app_id), &prepared);
        Self::log_call(Operation::Reviews, &options);

        let reviews = self.upstream.reviews(options).await?;
        let base_url = request
            .origin
            .absolute_url(&format!("/apps/{}/reviews", escape_segment(app_id)));
        let links = page_links(&base_url, &prepared.query, reviews.len());
        Ok(ResultEnvelope::new(reviews).with_links(links))
    }

    pub async fn developer(
        &self,
        request: &IncomingRequest,
        dev_id: &str,
    ) -> GatewayResult<DeveloperApps> {
        let prepared = self.prepare(&request.query);
        let options = Self::options(CallOptions::new().with_param("devId", dev_id), &prepared);
        Self::log_call(Operation::Developer, &options);

        let apps = self.upstream.developer(options).await?;
        Ok(DeveloperApps {
            dev_id: dev_id.to_string(),
            apps,
        })
    }

    /// `GET /developers/` — there is no developer index upstream.
    pub fn developer_list(&self, origin: &RequestOrigin) -> DeveloperGuidance {
        DeveloperGuidance {
            message: "Please specify a developer id.".to_string(),
            example: origin.absolute_url(&format!(
                "/developers/{}",
                escape_segment(EXAMPLE_DEVELOPER)
            )),
        }
    }

    /// Upstream category list, unmodified.
    pub async fn categories(&self, request: &IncomingRequest) -> GatewayResult<Value> {
        let prepared = self.prepare(&request.query);
        let options = Self::options(CallOptions::new(), &prepared);
        Self::log_call(Operation::Categories, &options);

        Ok(self.upstream.categories(options).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::ports::app_store::UpstreamResult;

    /// Records the options of every call and answers with canned data.
    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<(Operation, CallOptions)>>,
        reviews: Vec<Value>,
    }

    impl RecordingStore {
        fn record(&self, operation: Operation, options: CallOptions) {
            self.calls.lock().unwrap().push((operation, options));
        }

        fn last(&self) -> (Operation, CallOptions) {
            self.calls.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl AppStore for RecordingStore {
        async fn search(&self, options: CallOptions) -> UpstreamResult<Vec<Value>> {
            self.record(Operation::Search, options);
            Ok(vec![json!({"appId": "com.found"})])
        }
        async fn suggest(&self, options: CallOptions) -> UpstreamResult<Vec<String>> {
            self.record(Operation::Suggest, options);
            Ok(vec!["panda pop".to_string(), "pandora".to_string()])
        }
        async fn list(&self, options: CallOptions) -> UpstreamResult<Vec<Value>> {
            self.record(Operation::List, options);
            Ok(vec![json!({"appId": "com.top"})])
        }
        async fn app(&self, options: CallOptions) -> UpstreamResult<Value> {
            self.record(Operation::App, options);
            Ok(json!({"appId": "com.example", "title": "Example"}))
        }
        async fn similar(&self, options: CallOptions) -> UpstreamResult<Vec<Value>> {
            self.record(Operation::Similar, options);
            Ok(vec![])
        }
        async fn permissions(&self, options: CallOptions) -> UpstreamResult<Vec<Value>> {
            self.record(Operation::Permissions, options);
            Ok(vec![json!("camera")])
        }
        async fn reviews(&self, options: CallOptions) -> UpstreamResult<Vec<Value>> {
            self.record(Operation::Reviews, options);
            Ok(self.reviews.clone())
        }
        async fn developer(&self, options: CallOptions) -> UpstreamResult<Vec<Value>> {
            self.record(Operation::Developer, options);
            Err(UpstreamError::NotFound("Developer not found".to_string()))
        }
        async fn categories(&self, options: CallOptions) -> UpstreamResult<Value> {
            self.record(Operation::Categories, options);
            Ok(json!(["GAME", "FAMILY"]))
        }
    }

    fn service(store: Arc<RecordingStore>) -> GatewayService {
        GatewayService::new(store, Duration::from_millis(10_000))
    }

    fn request(query: &str) -> IncomingRequest {
        IncomingRequest::new(
            RequestOrigin::new("http", "localhost:3000"),
            QueryParams::parse(query),
        )
    }

    #[test]
    fn test_apps_query_precedence() {
        assert_eq!(
            AppsQuery::classify(&QueryParams::parse("q=foo&suggest=bar")),
            AppsQuery::Search("foo".to_string())
        );
        assert_eq!(
            AppsQuery::classify(&QueryParams::parse("suggest=bar")),
            AppsQuery::Suggest("bar".to_string())
        );
        assert_eq!(
            AppsQuery::classify(&QueryParams::parse("q=&suggest=bar")),
            AppsQuery::Suggest("bar".to_string())
        );
        assert_eq!(
            AppsQuery::classify(&QueryParams::parse("num=10")),
            AppsQuery::List
        );
    }

    #[tokio::test]
    async fn test_search_forwards_term_and_resolved_params() {
        let store = Arc::new(RecordingStore::default());
        let gateway = service(store.clone());

        let response = gateway
            .apps(&request("q=maps&suggest=ma&age=NINE_UP"))
            .await
            .unwrap();

        assert!(matches!(response, AppsResponse::Apps(_)));
        let (operation, options) = store.last();
        assert_eq!(operation, Operation::Search);
        assert_eq!(options.get("term"), Some(&json!("maps")));
        assert_eq!(options.get("q"), Some(&json!("maps")));
        assert_eq!(options.get("age"), Some(&json!("AGE_RANGE3")));
    }

    #[tokio::test]
    async fn test_suggest_builds_search_links() {
        let store = Arc::new(RecordingStore::default());
        let gateway = service(store.clone());

        let envelope = gateway
            .suggest(&request("suggest=panda"), "panda")
            .await
            .unwrap();

        assert_eq!(
            envelope.results[0],
            Suggestion {
                term: "panda pop".to_string(),
                url: "http://localhost:3000/apps/?q=panda+pop".to_string(),
            }
        );
        let (_, options) = store.last();
        assert_eq!(options.params().len(), 1);
        assert_eq!(options.get("term"), Some(&json!("panda")));
    }

    #[tokio::test]
    async fn test_list_resolves_symbols_but_links_keep_client_values() {
        let store = Arc::new(RecordingStore::default());
        let gateway = service(store.clone());

        let envelope = gateway
            .list(&request("collection=TOP_FREE&category=GAME&start=60&num=60"))
            .await
            .unwrap();

        assert_eq!(
            envelope.links.prev.as_deref(),
            Some("http://localhost:3000/apps/?collection=TOP_FREE&category=GAME&start=0&num=60")
        );
        assert_eq!(
            envelope.links.next.as_deref(),
            Some("http://localhost:3000/apps/?collection=TOP_FREE&category=GAME&start=120&num=60")
        );
        let (operation, options) = store.last();
        assert_eq!(operation, Operation::List);
        assert_eq!(options.get("start"), Some(&json!("60")));
    }

    #[tokio::test]
    async fn test_proxy_is_consumed_before_forwarding() {
        let store = Arc::new(RecordingStore::default());
        let gateway = service(store.clone());

        let envelope = gateway
            .list(&request("proxy=http%3A%2F%2F10.1.1.1%3A3128&start=0"))
            .await
            .unwrap();

        let (_, options) = store.last();
        assert!(options.get("proxy").is_none());
        let connection = options.request_options().expect("proxy settings");
        assert_eq!(connection.proxy, "http://10.1.1.1:3128");
        assert_eq!(connection.timeout, Duration::from_millis(10_000));
        assert!(!envelope.links.next.unwrap().contains("proxy"));
    }

    #[tokio::test]
    async fn test_reviews_pagination_and_sort_resolution() {
        let store = Arc::new(RecordingStore {
            reviews: vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})],
            ..Default::default()
        });
        let gateway = service(store.clone());

        let envelope = gateway
            .reviews(&request("page=1&sort=NEWEST"), "com.example")
            .await
            .unwrap();

        assert_eq!(envelope.results.len(), 3);
        assert_eq!(
            envelope.links.prev.as_deref(),
            Some("http://localhost:3000/apps/com.example/reviews?page=0&sort=NEWEST")
        );
        assert_eq!(
            envelope.links.next.as_deref(),
            Some("http://localhost:3000/apps/com.example/reviews?page=2&sort=NEWEST")
        );
        let (_, options) = store.last();
        assert_eq!(options.get("appId"), Some(&json!("com.example")));
        assert_eq!(options.get("sort"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let store = Arc::new(RecordingStore::default());
        let gateway = service(store);

        let err = gateway
            .developer(&request(""), "Nobody")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Upstream(UpstreamError::NotFound(_))));
    }

    #[test]
    fn test_static_payloads() {
        let gateway = service(Arc::new(RecordingStore::default()));
        let origin = RequestOrigin::new("https", "store.example.com");

        let index = gateway.index(&origin);
        assert_eq!(index.apps, "https://store.example.com/apps");
        assert_eq!(index.developers, "https://store.example.com/developers");

        let guidance = gateway.developer_list(&origin);
        assert_eq!(guidance.message, "Please specify a developer id.");
        assert_eq!(
            guidance.example,
            "https://store.example.com/developers/DxCo%20Games"
        );
    }
}
