use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use reqwest::{Client, Proxy, StatusCode};
use serde_json::Value;
use tracing::Instrument;
use url::{Url, form_urlencoded};

use crate::{
    config::models::UpstreamConfig,
    core::options::CallOptions,
    ports::app_store::{AppStore, Operation, UpstreamError, UpstreamResult},
    tracing_setup,
};

/// Upstream adapter speaking JSON over HTTP to an app-store metadata provider.
///
/// Every operation is `GET <base_url>/<operation>?<options>` and answers with a JSON
/// body. Unproxied calls share one pooled client; a call carrying proxy settings gets a
/// client of its own that is dropped with the call.
pub struct RemoteAppStore {
    base_url: Url,
    client: Client,
    user_agent: String,
    timeout: Duration,
}

impl RemoteAppStore {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.base_url)
            .wrap_err_with(|| format!("Invalid upstream base URL: {}", config.base_url))?;
        // Url::join replaces the last segment unless the path ends with a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .wrap_err("Failed to build upstream HTTP client")?;

        tracing::info!("Created upstream client for {}", base_url);
        Ok(Self {
            base_url,
            client,
            user_agent: config.user_agent.clone(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve the URL for `operation` with the options encoded as query pairs.
    fn endpoint(&self, operation: Operation, options: &CallOptions) -> UpstreamResult<Url> {
        let mut url = self
            .base_url
            .join(operation.as_str())
            .map_err(|e| UpstreamError::Connection(format!("Invalid upstream URL: {e}")))?;

        if !options.params().is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in options.params() {
                append_param(&mut pairs, key, value);
            }
        }
        Ok(url)
    }

    /// The shared client, or a dedicated one when the call goes through a proxy.
    fn client_for(&self, options: &CallOptions) -> UpstreamResult<Client> {
        let Some(connection) = options.request_options() else {
            return Ok(self.client.clone());
        };

        let proxy = Proxy::all(connection.proxy.as_str()).map_err(|e| {
            tracing::warn!(error = %e, "Rejected proxy descriptor");
            UpstreamError::MalformedProxy("proxy descriptor could not be parsed".to_string())
        })?;

        Client::builder()
            .proxy(proxy)
            .timeout(connection.timeout)
            .user_agent(self.user_agent.as_str())
            .build()
            .map_err(|e| {
                tracing::warn!(error = %e, "Failed to build proxied client");
                UpstreamError::MalformedProxy("proxy connection could not be configured".to_string())
            })
    }

    async fn call(&self, operation: Operation, options: CallOptions) -> UpstreamResult<Value> {
        let url = self.endpoint(operation, &options)?;
        let client = self.client_for(&options)?;
        let timeout = options
            .request_options()
            .map_or(self.timeout, |connection| connection.timeout);
        let proxied = options.request_options().is_some();

        let span = tracing_setup::create_upstream_span(operation.as_str(), self.base_url.as_str());
        async move {
            tracing::info!(proxied, "Sending upstream request: GET {}", url);

            let response = client
                .get(url)
                .send()
                .await
                .map_err(|e| map_transport_error(e, timeout))?;

            let status = response.status();
            tracing::Span::current().record("http.status_code", status.as_u16());

            if status.is_success() {
                return response.json::<Value>().await.map_err(|e| {
                    let e = e.without_url();
                    tracing::warn!(error = %e, "Upstream returned a non-JSON body");
                    UpstreamError::MalformedResponse(e.to_string())
                });
            }

            let message = error_message(status, response).await;
            tracing::warn!(status = status.as_u16(), "Upstream error: {}", message);
            if status == StatusCode::NOT_FOUND {
                Err(UpstreamError::NotFound(message))
            } else {
                Err(UpstreamError::Status {
                    status: status.as_u16(),
                    message,
                })
            }
        }
        .instrument(span)
        .await
    }

    async fn call_sequence(
        &self,
        operation: Operation,
        options: CallOptions,
    ) -> UpstreamResult<Vec<Value>> {
        match self.call(operation, options).await? {
            Value::Array(items) => Ok(items),
            other => Err(UpstreamError::MalformedResponse(format!(
                "{operation} expected a JSON array, got {}",
                json_kind(&other)
            ))),
        }
    }
}

#[async_trait]
impl AppStore for RemoteAppStore {
    async fn search(&self, options: CallOptions) -> UpstreamResult<Vec<Value>> {
        self.call_sequence(Operation::Search, options).await
    }

    async fn suggest(&self, options: CallOptions) -> UpstreamResult<Vec<String>> {
        self.call_sequence(Operation::Suggest, options)
            .await?
            .into_iter()
            .map(|term| match term {
                Value::String(term) => Ok(term),
                other => Err(UpstreamError::MalformedResponse(format!(
                    "suggest expected strings, got {}",
                    json_kind(&other)
                ))),
            })
            .collect()
    }

    async fn list(&self, options: CallOptions) -> UpstreamResult<Vec<Value>> {
        self.call_sequence(Operation::List, options).await
    }

    async fn app(&self, options: CallOptions) -> UpstreamResult<Value> {
        self.call(Operation::App, options).await
    }

    async fn similar(&self, options: CallOptions) -> UpstreamResult<Vec<Value>> {
        self.call_sequence(Operation::Similar, options).await
    }

    async fn permissions(&self, options: CallOptions) -> UpstreamResult<Vec<Value>> {
        self.call_sequence(Operation::Permissions, options).await
    }

    async fn reviews(&self, options: CallOptions) -> UpstreamResult<Vec<Value>> {
        self.call_sequence(Operation::Reviews, options).await
    }

    async fn developer(&self, options: CallOptions) -> UpstreamResult<Vec<Value>> {
        self.call_sequence(Operation::Developer, options).await
    }

    async fn categories(&self, options: CallOptions) -> UpstreamResult<Value> {
        self.call(Operation::Categories, options).await
    }
}

/// Encode one option. Arrays become repeated keys, objects are sent as JSON text
/// and nulls are left out.
fn append_param(pairs: &mut form_urlencoded::Serializer<'_, url::UrlQuery<'_>>, key: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => {
            pairs.append_pair(key, s);
        }
        Value::Bool(_) | Value::Number(_) | Value::Object(_) => {
            pairs.append_pair(key, &value.to_string());
        }
        Value::Array(items) => {
            for item in items {
                append_param(pairs, key, item);
            }
        }
    }
}

/// Messages reach clients, so the provider URL and forwarded options are dropped.
fn map_transport_error(e: reqwest::Error, timeout: Duration) -> UpstreamError {
    let e = e.without_url();
    if e.is_timeout() {
        UpstreamError::Timeout(timeout.as_millis() as u64)
    } else if e.is_decode() {
        UpstreamError::MalformedResponse(e.to_string())
    } else {
        UpstreamError::Connection(describe(&e))
    }
}

/// The error and its sources joined into one line.
fn describe(e: &(dyn std::error::Error + 'static)) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Prefer a `message`/`error` field from a JSON error body, then the raw body,
/// then the status reason.
async fn error_message(status: StatusCode, response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(&body) {
        for key in ["message", "error"] {
            if let Some(Value::String(message)) = fields.get(key) {
                return message.clone();
            }
        }
    }
    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("Upstream error")
        .to_string()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
