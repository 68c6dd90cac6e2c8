//! Options forwarded with each upstream call.
use serde_json::{Map, Value};

use crate::core::proxy::OutboundConnectionConfig;

/// Option map for one upstream call, plus the optional proxy settings that go
/// with it. The proxy settings are never part of `params`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOptions {
    params: Map<String, Value>,
    request_options: Option<OutboundConnectionConfig>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single option, replacing any previous value.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Merge `params` over the current options; incoming keys win.
    pub fn merge(mut self, params: Map<String, Value>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn with_request_options(mut self, config: Option<OutboundConnectionConfig>) -> Self {
        self.request_options = config;
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    pub fn request_options(&self) -> Option<&OutboundConnectionConfig> {
        self.request_options.as_ref()
    }
}
