//! Response payload shapes.
use serde::Serialize;
use serde_json::Value;

use crate::core::pagination::PageLinks;

/// `{results: [...]}` with optional `prev`/`next` links.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEnvelope<T> {
    pub results: Vec<T>,
    #[serde(flatten)]
    pub links: PageLinks,
}

impl<T> ResultEnvelope<T> {
    pub fn new(results: Vec<T>) -> Self {
        Self {
            results,
            links: PageLinks::default(),
        }
    }

    pub fn with_links(mut self, links: PageLinks) -> Self {
        self.links = links;
        self
    }
}

/// One search suggestion, linking back to the search resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub term: String,
    pub url: String,
}

/// Root index of the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexLinks {
    pub apps: String,
    pub developers: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeveloperApps {
    #[serde(rename = "devId")]
    pub dev_id: String,
    pub apps: Vec<Value>,
}

/// Returned from `/developers/`, which cannot list every developer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeveloperGuidance {
    pub message: String,
    pub example: String,
}
