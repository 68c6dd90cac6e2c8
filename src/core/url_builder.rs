//! Absolute URL reconstruction for links emitted in responses.
use crate::core::query::QueryParams;

/// Scheme and host a request was addressed to, as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    scheme: String,
    host: String,
}

impl RequestOrigin {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// `scheme://host/subpath` with duplicate slashes collapsed and `.` segments
    /// dropped. A trailing slash survives only when `subpath` carries one.
    pub fn absolute_url(&self, subpath: &str) -> String {
        format!("{}://{}", self.scheme, join_path(&self.host, subpath))
    }
}

/// Append `?query` to `url`; an empty query leaves the URL as it is.
pub fn with_query(url: &str, query: &QueryParams) -> String {
    if query.is_empty() {
        url.to_string()
    } else {
        format!("{url}?{}", query.to_query_string())
    }
}

/// Percent-encode an identifier for use as a single path segment.
pub fn escape_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

fn join_path(host: &str, subpath: &str) -> String {
    let joined = format!("{host}/{subpath}");
    let trailing = joined.ends_with('/') && !subpath.is_empty();
    let mut out = joined
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/");
    if trailing {
        out.push('/');
    }
    out
}
