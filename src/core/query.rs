//! Ordered, multi-valued query-string parameters.
//!
//! The gateway never mutates a client's query in place. Pagination and proxy
//! handling derive new [`QueryParams`] values instead, so the `prev` and `next`
//! links of one response are built from the same untouched input.
use url::form_urlencoded;

/// Query parameters in the order the client sent them. A key may repeat, which
/// is how list-valued parameters arrive on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` query string (without the `?`).
    pub fn parse(raw: &str) -> Self {
        form_urlencoded::parse(raw.as_bytes()).into_owned().collect()
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `key`, in order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// True when `key` is present with a non-empty first value.
    pub fn has_value(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }

    /// Append a value, keeping any existing ones.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Remove every occurrence of `key`, returning the first removed value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let mut removed = None;
        self.pairs.retain(|(k, v)| {
            if k == key {
                if removed.is_none() {
                    removed = Some(v.clone());
                }
                false
            } else {
                true
            }
        });
        removed
    }

    /// A copy with `key` set to the single value `value`.
    ///
    /// The first occurrence keeps its position and later duplicates are dropped;
    /// a missing key is appended. Every other pair is carried over untouched.
    pub fn with(&self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        let mut replaced = false;
        let mut pairs = Vec::with_capacity(self.pairs.len() + 1);
        for (k, v) in &self.pairs {
            if k == key {
                if !replaced {
                    pairs.push((k.clone(), value.clone()));
                    replaced = true;
                }
            } else {
                pairs.push((k.clone(), v.clone()));
            }
        }
        if !replaced {
            pairs.push((key.to_string(), value));
        }
        Self { pairs }
    }

    /// Distinct keys in order of first appearance.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for (k, _) in &self.pairs {
            if !keys.contains(&k.as_str()) {
                keys.push(k);
            }
        }
        keys
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Percent-encoded serialization preserving pair order.
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

impl FromIterator<(String, String)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for QueryParams {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect()
    }
}
