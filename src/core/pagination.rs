//! `prev`/`next` link synthesis.
//!
//! Two strategies with intentionally different stopping rules:
//! * [`offset_links`] (app listings) stops at a fixed provider ceiling and never
//!   looks at how many results came back.
//! * [`page_links`] (reviews) stops at the first empty page.
//!
//! Both rebuild the current URL from the client's own query, changing nothing
//! but the cursor field.
use serde::Serialize;

use crate::core::{query::QueryParams, url_builder::with_query};

/// Default `num` for listings.
pub const DEFAULT_PAGE_SIZE: i64 = 60;
/// The provider refuses offsets past this point.
pub const RESULT_CEILING: i64 = 500;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl PageLinks {
    pub fn is_empty(&self) -> bool {
        self.prev.is_none() && self.next.is_none()
    }
}

/// Read an integer cursor. Absent or empty yields `default`; anything that does
/// not parse yields `None`, which suppresses both links.
fn cursor(query: &QueryParams, key: &str, default: i64) -> Option<i64> {
    match query.get(key).map(str::trim) {
        None | Some("") => Some(default),
        Some(raw) => raw.parse().ok(),
    }
}

/// Offset pagination over `start`/`num`.
pub fn offset_links(base_url: &str, query: &QueryParams) -> PageLinks {
    let (Some(num), Some(start)) = (
        cursor(query, "num", DEFAULT_PAGE_SIZE),
        cursor(query, "start", 0),
    ) else {
        return PageLinks::default();
    };

    // cursors are client input; an overflowing step has no link
    let prev = start
        .checked_sub(num)
        .filter(|prev| *prev >= 0)
        .map(|prev| with_query(base_url, &query.with("start", prev)));
    let next = start
        .checked_add(num)
        .filter(|next| *next <= RESULT_CEILING)
        .map(|next| with_query(base_url, &query.with("start", next)));

    PageLinks { prev, next }
}

/// Page-number pagination over `page`; `result_count` is the size of the page
/// just fetched.
pub fn page_links(base_url: &str, query: &QueryParams, result_count: usize) -> PageLinks {
    let Some(page) = cursor(query, "page", 0) else {
        return PageLinks::default();
    };

    let prev = (page > 0)
        .then(|| page.checked_sub(1))
        .flatten()
        .map(|prev| with_query(base_url, &query.with("page", prev)));
    let next = (result_count > 0)
        .then(|| page.checked_add(1))
        .flatten()
        .map(|next| with_query(base_url, &query.with("page", next)));

    PageLinks { prev, next }
}
