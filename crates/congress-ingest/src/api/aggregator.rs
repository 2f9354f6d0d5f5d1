//! Paginated listing aggregation
//!
//! Listing endpoints return one page plus a `pagination` descriptor whose
//! `next` field points at the following page. [`fetch_all`] walks that chain
//! and concatenates every list-valued field into the first page.

use crate::api::transport::{QueryParams, Transport};
use crate::config::DEFAULT_PAGE_LIMIT;
use crate::error::{IngestError, Result};
use serde_json::{Map, Value};
use tracing::{debug, info};

pub const PAGINATION_KEY: &str = "pagination";

/// Echo of the request the API includes in every response
pub const REQUEST_KEY: &str = "request";

/// Progress through one paginated listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    /// Total count the API claims for the listing
    pub total: Option<u64>,
    pub retrieved: u64,
    /// Next page URL; `None` once exhausted
    pub next: Option<String>,
}

impl PaginationState {
    fn from_page(page: &Value, retrieved: u64) -> Self {
        let descriptor = page.get(PAGINATION_KEY);
        Self {
            total: descriptor.and_then(|p| p.get("count")).and_then(Value::as_u64),
            retrieved,
            next: next_pointer(page),
        }
    }

    /// Estimated page fetches left, given the page size
    pub fn remaining_fetches(&self, limit: u64) -> Option<u64> {
        let total = self.total?;
        Some(total.saturating_sub(self.retrieved) / limit.max(1) + 1)
    }
}

fn next_pointer(page: &Value) -> Option<String> {
    page.get(PAGINATION_KEY)
        .and_then(|p| p.get("next"))
        .and_then(Value::as_str)
        .filter(|next| !next.is_empty())
        .map(str::to_string)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Check that every top-level field other than `pagination` and `request`
/// holds an array, returning those field names in order.
pub fn validate_lists(object: &Map<String, Value>) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    for (key, value) in object {
        if key == PAGINATION_KEY || key == REQUEST_KEY {
            continue;
        }
        if !value.is_array() {
            return Err(IngestError::AggregationType {
                key: key.clone(),
                actual_type: json_type_name(value).to_string(),
            });
        }
        keys.push(key.clone());
    }
    Ok(keys)
}

/// Keys of a paginated response that must be concatenated across pages.
///
/// Returns an empty list for responses without a pagination descriptor.
/// Every top-level key other than `pagination` and `request` must hold an
/// array; anything else means the upstream schema changed.
pub fn aggregatable_keys(response: &Value) -> Result<Vec<String>> {
    match response.as_object() {
        Some(object) if object.contains_key(PAGINATION_KEY) => validate_lists(object),
        _ => Ok(Vec::new()),
    }
}

/// Fetch a single response without following `pagination.next`
pub async fn fetch_one<T>(transport: &T, url: &str, params: &QueryParams) -> Result<Value>
where
    T: Transport + ?Sized,
{
    transport.request(url, params).await
}

fn list_len(page: &Value, key: Option<&String>) -> u64 {
    key.and_then(|k| page.get(k))
        .and_then(Value::as_array)
        .map_or(0, |items| items.len() as u64)
}

/// Fetch `url` and every page chained from it, merged into one response.
///
/// Continuation URLs are followed as given; only the transport's API key is
/// added, not `params`.
pub async fn fetch_all<T>(transport: &T, url: &str, params: &QueryParams) -> Result<Value>
where
    T: Transport + ?Sized,
{
    let mut result = transport.request(url, params).await?;

    if result.get(PAGINATION_KEY).is_none() {
        debug!(url = %url, "Single-page response");
        return Ok(result);
    }

    let keys = aggregatable_keys(&result)?;
    let limit = params
        .get("limit")
        .and_then(|l| l.parse::<u64>().ok())
        .unwrap_or(u64::from(DEFAULT_PAGE_LIMIT));

    let mut state = PaginationState::from_page(&result, list_len(&result, keys.first()));

    while let Some(next_url) = state.next.take() {
        info!(
            retrieved = state.retrieved,
            total = state.total,
            remaining_fetches = state.remaining_fetches(limit),
            "Fetching next page"
        );

        let mut page = transport.request(&next_url, &QueryParams::new()).await?;
        // Continuation pages are checked even when they omit the descriptor
        match page.as_object() {
            Some(object) => {
                validate_lists(object)?;
            },
            None => return Err(IngestError::malformed("Continuation page is not an object")),
        }

        for key in &keys {
            let incoming = match page.get_mut(key).map(Value::take) {
                Some(Value::Array(items)) => items,
                _ => continue,
            };
            if let Some(Value::Array(accumulated)) = result.get_mut(key) {
                accumulated.extend(incoming);
            }
        }

        // Lists were moved out of `page`; its descriptor is still intact
        state = PaginationState {
            retrieved: list_len(&result, keys.first()),
            ..PaginationState::from_page(&page, 0)
        };
    }

    info!(retrieved = state.retrieved, total = state.total, "Listing complete");
    Ok(result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_without_pagination() {
        assert!(aggregatable_keys(&json!({"committee": {"name": "x"}})).unwrap().is_empty());
        assert!(aggregatable_keys(&json!([1, 2])).unwrap().is_empty());
    }

    #[test]
    fn test_keys_skip_descriptor_and_request() {
        let page = json!({
            "committeeMeetings": [],
            "pagination": {"count": 0},
            "request": {"chamber": "house"}
        });
        assert_eq!(aggregatable_keys(&page).unwrap(), vec!["committeeMeetings".to_string()]);
    }

    #[test]
    fn test_keys_reject_non_list() {
        let page = json!({"committees": {"oops": true}, "pagination": {}});
        match aggregatable_keys(&page).unwrap_err() {
            IngestError::AggregationType { key, actual_type } => {
                assert_eq!(key, "committees");
                assert_eq!(actual_type, "object");
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_lists_ignores_descriptor_presence() {
        let page = json!({"committeeMeetings": "oops"});
        let err = validate_lists(page.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, IngestError::AggregationType { ref key, .. } if key == "committeeMeetings"));

        let page = json!({"committeeMeetings": [1], "request": {"format": "json"}});
        assert_eq!(
            validate_lists(page.as_object().unwrap()).unwrap(),
            vec!["committeeMeetings".to_string()]
        );
    }

    #[test]
    fn test_remaining_fetches() {
        let state = PaginationState {
            total: Some(600),
            retrieved: 250,
            next: None,
        };
        assert_eq!(state.remaining_fetches(250), Some(2));
        assert_eq!(PaginationState { total: None, ..state }.remaining_fetches(250), None);
    }

    #[test]
    fn test_next_pointer_ignores_null() {
        assert_eq!(next_pointer(&json!({"pagination": {"next": null}})), None);
        assert_eq!(
            next_pointer(&json!({"pagination": {"next": "https://x/y?offset=2"}})).as_deref(),
            Some("https://x/y?offset=2")
        );
    }
}
