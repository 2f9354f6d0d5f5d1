//! HTTP transport for the Congress.gov API
//!
//! Issues a single GET, merges query parameters, and decodes the body as
//! JSON or (as a fallback) XML. Retry policy belongs to callers.

use crate::api::xml;
use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use url::Url;

/// Query parameters keyed by name
pub type QueryParams = BTreeMap<String, String>;

pub const API_KEY_PARAM: &str = "api_key";
pub const FORMAT_PARAM: &str = "format";
pub const PRIMARY_FORMAT: &str = "json";
pub const ALTERNATE_FORMAT: &str = "xml";

/// Root element every XML response from the API is wrapped in
pub const XML_ROOT_KEY: &str = "api-root";

/// A single outbound request returning a parsed body
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url` with `params` merged into its query string.
    ///
    /// Fails with [`IngestError::HttpStatus`] on a non-2xx response and
    /// [`IngestError::MalformedResponse`] when the body cannot be decoded.
    async fn request(&self, url: &str, params: &QueryParams) -> Result<Value>;
}

/// reqwest-backed transport carrying the fixed API key
pub struct HttpTransport {
    client: Client,
    api_key: String,
}

impl HttpTransport {
    pub fn new(config: &IngestConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("congress-ingest/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, url: &str, params: &QueryParams) -> Result<Value> {
        debug!(url = %url, params = ?params, "Requesting");
        let request_url = build_request_url(url, params, &self.api_key)?;

        let response = self.client.get(request_url).send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "API returned error status");
            // Status must survive a failed body read
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        parse_body(&body)
    }
}

/// Merge query parameters into `url`.
///
/// Precedence, lowest to highest: the default `format=json`, pairs already
/// embedded in the URL, caller `params`, and the API key. Each name appears
/// once in the result.
pub fn build_request_url(url: &str, params: &QueryParams, api_key: &str) -> Result<Url> {
    let mut parsed = Url::parse(url)?;

    let mut merged = QueryParams::new();
    merged.insert(FORMAT_PARAM.to_string(), PRIMARY_FORMAT.to_string());
    for (name, value) in parsed.query_pairs() {
        merged.insert(name.into_owned(), value.into_owned());
    }
    merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged.insert(API_KEY_PARAM.to_string(), api_key.to_string());

    parsed.query_pairs_mut().clear().extend_pairs(merged.iter());
    Ok(parsed)
}

/// Decode a response body: JSON first, then XML wrapped under `api-root`
pub fn parse_body(body: &str) -> Result<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return Ok(value);
    }

    let document = xml::parse_document(body)
        .map_err(|e| IngestError::malformed(format!("Failed to parse XML: {}", e)))?;

    match document.get(XML_ROOT_KEY) {
        Some(_) => Ok(document),
        None => {
            let keys: Vec<&String> = document
                .as_object()
                .map(|m| m.keys().collect())
                .unwrap_or_default();
            Err(IngestError::malformed(format!("Invalid XML with keys: {:?}", keys)))
        },
    }
}

/// Rewrite a locator's `format` parameter to the alternate wire format
pub fn alternate_format_locator(locator: &str) -> Result<String> {
    let mut parsed = Url::parse(locator)?;

    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    match pairs.iter_mut().find(|(name, _)| name == FORMAT_PARAM) {
        Some((_, value)) => *value = ALTERNATE_FORMAT.to_string(),
        None => pairs.push((FORMAT_PARAM.to_string(), ALTERNATE_FORMAT.to_string())),
    }

    parsed.query_pairs_mut().clear().extend_pairs(pairs.iter());
    Ok(parsed.to_string())
}
