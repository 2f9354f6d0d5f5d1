//! Typed entry points for the Congress.gov listing and detail endpoints

use crate::api::{aggregator, endpoints};
use crate::api::transport::{HttpTransport, QueryParams, Transport};
use crate::config::IngestConfig;
use crate::error::Result;
use congress_common::{Chamber, CongressNumber, Identifier};
use serde_json::Value;
use std::sync::Arc;

/// Client for the Congress.gov v3 API
///
/// Listing calls default to `format=json` and `limit=<page_limit>`; caller
/// overrides win over both.
#[derive(Clone)]
pub struct CongressClient {
    transport: Arc<dyn Transport>,
    config: IngestConfig,
}

impl CongressClient {
    /// Create a client over an arbitrary transport
    pub fn new(transport: Arc<dyn Transport>, config: IngestConfig) -> Self {
        Self { transport, config }
    }

    /// Create a client backed by [`HttpTransport`]
    pub fn with_api_key(config: IngestConfig, api_key: impl Into<String>) -> Result<Self> {
        let transport = HttpTransport::new(&config, api_key)?;
        Ok(Self::new(Arc::new(transport), config))
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Shared handle to the underlying transport
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// GET an API path, following pagination when `paginate` is set
    pub async fn get(&self, path: &str, overrides: &QueryParams, paginate: bool) -> Result<Value> {
        let url = self.config.endpoint_url(path)?;

        let mut params = QueryParams::new();
        params.insert("format".to_string(), "json".to_string());
        params.insert("limit".to_string(), self.config.page_limit.to_string());
        params.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));

        if paginate {
            aggregator::fetch_all(self.transport.as_ref(), &url, &params).await
        } else {
            aggregator::fetch_one(self.transport.as_ref(), &url, &params).await
        }
    }

    /// All committee meetings for a congress and chamber, every page merged
    pub async fn committee_meetings(
        &self,
        congress: CongressNumber,
        chamber: Chamber,
        overrides: &QueryParams,
    ) -> Result<Value> {
        let path = endpoints::committee_meetings_path(congress, chamber);
        self.get(&path, overrides, true).await
    }

    /// One committee meeting, without pagination
    pub async fn committee_meeting_details(
        &self,
        congress: CongressNumber,
        chamber: Chamber,
        event_id: &Identifier,
    ) -> Result<Value> {
        let path = endpoints::committee_meeting_details_path(congress, chamber, event_id);
        self.get(&path, &QueryParams::new(), false).await
    }

    /// All committees of a chamber; `nochamber` is rejected before any request
    pub async fn committees(&self, chamber: Chamber, overrides: &QueryParams) -> Result<Value> {
        let chamber = chamber.require_legislative("committees")?;
        let path = endpoints::committees_path(chamber);
        self.get(&path, overrides, true).await
    }

    pub async fn committee_details(&self, chamber: Chamber, system_code: &Identifier) -> Result<Value> {
        let chamber = chamber.require_legislative("committees")?;
        let path = endpoints::committee_details_path(chamber, system_code);
        self.get(&path, &QueryParams::new(), false).await
    }
}

impl std::fmt::Debug for CongressClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CongressClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}
