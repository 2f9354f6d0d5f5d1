//! List → pending table → hydrate
//!
//! A sync first makes sure the resource's pending table holds the locators
//! from its listing, then runs a hydration pass over them against the
//! records table. Both tables live in the same store, so an interrupted sync
//! resumes without listing again.

use crate::api::{CongressClient, QueryParams};
use crate::error::Result;
use crate::hydration::{HydrationEngine, HydrationOptions, HydrationReport, PendingReference};
use crate::progress;
use crate::resources::{pending_from_listing, Resource};
use crate::store::{RecordStore, SqliteDatabase};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// How a sync obtains its pending references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SyncMode {
    /// List only when nothing is pending yet
    #[default]
    Auto,
    /// Always list again, merging into the pending table
    Refresh,
    /// Never list; hydrate what is already pending
    Resume,
}

/// Result of one sync
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub resource: Resource,
    /// Entries returned by the listing, if one was made
    pub listed: Option<usize>,
    pub hydration: HydrationReport,
}

pub struct Pipeline {
    client: CongressClient,
    show_progress: bool,
}

impl Pipeline {
    pub fn new(client: CongressClient) -> Self {
        Self {
            client,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn client(&self) -> &CongressClient {
        &self.client
    }

    /// Fetch the full listing and upsert its locators into `pending_store`
    pub async fn refresh_pending(
        &self,
        resource: &Resource,
        pending_store: &dyn RecordStore,
    ) -> Result<Vec<PendingReference>> {
        let spinner = progress::create_spinner(&format!("Listing {}", resource), self.show_progress);

        let listing = match *resource {
            Resource::CommitteeMeetings { congress, chamber } => {
                self.client
                    .committee_meetings(congress, chamber, &QueryParams::new())
                    .await
            },
            Resource::Committees { chamber } => {
                self.client.committees(chamber, &QueryParams::new()).await
            },
        };
        spinner.finish_and_clear();
        let listing = listing?;

        let pending = pending_from_listing(resource, &listing);
        for reference in &pending {
            pending_store
                .upsert(&reference.identifier, &Value::String(reference.locator.clone()))
                .await?;
        }

        info!(resource = %resource, listed = pending.len(), "Recorded pending references");
        Ok(pending)
    }

    /// Rebuild the pending list from `pending_store` without a network call
    pub async fn load_pending(pending_store: &dyn RecordStore) -> Result<Vec<PendingReference>> {
        let entries = pending_store.entries().await?;

        let mut pending = Vec::with_capacity(entries.len());
        for (identifier, value) in entries {
            match value {
                Value::String(locator) => pending.push(PendingReference::new(identifier, locator)),
                other => warn!(identifier = %identifier, value = %other, "Ignoring non-string locator"),
            }
        }
        Ok(pending)
    }

    /// Bring `resource` up to date in the given stores
    pub async fn sync(
        &self,
        resource: &Resource,
        mode: SyncMode,
        pending_store: Arc<dyn RecordStore>,
        records_store: Arc<dyn RecordStore>,
    ) -> Result<SyncReport> {
        let list_first = match mode {
            SyncMode::Refresh => true,
            SyncMode::Resume => false,
            SyncMode::Auto => pending_store.is_empty().await?,
        };

        let (listed, pending) = if list_first {
            let pending = self.refresh_pending(resource, pending_store.as_ref()).await?;
            (Some(pending.len()), Self::load_pending(pending_store.as_ref()).await?)
        } else {
            (None, Self::load_pending(pending_store.as_ref()).await?)
        };

        info!(
            resource = %resource,
            mode = ?mode,
            pending = pending.len(),
            "Hydrating"
        );

        let options = HydrationOptions::from_config(self.client.config(), resource.detail_key())
            .with_progress(self.show_progress);
        let engine = HydrationEngine::new(self.client.transport(), records_store, options);
        let hydration = engine.run(pending).await?;

        Ok(SyncReport {
            resource: *resource,
            listed,
            hydration,
        })
    }

    /// [`sync`](Self::sync) against the resource's tables in `db`
    pub async fn sync_database(
        &self,
        db: &SqliteDatabase,
        resource: &Resource,
        mode: SyncMode,
    ) -> Result<SyncReport> {
        let pending = db.table(&resource.pending_table()).await?;
        let records = db.table(resource.records_table()).await?;
        self.sync(resource, mode, Arc::new(pending), Arc::new(records)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::api::Transport;
    use crate::config::IngestConfig;
    use crate::error::IngestError;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use congress_common::{Chamber, Identifier};
    use serde_json::json;
    use std::sync::Mutex;

    /// Serves one listing page and a detail body for every other URL
    #[derive(Default)]
    struct FakeApi {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Transport for FakeApi {
        async fn request(&self, url: &str, _params: &QueryParams) -> Result<Value> {
            self.calls.lock().unwrap().push(url.to_string());
            if url.ends_with("/committee/house") {
                return Ok(json!({
                    "committees": [
                        {"systemCode": "hsag00", "url": "https://api.congress.gov/v3/committee/house/hsag00?format=json"},
                        {"systemCode": "hsap00", "url": "https://api.congress.gov/v3/committee/house/hsap00?format=json"}
                    ],
                    "pagination": {"count": 2}
                }));
            }
            if url.contains("/committee/house/") {
                return Ok(json!({"committee": {"url": url}}));
            }
            Err(IngestError::HttpStatus {
                status: 404,
                body: String::new(),
            })
        }
    }

    fn pipeline(api: Arc<FakeApi>) -> Pipeline {
        let config = IngestConfig::builder().retry_delay_ms(0).build();
        Pipeline::new(CongressClient::new(api, config))
    }

    #[tokio::test]
    async fn test_auto_lists_once_then_resumes() {
        let api = Arc::new(FakeApi::default());
        let pipeline = pipeline(Arc::clone(&api));
        let resource = Resource::committees(Chamber::House).unwrap();
        let pending = Arc::new(MemoryStore::new());
        let records = Arc::new(MemoryStore::new());

        let report = pipeline
            .sync(&resource, SyncMode::Auto, pending.clone(), records.clone())
            .await
            .unwrap();
        assert_eq!(report.listed, Some(2));
        assert_eq!(report.hydration.persisted, 2);
        assert_eq!(api.calls.lock().unwrap().len(), 3);

        let report = pipeline
            .sync(&resource, SyncMode::Auto, pending, records)
            .await
            .unwrap();
        assert_eq!(report.listed, None);
        assert_eq!(report.hydration.skipped, 2);
        assert_eq!(api.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_resume_with_nothing_pending_is_a_no_op() {
        let api = Arc::new(FakeApi::default());
        let resource = Resource::committees(Chamber::House).unwrap();

        let report = pipeline(Arc::clone(&api))
            .sync(
                &resource,
                SyncMode::Resume,
                Arc::new(MemoryStore::new()),
                Arc::new(MemoryStore::new()),
            )
            .await
            .unwrap();

        assert_eq!(report.hydration.total, 0);
        assert!(api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_pending_ignores_non_strings() {
        let store = MemoryStore::new();
        store.upsert(&Identifier::from(1), &json!("https://api.congress.gov/v3/a")).await.unwrap();
        store.upsert(&Identifier::from(2), &json!({"url": "x"})).await.unwrap();

        let pending = Pipeline::load_pending(&store).await.unwrap();
        assert_eq!(pending, vec![PendingReference::new(Identifier::from(1), "https://api.congress.gov/v3/a")]);
    }
}
