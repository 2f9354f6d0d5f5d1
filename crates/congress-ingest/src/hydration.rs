//! Resumable detail hydration
//!
//! Listing endpoints only return a summary and a locator per record. The
//! [`HydrationEngine`] walks a list of [`PendingReference`]s in order,
//! fetches each locator, and stores the detail payload under the record's
//! identifier. A pass can be interrupted at any point (rate limit, crash,
//! Ctrl-C); rerunning it with the same pending list picks up where the store
//! left off, because anything already stored is skipped.
//!
//! Failure handling per record:
//!
//! | Failure | Result |
//! |---|---|
//! | HTTP 429 | the pass halts, nothing further is attempted |
//! | first HTTP 500 | wait, then retry once with `format=xml` |
//! | any other HTTP status, or a second 500 | the pass aborts with [`IngestError::FatalFetch`] |
//! | network error, undecodable body, missing detail key, failed write | record is deferred, the pass continues |

use crate::api::transport::{alternate_format_locator, QueryParams, Transport, XML_ROOT_KEY};
use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use crate::progress;
use crate::store::RecordStore;
use congress_common::Identifier;
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A listing entry still waiting for its detail payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReference {
    pub identifier: Identifier,
    /// Detail URL as handed out by the listing
    pub locator: String,
}

impl PendingReference {
    pub fn new(identifier: Identifier, locator: impl Into<String>) -> Self {
        Self {
            identifier,
            locator: locator.into(),
        }
    }
}

/// Whether an item already used its alternate-format retry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryMarker {
    #[default]
    NotRetried,
    RetriedOnce,
}

/// How a single item was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Persisted,
    Skipped,
    Deferred,
}

/// How a pass ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// Every item was visited
    Drained,
    /// Stopped at `identifier` by a rate limit
    Halted { identifier: Identifier },
}

/// Summary of one hydration pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HydrationReport {
    pub outcome: PassOutcome,
    pub total: usize,
    pub persisted: usize,
    pub skipped: usize,
    /// Identifiers left for a later pass, in visit order
    pub deferred: Vec<Identifier>,
}

impl HydrationReport {
    fn new(total: usize) -> Self {
        Self {
            outcome: PassOutcome::Drained,
            total,
            persisted: 0,
            skipped: 0,
            deferred: Vec::new(),
        }
    }

    fn record(&mut self, identifier: Identifier, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Persisted => self.persisted += 1,
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Deferred => self.deferred.push(identifier),
        }
    }

    /// Turn a halted pass into [`IngestError::RateLimited`]
    pub fn into_result(self) -> Result<Self> {
        if let PassOutcome::Halted { identifier } = &self.outcome {
            return Err(IngestError::RateLimited {
                identifier: identifier.clone(),
                persisted: self.persisted,
            });
        }
        Ok(self)
    }
}

/// Settings for a [`HydrationEngine`]
#[derive(Debug, Clone)]
pub struct HydrationOptions {
    /// Locators outside this prefix are not fetched
    pub api_host: String,
    /// Pause before the alternate-format retry
    pub retry_delay: Duration,
    /// Key of the record inside a detail response, e.g. `committeeMeeting`
    pub detail_key: String,
    pub show_progress: bool,
}

impl HydrationOptions {
    pub fn from_config(config: &IngestConfig, detail_key: impl Into<String>) -> Self {
        Self {
            api_host: config.api_host.clone(),
            retry_delay: config.retry_delay(),
            detail_key: detail_key.into(),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }
}

#[derive(Debug)]
struct WorkItem {
    index: usize,
    reference: PendingReference,
    /// Locator for the next attempt; differs from the reference after a retry
    locator: String,
    marker: RetryMarker,
}

enum Step {
    Resolved(Identifier, ItemOutcome),
    Retry(WorkItem),
    Halt(Identifier),
}

/// Sequential fetch-and-store loop over pending references
pub struct HydrationEngine {
    transport: Arc<dyn Transport>,
    store: Arc<dyn RecordStore>,
    options: HydrationOptions,
}

impl HydrationEngine {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn RecordStore>,
        options: HydrationOptions,
    ) -> Self {
        Self {
            transport,
            store,
            options,
        }
    }

    /// Run one pass over `pending` in order.
    ///
    /// A rate limit ends the pass early with [`PassOutcome::Halted`]; an
    /// unexpected HTTP status or a failing store lookup is returned as an
    /// error. Records stored before either stay stored.
    pub async fn run(&self, pending: Vec<PendingReference>) -> Result<HydrationReport> {
        let total = pending.len();
        let mut report = HydrationReport::new(total);
        let mut queue: VecDeque<WorkItem> = pending
            .into_iter()
            .enumerate()
            .map(|(index, reference)| WorkItem {
                index,
                locator: reference.locator.clone(),
                reference,
                marker: RetryMarker::NotRetried,
            })
            .collect();

        info!(total, detail_key = %self.options.detail_key, "Starting hydration pass");
        let bar = progress::create_hydration_bar(total, self.options.show_progress);

        while let Some(item) = queue.pop_front() {
            match self.process(item, total, &bar).await {
                Ok(Step::Resolved(identifier, outcome)) => {
                    report.record(identifier, outcome);
                    bar.inc(1);
                },
                Ok(Step::Retry(item)) => queue.push_front(item),
                Ok(Step::Halt(identifier)) => {
                    bar.abandon();
                    warn!(
                        identifier = %identifier,
                        persisted = report.persisted,
                        "Rate limit hit; skipping remaining fetches"
                    );
                    report.outcome = PassOutcome::Halted { identifier };
                    return Ok(report);
                },
                Err(e) => {
                    bar.abandon();
                    return Err(e);
                },
            }
        }

        bar.finish_and_clear();
        info!(
            total = report.total,
            persisted = report.persisted,
            skipped = report.skipped,
            deferred = report.deferred.len(),
            "Hydration pass complete"
        );
        Ok(report)
    }

    async fn process(&self, item: WorkItem, total: usize, bar: &ProgressBar) -> Result<Step> {
        let identifier = item.reference.identifier.clone();

        let already_stored = self.store.contains(&identifier).await?;
        if already_stored || !item.locator.starts_with(&self.options.api_host) {
            return Ok(Step::Resolved(identifier, ItemOutcome::Skipped));
        }

        let message = progress::status_message(item.index, total, identifier.as_str());
        debug!(locator = %item.locator, "{}", message);
        bar.set_message(message);

        let fetched = self.transport.request(&item.locator, &QueryParams::new()).await;
        let body = match fetched {
            Ok(body) => body,
            Err(e) if e.is_rate_limited() => return Ok(Step::Halt(identifier)),
            Err(e) if e.is_server_error() && item.marker == RetryMarker::NotRetried => {
                return Ok(self.schedule_retry(item, &e).await);
            },
            Err(e @ IngestError::HttpStatus { .. }) => {
                return Err(IngestError::FatalFetch {
                    identifier,
                    source: Box::new(e),
                })
            },
            Err(e) => return Ok(self.defer(identifier, &item.locator, &e)),
        };

        let record = match extract_detail(body, &self.options.detail_key) {
            Ok(record) => record,
            Err(e) => return Ok(self.defer(identifier, &item.locator, &e)),
        };

        match self.store.insert_if_absent(&identifier, &record).await {
            Ok(true) => Ok(Step::Resolved(identifier, ItemOutcome::Persisted)),
            Ok(false) => Ok(Step::Resolved(identifier, ItemOutcome::Skipped)),
            Err(e) => Ok(self.defer(identifier, &item.locator, &e)),
        }
    }

    async fn schedule_retry(&self, item: WorkItem, cause: &IngestError) -> Step {
        let locator = match alternate_format_locator(&item.locator) {
            Ok(locator) => locator,
            Err(e) => return self.defer(item.reference.identifier, &item.locator, &e),
        };

        info!(
            identifier = %item.reference.identifier,
            error = %cause,
            "Server error; trying XML instead"
        );
        tokio::time::sleep(self.options.retry_delay).await;

        Step::Retry(WorkItem {
            locator,
            marker: RetryMarker::RetriedOnce,
            ..item
        })
    }

    fn defer(&self, identifier: Identifier, locator: &str, error: &IngestError) -> Step {
        warn!(
            identifier = %identifier,
            locator = %locator,
            error = %error,
            "Unexpected error while fetching; deferring"
        );
        Step::Resolved(identifier, ItemOutcome::Deferred)
    }
}

/// Pull the record out of a detail response, unwrapping the XML root first
pub fn extract_detail(mut body: Value, detail_key: &str) -> Result<Value> {
    if let Some(root) = body.get_mut(XML_ROOT_KEY).map(Value::take) {
        body = root;
    }

    match body.get_mut(detail_key).map(Value::take) {
        Some(record @ Value::Object(_)) => Ok(record),
        Some(_) => Err(IngestError::malformed(format!("'{}' is not an object", detail_key))),
        None => Err(IngestError::malformed(format!("Response has no '{}' key", detail_key))),
    }
}
