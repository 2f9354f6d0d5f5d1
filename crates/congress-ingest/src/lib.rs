//! Congress Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Incremental fetch-and-hydrate for the Congress.gov v3 API.
//!
//! # Overview
//!
//! - **API**: transport with XML fallback, pagination aggregation, listing calls
//! - **Store**: keyed record tables (in memory or SQLite)
//! - **Hydration**: resumable per-record detail fetching
//! - **Pipeline**: list → pending table → hydrate, per resource
//!
//! # Example
//!
//! ```no_run
//! use congress_common::{Chamber, CongressNumber};
//! use congress_ingest::{CongressClient, IngestConfig, Pipeline, Resource, SqliteDatabase, SyncMode};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::from_env()?;
//!     let db = SqliteDatabase::open(&config.db_path).await?;
//!     let client = CongressClient::with_api_key(config, "DEMO_KEY")?;
//!
//!     let resource = Resource::committee_meetings(CongressNumber::default(), Chamber::House);
//!     let report = Pipeline::new(client)
//!         .sync_database(&db, &resource, SyncMode::Auto)
//!         .await?;
//!     println!("{} persisted", report.hydration.persisted);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod credentials;
pub mod error;
pub mod hydration;
pub mod pipeline;
pub mod progress;
pub mod resources;
pub mod store;

pub use api::{CongressClient, HttpTransport, QueryParams, Transport};
pub use config::IngestConfig;
pub use error::{IngestError, Result};
pub use hydration::{
    HydrationEngine, HydrationOptions, HydrationReport, ItemOutcome, PassOutcome, PendingReference,
    RetryMarker,
};
pub use pipeline::{Pipeline, SyncMode, SyncReport};
pub use resources::Resource;
pub use store::{MemoryStore, RecordStore, SqliteDatabase, SqliteTable};
