//! Keyed record storage
//!
//! Every collection the ingester writes (pending locators, hydrated records)
//! is a map from [`Identifier`] to a JSON value. The hydration engine only
//! ever writes through [`RecordStore::insert_if_absent`], so a stored record
//! is never replaced by a later pass.

pub mod memory;
pub mod sqlite;

use crate::error::Result;
use async_trait::async_trait;
use congress_common::Identifier;
use serde_json::Value;

pub use memory::MemoryStore;
pub use sqlite::{SqliteDatabase, SqliteTable};

/// Storage adapter for one keyed collection
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Whether a record exists under `id`
    async fn contains(&self, id: &Identifier) -> Result<bool>;

    async fn get(&self, id: &Identifier) -> Result<Option<Value>>;

    /// Store `value` unless `id` is already present.
    ///
    /// Returns `false` when a record already existed; the existing record is
    /// left untouched. Implementations must make the check and the write
    /// atomic.
    async fn insert_if_absent(&self, id: &Identifier, value: &Value) -> Result<bool>;

    /// Store `value`, replacing any existing record
    async fn upsert(&self, id: &Identifier, value: &Value) -> Result<()>;

    /// All records in insertion order
    async fn entries(&self) -> Result<Vec<(Identifier, Value)>>;

    async fn len(&self) -> Result<usize>;

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}
