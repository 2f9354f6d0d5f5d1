//! In-memory record store for tests and dry runs

use super::RecordStore;
use crate::error::Result;
use async_trait::async_trait;
use congress_common::Identifier;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    index: HashMap<Identifier, usize>,
    entries: Vec<(Identifier, Value)>,
}

/// Record store held entirely in memory
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn contains(&self, id: &Identifier) -> Result<bool> {
        Ok(self.inner.read().await.index.contains_key(id))
    }

    async fn get(&self, id: &Identifier) -> Result<Option<Value>> {
        let inner = self.inner.read().await;
        Ok(inner.index.get(id).map(|&pos| inner.entries[pos].1.clone()))
    }

    async fn insert_if_absent(&self, id: &Identifier, value: &Value) -> Result<bool> {
        let mut inner = self.inner.write().await;
        if inner.index.contains_key(id) {
            return Ok(false);
        }
        let pos = inner.entries.len();
        inner.entries.push((id.clone(), value.clone()));
        inner.index.insert(id.clone(), pos);
        Ok(true)
    }

    async fn upsert(&self, id: &Identifier, value: &Value) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.index.get(id).copied() {
            Some(pos) => inner.entries[pos].1 = value.clone(),
            None => {
                let pos = inner.entries.len();
                inner.entries.push((id.clone(), value.clone()));
                inner.index.insert(id.clone(), pos);
            },
        }
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<(Identifier, Value)>> {
        Ok(self.inner.read().await.entries.clone())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.inner.read().await.entries.len())
    }
}
