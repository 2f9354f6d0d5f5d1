//! SQLite-backed record store
//!
//! One database file holds every collection. Each collection is a table
//! with the schema
//!
//! ```sql
//! CREATE TABLE <name> (id TEXT PRIMARY KEY, body TEXT NOT NULL, stored_at TEXT NOT NULL)
//! ```
//!
//! where `body` is the record serialized as JSON. Entries come back in
//! rowid order, i.e. the order they were first inserted.

use super::RecordStore;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use chrono::Utc;
use congress_common::Identifier;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use tracing::debug;

/// Handle to the SQLite database file
#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open (creating if missing) the database at `path`
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        debug!(path = %path.display(), "Opened SQLite database");
        Ok(Self { pool })
    }

    /// Private in-memory database; a single connection keeps it alive
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    /// Open the named table, creating it on first use
    pub async fn table(&self, name: &str) -> Result<SqliteTable> {
        validate_table_name(name)?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {name} (
                id TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                stored_at TEXT NOT NULL
            )
            "#
        ))
        .execute(&self.pool)
        .await?;

        Ok(SqliteTable {
            pool: self.pool.clone(),
            name: name.to_string(),
        })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn validate_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(IngestError::store(format!("Invalid table name '{}'", name)))
    }
}

/// One named collection inside a [`SqliteDatabase`]
#[derive(Clone)]
pub struct SqliteTable {
    pool: SqlitePool,
    name: String,
}

fn decode_body(id: &str, body: &str) -> Result<Value> {
    serde_json::from_str(body)
        .map_err(|e| IngestError::store(format!("Corrupt record '{}': {}", id, e)))
}

#[async_trait]
impl RecordStore for SqliteTable {
    async fn contains(&self, id: &Identifier) -> Result<bool> {
        let row = sqlx::query(&format!("SELECT 1 FROM {} WHERE id = ?1", self.name))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn get(&self, id: &Identifier) -> Result<Option<Value>> {
        let row = sqlx::query(&format!("SELECT body FROM {} WHERE id = ?1", self.name))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let body: String = row.get("body");
                Ok(Some(decode_body(id.as_str(), &body)?))
            },
            None => Ok(None),
        }
    }

    async fn insert_if_absent(&self, id: &Identifier, value: &Value) -> Result<bool> {
        let result = sqlx::query(&format!(
            r#"
            INSERT INTO {} (id, body, stored_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO NOTHING
            "#,
            self.name
        ))
        .bind(id.as_str())
        .bind(serde_json::to_string(value)?)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn upsert(&self, id: &Identifier, value: &Value) -> Result<()> {
        sqlx::query(&format!(
            r#"
            INSERT INTO {} (id, body, stored_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                body = excluded.body,
                stored_at = excluded.stored_at
            "#,
            self.name
        ))
        .bind(id.as_str())
        .bind(serde_json::to_string(value)?)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn entries(&self) -> Result<Vec<(Identifier, Value)>> {
        let rows = sqlx::query(&format!("SELECT id, body FROM {} ORDER BY rowid", self.name))
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<(Identifier, Value)> {
                let id: String = row.get("id");
                let body: String = row.get("body");
                let value = decode_body(&id, &body)?;
                Ok((Identifier::new(id)?, value))
            })
            .collect()
    }

    async fn len(&self) -> Result<usize> {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS count FROM {}", self.name))
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.get("count");
        Ok(count as usize)
    }
}
