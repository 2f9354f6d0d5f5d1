//! Error types for congress ingestion
//!
//! The hydration engine classifies failures by variant: HTTP status errors
//! decide retry, halt, or abort; everything else defers a single record.

use congress_common::{CommonError, Identifier};
use thiserror::Error;

/// Result type alias for ingest operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Error type for transport, aggregation, persistence and hydration
#[derive(Error, Debug)]
pub enum IngestError {
    /// Non-2xx response from the API
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Connection, TLS, or timeout failure before a status was received
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Body was neither JSON nor XML with the expected root, or lacked the detail key
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// An aggregatable field of a paginated response was not a list
    #[error("Type of {key} ({actual_type}) cannot be aggregated")]
    AggregationType { key: String, actual_type: String },

    /// Unexpected HTTP failure during hydration; the pass is aborted
    #[error("Failed to fetch {identifier}: {source}")]
    FatalFetch {
        identifier: Identifier,
        source: Box<IngestError>,
    },

    /// Hydration pass halted by a rate limit; safe to resume later
    #[error("Rate limit hit while fetching {identifier} ({persisted} records persisted this pass)")]
    RateLimited {
        identifier: Identifier,
        persisted: usize,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] CommonError),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Credentials(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl IngestError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// HTTP status code, if this is a status-level failure
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }

    pub fn is_server_error(&self) -> bool {
        self.status() == Some(500)
    }
}
