//! Ingest configuration
//!
//! API location, paging, retry pacing and the local database path.

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Congress.gov v3 API root
pub const DEFAULT_BASE_URL: &str = "https://api.congress.gov/v3/";

/// Locators starting with this prefix still need to be dereferenced
pub const DEFAULT_API_HOST: &str = "https://api.congress.gov";

/// Page size requested on listing calls (the API maximum)
pub const DEFAULT_PAGE_LIMIT: u32 = 250;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Pause before the alternate-format retry after an HTTP 500
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

pub const DEFAULT_DB_PATH: &str = "./data/congress.db";

/// Configuration for the ingest client and hydration passes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// API root that listing endpoints are joined onto
    pub base_url: String,

    /// Prefix identifying locators that belong to the API
    pub api_host: String,

    /// `limit` query parameter for listing calls
    pub page_limit: u32,

    /// HTTP client timeout in seconds
    pub timeout_secs: u64,

    /// Delay before retrying a record in the alternate format
    pub retry_delay_ms: u64,

    /// SQLite database file
    pub db_path: PathBuf,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_host: DEFAULT_API_HOST.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
        }
    }
}

impl IngestConfig {
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }

    /// Load configuration from environment variables
    ///
    /// - `CONGRESS_API_BASE_URL`
    /// - `CONGRESS_API_HOST`
    /// - `CONGRESS_PAGE_LIMIT`
    /// - `CONGRESS_API_TIMEOUT_SECS`
    /// - `CONGRESS_RETRY_DELAY_MS`
    /// - `CONGRESS_DB_PATH`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("CONGRESS_API_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(host) = std::env::var("CONGRESS_API_HOST") {
            config.api_host = host;
        }
        if let Ok(limit) = std::env::var("CONGRESS_PAGE_LIMIT") {
            config.page_limit = parse_var("CONGRESS_PAGE_LIMIT", &limit)?;
        }
        if let Ok(secs) = std::env::var("CONGRESS_API_TIMEOUT_SECS") {
            config.timeout_secs = parse_var("CONGRESS_API_TIMEOUT_SECS", &secs)?;
        }
        if let Ok(ms) = std::env::var("CONGRESS_RETRY_DELAY_MS") {
            config.retry_delay_ms = parse_var("CONGRESS_RETRY_DELAY_MS", &ms)?;
        }
        if let Ok(path) = std::env::var("CONGRESS_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url)
            .map_err(|e| IngestError::config(format!("Invalid base URL '{}': {}", self.base_url, e)))?;

        if self.api_host.is_empty() {
            return Err(IngestError::config("API host cannot be empty"));
        }
        if self.page_limit == 0 {
            return Err(IngestError::config("Page limit must be greater than 0"));
        }
        if self.timeout_secs == 0 {
            return Err(IngestError::config("Timeout must be greater than 0"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Absolute URL for an API path such as `committee-meeting/119/house`
    pub fn endpoint_url(&self, path: &str) -> Result<String> {
        let mut base = self.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let joined = url::Url::parse(&base)?.join(path.trim_start_matches('/'))?;
        Ok(joined.to_string())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| IngestError::config(format!("{} has an invalid value: '{}'", name, value)))
}

/// Builder for IngestConfig
#[derive(Debug, Default)]
pub struct IngestConfigBuilder {
    base_url: Option<String>,
    api_host: Option<String>,
    page_limit: Option<u32>,
    timeout_secs: Option<u64>,
    retry_delay_ms: Option<u64>,
    db_path: Option<PathBuf>,
}

impl IngestConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn api_host(mut self, host: impl Into<String>) -> Self {
        self.api_host = Some(host.into());
        self
    }

    pub fn page_limit(mut self, limit: u32) -> Self {
        self.page_limit = Some(limit);
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn retry_delay_ms(mut self, ms: u64) -> Self {
        self.retry_delay_ms = Some(ms);
        self
    }

    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    pub fn build(self) -> IngestConfig {
        let default = IngestConfig::default();

        IngestConfig {
            base_url: self.base_url.unwrap_or(default.base_url),
            api_host: self.api_host.unwrap_or(default.api_host),
            page_limit: self.page_limit.unwrap_or(default.page_limit),
            timeout_secs: self.timeout_secs.unwrap_or(default.timeout_secs),
            retry_delay_ms: self.retry_delay_ms.unwrap_or(default.retry_delay_ms),
            db_path: self.db_path.unwrap_or(default.db_path),
        }
    }
}
