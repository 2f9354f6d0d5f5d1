//! API key loading
//!
//! Precedence: command-line flag, then `DATA_GOV_API_KEY`, then the
//! contents of `~/.data.gov.key`.

use crate::error::{IngestError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const API_KEY_ENV: &str = "DATA_GOV_API_KEY";
pub const API_KEY_FILE: &str = ".data.gov.key";

/// Resolve the data.gov API key
pub fn load_api_key(flag: Option<&str>) -> Result<String> {
    let env_value = std::env::var(API_KEY_ENV).ok();
    let key_path = dirs::home_dir().map(|home| home.join(API_KEY_FILE));
    resolve_api_key(flag, env_value.as_deref(), key_path.as_deref())
}

fn resolve_api_key(
    flag: Option<&str>,
    env_value: Option<&str>,
    key_path: Option<&Path>,
) -> Result<String> {
    if let Some(key) = non_empty(flag) {
        debug!("Using API key from command line");
        return Ok(key);
    }

    if let Some(key) = non_empty(env_value) {
        debug!(var = API_KEY_ENV, "Using API key from environment");
        return Ok(key);
    }

    if let Some(path) = key_path {
        if let Ok(contents) = std::fs::read_to_string(path) {
            if let Some(key) = non_empty(Some(&contents)) {
                debug!(path = %path.display(), "Using API key from file");
                return Ok(key);
            }
        }
    }

    let shown = key_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("~").join(API_KEY_FILE));
    Err(IngestError::Credentials(format!(
        "{} not found. Provide via --api-key, {} env var, or save it to {}",
        API_KEY_ENV,
        API_KEY_ENV,
        shown.display()
    )))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
