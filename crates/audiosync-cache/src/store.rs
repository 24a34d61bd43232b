//! On-disk cache format
//!
//! A single JSON file mapping cache keys to transcript entries. Entries are
//! small text blobs, so the whole map is rewritten on every update.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading or writing the cache file
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A cached transcript with its creation timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub text: String,
    pub created_at: String,
}

impl CacheEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

pub type Entries = HashMap<String, CacheEntry>;

/// Load all entries; a missing file is an empty cache, not an error.
pub fn load_entries(path: &Path) -> Result<Entries, CacheError> {
    if !path.exists() {
        return Ok(Entries::new());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write all entries back to disk.
pub fn save_entries(path: &Path, entries: &Entries) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(entries)?;
    std::fs::write(path, json)?;
    Ok(())
}
