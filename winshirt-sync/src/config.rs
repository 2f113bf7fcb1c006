//! Sync configuration.

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use winshirt_model::Table;
use winshirt_storage::LocalCache;

/// Records per upsert call when a table is pushed in batches.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Configuration for the remote store client and the sync engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the hosted backend (e.g., "https://xyz.supabase.co").
    pub remote_url: String,

    /// Public (anon) API key sent with every request.
    pub anon_key: String,

    /// Records per upsert call for batched tables.
    pub batch_size: usize,

    /// Upper bound for a single remote call, in seconds.
    pub request_timeout_secs: u64,

    /// Table counted by the connectivity probe.
    pub probe_table: Table,

    /// Optional cap on the local cache size in bytes.
    pub cache_quota_bytes: Option<u64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote_url: "http://localhost:54321".to_string(),
            anon_key: String::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            request_timeout_secs: 30,
            probe_table: Table::Products,
            cache_quota_bytes: Some(5 * 1024 * 1024), // browser storage default
        }
    }
}

impl SyncConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Opens the local cache with this configuration's quota. `None` keeps
    /// the cache in memory.
    pub fn open_cache(&self, path: Option<&Path>) -> SyncResult<LocalCache> {
        let cache = match path {
            Some(path) => LocalCache::open(path)?,
            None => LocalCache::open_in_memory()?,
        };
        Ok(match self.cache_quota_bytes {
            Some(bytes) => cache.with_quota(bytes),
            None => cache,
        })
    }

    /// Rejects configurations the client cannot work with.
    pub fn validate(&self) -> SyncResult<()> {
        if self.remote_url.trim().is_empty() {
            return Err(SyncError::Config("missing remote_url".to_string()));
        }
        if !self.remote_url.starts_with("http://") && !self.remote_url.starts_with("https://") {
            return Err(SyncError::Config(format!(
                "remote_url must be an http(s) URL, got {}",
                self.remote_url
            )));
        }
        if self.anon_key.trim().is_empty() {
            return Err(SyncError::Config("missing anon_key".to_string()));
        }
        if self.batch_size == 0 {
            return Err(SyncError::Config("batch_size must be at least 1".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(SyncError::Config("request_timeout_secs must be at least 1".to_string()));
        }
        Ok(())
    }
}
