//! Download cache configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::cache;

/// Where the download cache lives and how long its records count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache file path; defaults to `~/.download_cache.json`
    pub cache_file: Option<PathBuf>,
    /// Age after which a kept-updated file is downloaded again
    #[serde(with = "humantime_serde")]
    pub expire_after: Duration,
    /// Age after which a record is dropped at startup
    #[serde(with = "humantime_serde")]
    pub retention: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_file: None,
            expire_after: cache::EXPIRE_AFTER,
            retention: cache::RETENTION,
        }
    }
}

impl CacheConfig {
    pub fn with_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_file = Some(path.into());
        self
    }

    pub fn with_expire_after(mut self, expire_after: Duration) -> Self {
        self.expire_after = expire_after;
        self
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }
}
