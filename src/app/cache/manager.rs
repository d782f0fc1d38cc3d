//! Download cache with atomic persistence
//!
//! The cache is a JSON document mapping absolute file paths to the time they
//! were last downloaded:
//!
//! ```json
//! { "files": { "/home/me/tools/app.zip": "2024-05-01T08:30:00Z" } }
//! ```
//!
//! It is read once when the manager is created and rewritten through a temp
//! file and rename after every change.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::config::CacheConfig;
use crate::constants::cache;
use crate::errors::{CacheError, CacheResult};

type Records = BTreeMap<PathBuf, DateTime<Utc>>;

#[derive(Debug, Default, Deserialize)]
struct CacheFile {
    #[serde(default)]
    files: Records,
}

#[derive(Serialize)]
struct CacheFileRef<'a> {
    files: &'a Records,
}

/// Records of when each downloaded file was last fetched
#[derive(Debug)]
pub struct CacheManager {
    config: CacheConfig,
    path: PathBuf,
    records: RwLock<Records>,
}

impl CacheManager {
    /// Open the cache file named by `config`, or the default one.
    ///
    /// A missing file is an empty cache. A file that cannot be parsed is
    /// logged and replaced on the next write.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if no location can be determined or the file
    /// exists but cannot be read
    pub async fn new(config: CacheConfig) -> CacheResult<Self> {
        let path = match &config.cache_file {
            Some(path) => path.clone(),
            None => Self::default_cache_file()?,
        };
        let records = Self::load(&path).await?;

        debug!(
            "Loaded {} download records from {}",
            records.len(),
            path.display()
        );

        Ok(Self {
            config,
            path,
            records: RwLock::new(records),
        })
    }

    /// `~/.download_cache.json`
    pub fn default_cache_file() -> CacheResult<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(cache::FILE_NAME))
            .ok_or(CacheError::NoHomeDirectory)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    async fn load(path: &Path) -> CacheResult<Records> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Records::new()),
            Err(source) => {
                return Err(CacheError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Records::new());
        }

        match serde_json::from_str::<CacheFile>(&content) {
            Ok(file) => Ok(file.files),
            Err(e) => {
                warn!(
                    "Ignoring unreadable download cache {}: {}",
                    path.display(),
                    e
                );
                Ok(Records::new())
            }
        }
    }

    async fn save(&self, records: &Records) -> CacheResult<()> {
        let content = serde_json::to_string_pretty(&CacheFileRef { files: records })?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let io_error = |source: std::io::Error| CacheError::Io {
            path: self.path.clone(),
            source,
        };

        fs::create_dir_all(&parent).await.map_err(io_error)?;
        let temp = tempfile::NamedTempFile::new_in(&parent).map_err(io_error)?;
        fs::write(temp.path(), content).await.map_err(io_error)?;
        temp.persist(&self.path)
            .map_err(|e| CacheError::PersistFailed {
                path: self.path.clone(),
                source: e.error,
            })?;
        Ok(())
    }

    /// Whether `file` is missing, unrecorded or last downloaded longer ago than the expiry
    pub async fn needs_update(&self, file: &Path) -> bool {
        if fs::metadata(file).await.is_err() {
            return true;
        }

        match self.last_download(file).await {
            Some(at) => is_older_than(Utc::now(), at, self.config.expire_after),
            None => true,
        }
    }

    pub async fn last_download(&self, file: &Path) -> Option<DateTime<Utc>> {
        let key = absolute_key(file);
        self.records.read().await.get(&key).copied()
    }

    /// Record that `file` was downloaded just now
    pub async fn record_download(&self, file: &Path) -> CacheResult<()> {
        self.record_download_at(file, Utc::now()).await
    }

    /// Record that `file` was downloaded at `at`
    pub async fn record_download_at(&self, file: &Path, at: DateTime<Utc>) -> CacheResult<()> {
        let key = absolute_key(file);
        let mut records = self.records.write().await;
        records.insert(key, at);
        self.save(&records).await
    }

    /// Drop records for files that no longer exist or are older than the retention period.
    ///
    /// Returns the number of records removed.
    pub async fn cleanup_expired(&self) -> CacheResult<usize> {
        let now = Utc::now();
        let mut records = self.records.write().await;

        let mut stale = Vec::new();
        for (path, at) in records.iter() {
            let missing = fs::metadata(path).await.is_err();
            if missing || is_older_than(now, *at, self.config.retention) {
                stale.push(path.clone());
            }
        }

        if stale.is_empty() {
            return Ok(0);
        }

        for path in &stale {
            records.remove(path);
        }
        self.save(&records).await?;

        info!("Removed {} stale download records", stale.len());
        Ok(stale.len())
    }

    /// All records, ordered by path
    pub async fn entries(&self) -> Vec<(PathBuf, DateTime<Utc>)> {
        self.records
            .read()
            .await
            .iter()
            .map(|(path, at)| (path.clone(), *at))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

/// Strictly older; timestamps in the future are never old
fn is_older_than(now: DateTime<Utc>, at: DateTime<Utc>, limit: Duration) -> bool {
    match now.signed_duration_since(at).to_std() {
        Ok(age) => age > limit,
        Err(_) => false,
    }
}

/// Absolute, lexically normalised form of `path` used as the record key
pub fn absolute_key(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut clean = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                clean.pop();
            }
            other => clean.push(other.as_os_str()),
        }
    }
    clean
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn manager_in(dir: &TempDir) -> CacheManager {
        CacheManager::new(CacheConfig::default().with_cache_file(dir.path().join("cache.json")))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_cache_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir).await;

        assert!(manager.is_empty().await);
        assert!(!manager.path().exists());
    }

    #[tokio::test]
    async fn test_record_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("tool.bin");
        std::fs::write(&file, b"data").unwrap();

        let manager = manager_in(&temp_dir).await;
        manager.record_download(&file).await.unwrap();
        assert!(!manager.needs_update(&file).await);

        // A fresh manager sees the persisted record
        let reloaded = manager_in(&temp_dir).await;
        assert_eq!(reloaded.len().await, 1);
        assert!(reloaded.last_download(&file).await.is_some());

        let content = std::fs::read_to_string(reloaded.path()).unwrap();
        assert!(content.contains("\"files\""));
    }

    #[tokio::test]
    async fn test_needs_update_after_expiry() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("list.txt");
        std::fs::write(&file, b"data").unwrap();

        let manager = manager_in(&temp_dir).await;
        assert!(manager.needs_update(&file).await, "unrecorded file");

        let two_days_ago = Utc::now() - chrono::Duration::hours(48);
        manager.record_download_at(&file, two_days_ago).await.unwrap();
        assert!(manager.needs_update(&file).await, "expired record");

        manager.record_download(&file).await.unwrap();
        assert!(!manager.needs_update(&file).await);

        std::fs::remove_file(&file).unwrap();
        assert!(manager.needs_update(&file).await, "missing file");
    }

    #[tokio::test]
    async fn test_cleanup_drops_missing_and_old_records() {
        let temp_dir = TempDir::new().unwrap();
        let fresh = temp_dir.path().join("fresh.txt");
        let old = temp_dir.path().join("old.txt");
        let gone = temp_dir.path().join("gone.txt");
        std::fs::write(&fresh, b"1").unwrap();
        std::fs::write(&old, b"2").unwrap();

        let manager = manager_in(&temp_dir).await;
        manager.record_download(&fresh).await.unwrap();
        manager
            .record_download_at(&old, Utc::now() - chrono::Duration::days(8))
            .await
            .unwrap();
        manager.record_download(&gone).await.unwrap();

        let removed = manager.cleanup_expired().await.unwrap();
        assert_eq!(removed, 2);

        let entries = manager.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, absolute_key(&fresh));

        // Nothing left to clean
        assert_eq!(manager.cleanup_expired().await.unwrap(), 0);
    }

    /// Test that a corrupt cache file is treated as empty and then overwritten
    #[tokio::test]
    async fn test_corrupt_cache_file_is_tolerated() {
        let temp_dir = TempDir::new().unwrap();
        let cache_path = temp_dir.path().join("cache.json");
        std::fs::write(&cache_path, b"{ not json").unwrap();

        let manager = manager_in(&temp_dir).await;
        assert!(manager.is_empty().await);

        let file = temp_dir.path().join("a.txt");
        std::fs::write(&file, b"a").unwrap();
        manager.record_download(&file).await.unwrap();

        let content = std::fs::read_to_string(&cache_path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert!(parsed["files"].is_object());
    }

    #[test]
    fn test_absolute_key_normalises() {
        let key = absolute_key(Path::new("/data/./tools/../lists/a.txt"));
        assert_eq!(key, PathBuf::from("/data/lists/a.txt"));

        let relative = absolute_key(Path::new("downloads/a.txt"));
        assert!(relative.is_absolute());
        assert!(relative.ends_with("downloads/a.txt"));
    }

    #[test]
    fn test_is_older_than() {
        let now = Utc::now();
        let limit = Duration::from_secs(3600);
        assert!(is_older_than(now, now - chrono::Duration::hours(2), limit));
        assert!(!is_older_than(now, now - chrono::Duration::minutes(30), limit));
        assert!(!is_older_than(now, now + chrono::Duration::hours(2), limit));
    }
}
