//! Single-file download with atomic commit
//!
//! [`Downloader::transfer`] fetches one URL into a temp file beside the
//! destination while the progress tracker watches it, then renames the temp
//! file over the destination. The rename is the only point at which the
//! destination changes: every failure path drops the temp file instead.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::config::TransferConfig;
use super::copy::copy_with_cancel;
use super::events::{NullObserver, TransferEvent, TransferObserver, TransferSummary};
use super::session::{LowSpeedLimit, TransferSession};
use super::tracker::ProgressTracker;
use crate::app::cache::CacheManager;
use crate::app::client::HttpFetcher;
use crate::constants::files;
use crate::errors::{DownloadError, DownloadResult};

/// Path the previous version of `destination` is moved to when kept
pub fn backup_path_for(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(files::BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Downloads single files with progress tracking and low-speed cancellation
pub struct Downloader {
    fetcher: Arc<dyn HttpFetcher>,
    config: TransferConfig,
    cache: Option<Arc<CacheManager>>,
    observer: Arc<dyn TransferObserver>,
    cancellation: CancellationToken,
}

impl Downloader {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, config: TransferConfig) -> Self {
        Self {
            fetcher,
            config,
            cache: None,
            observer: Arc::new(NullObserver),
            cancellation: CancellationToken::new(),
        }
    }

    /// Record successful downloads in `cache`
    pub fn with_cache(mut self, cache: Arc<CacheManager>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn TransferObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Cancel every transfer when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Download `url` to `destination`.
    ///
    /// On success the destination holds the new content; with `keep_old` an
    /// existing file is first moved to `<destination>.old`, replacing any
    /// earlier backup. On failure the destination is untouched and no temp
    /// file is left behind.
    pub async fn transfer(
        &self,
        url: &Url,
        destination: &Path,
        keep_old: bool,
    ) -> DownloadResult<TransferSummary> {
        let parent = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)
            .await
            .map_err(|source| DownloadError::LocalSetup {
                path: parent.clone(),
                source,
            })?;

        let file_name = destination
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| destination.display().to_string());

        debug!("Requesting {}", url);
        let response = tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => return Err(DownloadError::Cancelled),
            response = tokio::time::timeout(self.config.response_timeout, self.fetcher.get(url)) => {
                match response {
                    Ok(response) => response?,
                    Err(_) => {
                        return Err(DownloadError::ResponseTimeout {
                            url: url.to_string(),
                            after: self.config.response_timeout,
                        })
                    }
                }
            }
        };

        match response.status {
            404 => {
                return Err(DownloadError::NotFound {
                    url: url.to_string(),
                })
            }
            status if !(200..300).contains(&status) => {
                return Err(DownloadError::ServerError { status });
            }
            _ => {}
        }

        let prefix = format!(".{}.", file_name);
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(files::TEMP_SUFFIX);
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // Same mode a plainly created file would get, still subject to umask
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }
        let temp = builder
            .tempfile_in(&parent)
            .map_err(|source| DownloadError::LocalSetup {
                path: parent.clone(),
                source,
            })?;
        // The temp path deletes the file when dropped, which covers every early return below
        let (std_file, temp_path) = temp.into_parts();
        let mut file = fs::File::from_std(std_file);
        debug!("Writing {} to {}", url, temp_path.display());

        let session = Arc::new(TransferSession::new(
            file_name.clone(),
            response.content_length,
            LowSpeedLimit {
                min_speed: self.config.min_required_speed,
                duration: self.config.low_speed_duration,
            },
            &self.cancellation,
        ));
        self.observer.handle(TransferEvent::Started {
            file_name: file_name.clone(),
            total: response.content_length,
        });
        let tracker = ProgressTracker::start(
            Arc::clone(&session),
            &self.config,
            Arc::clone(&self.observer),
        );

        let mut body = response.body;
        let copied = match copy_with_cancel(&mut body, &mut file, &session, self.config.buffer_size)
            .await
        {
            Ok(bytes) => file.flush().await.map(|_| bytes).map_err(DownloadError::from),
            Err(e) => Err(e),
        };
        let outcome = match copied {
            Ok(bytes) => {
                if session.complete() {
                    Ok(bytes)
                } else {
                    Err(session.cancellation_error())
                }
            }
            Err(e) => {
                session.finish();
                Err(e)
            }
        };
        tracker.join().await;
        drop(body);
        drop(file);

        let bytes = match outcome {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("Transfer of {} failed: {}", url, e);
                self.observer.handle(TransferEvent::Aborted);
                return Err(e);
            }
        };
        let elapsed = session.elapsed();

        let backup_path = if keep_old {
            self.move_aside(destination).await?
        } else {
            None
        };

        if let Err(e) = temp_path.persist(destination) {
            if let Some(backup) = &backup_path {
                if let Err(restore) = fs::rename(backup, destination).await {
                    warn!(
                        "Could not restore {} from {}: {}",
                        destination.display(),
                        backup.display(),
                        restore
                    );
                }
            }
            self.observer.handle(TransferEvent::Aborted);
            return Err(DownloadError::AtomicOperationFailed {
                temp_path: e.path.to_path_buf(),
                final_path: destination.to_path_buf(),
                source: e.error,
            });
        }

        info!(
            "Saved {} ({} bytes) to {}",
            url,
            bytes,
            destination.display()
        );

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.record_download(destination).await {
                warn!(
                    "Could not record download of {}: {}",
                    destination.display(),
                    e
                );
            }
        }

        let summary = TransferSummary::new(file_name, bytes, elapsed, backup_path);
        self.observer
            .handle(TransferEvent::Completed(summary.clone()));
        Ok(summary)
    }

    /// Move an existing destination to its `.old` path
    async fn move_aside(&self, destination: &Path) -> DownloadResult<Option<PathBuf>> {
        if fs::metadata(destination).await.is_err() {
            return Ok(None);
        }

        let backup = backup_path_for(destination);
        match fs::remove_file(&backup).await {
            Ok(()) => debug!("Removed previous backup {}", backup.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(DownloadError::BackupFailed {
                    path: backup,
                    source,
                })
            }
        }

        fs::rename(destination, &backup)
            .await
            .map_err(|source| DownloadError::BackupFailed {
                path: destination.to_path_buf(),
                source,
            })?;
        Ok(Some(backup))
    }
}
