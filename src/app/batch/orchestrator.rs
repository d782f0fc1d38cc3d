//! Sequential processing of an item list
//!
//! Items are handled one at a time, group by group. For each item the runner
//! decides whether a download is due, then walks the item's URLs in order,
//! retrying each with a linearly growing delay. A 404 abandons the current URL
//! at once and moves on to the next one. Cancelling the downloader's token
//! stops the run, including during a retry delay.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use url::Url;

use super::config::BatchConfig;
use super::events::{BatchEvent, BatchObserver};
use super::stats::{BatchStats, ItemOutcome, OutcomeStatus};
use crate::app::cache::CacheManager;
use crate::app::client::{convert_github_url, resolve_download_url};
use crate::app::models::{item_count, DownloadItem, ItemGroups};
use crate::app::transfer::{Downloader, NullObserver};
use crate::errors::{DownloadError, DownloadErrorKind};

/// What a run would do with one item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannedAction {
    Download,
    Skip,
}

/// Dry-run view of one item
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedItem {
    pub group: String,
    pub name: String,
    pub destination: PathBuf,
    pub action: PlannedAction,
    /// URLs after GitHub rewriting; unusable ones are left as written
    pub urls: Vec<String>,
}

/// Runs a whole item list through a [`Downloader`]
pub struct BatchRunner {
    downloader: Downloader,
    cache: Option<Arc<CacheManager>>,
    observer: Arc<dyn BatchObserver>,
    config: BatchConfig,
}

impl BatchRunner {
    pub fn new(downloader: Downloader, config: BatchConfig) -> Self {
        Self {
            downloader,
            cache: None,
            observer: Arc::new(NullObserver),
            config,
        }
    }

    /// Consult `cache` for items marked keep-updated
    pub fn with_cache(mut self, cache: Arc<CacheManager>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn BatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Process every item and return the tally
    pub async fn run(&self, groups: &ItemGroups) -> BatchStats {
        let started = Instant::now();
        let mut stats = BatchStats::new(item_count(groups));
        info!(
            "Processing {} items in {} groups",
            stats.total,
            groups.len()
        );

        'groups: for (group, items) in groups {
            self.observer.handle(BatchEvent::GroupStarted {
                group: group.clone(),
                items: items.len(),
            });

            for item in items {
                if self.is_cancelled() {
                    stats.cancelled = true;
                    break 'groups;
                }

                let destination = item.destination(&self.config.output_dir, group);
                let status = self.process_item(item, &destination).await;
                let stop = status == OutcomeStatus::Cancelled;

                self.observer.handle(BatchEvent::ItemFinished {
                    name: item.display_name().to_string(),
                    destination: destination.clone(),
                    status: status.clone(),
                });
                stats.record(ItemOutcome {
                    group: group.clone(),
                    name: item.display_name().to_string(),
                    destination,
                    status,
                });

                if stop {
                    break 'groups;
                }
            }
        }

        stats.elapsed = started.elapsed();
        if stats.cancelled {
            warn!(
                "Run cancelled after {} of {} items",
                stats.outcomes.len(),
                stats.total
            );
        } else {
            info!("Succeeded {}/{}", stats.succeeded(), stats.total);
        }
        stats
    }

    /// Decide what `run` would do, without touching the network
    pub async fn plan(&self, groups: &ItemGroups) -> Vec<PlannedItem> {
        let mut planned = Vec::with_capacity(item_count(groups));

        for (group, items) in groups {
            for item in items {
                let destination = item.destination(&self.config.output_dir, group);
                let action = if self.needs_download(item, &destination).await {
                    PlannedAction::Download
                } else {
                    PlannedAction::Skip
                };
                let urls = item
                    .download_urls
                    .iter()
                    .map(|raw| match resolve_download_url(raw) {
                        Ok(url) => url.to_string(),
                        Err(_) => raw.clone(),
                    })
                    .collect();

                planned.push(PlannedItem {
                    group: group.clone(),
                    name: item.display_name().to_string(),
                    destination,
                    action,
                    urls,
                });
            }
        }

        planned
    }

    fn is_cancelled(&self) -> bool {
        self.downloader.cancellation().is_cancelled()
    }

    /// `force || !exists || (keep_updated && cache says stale)`
    async fn needs_download(&self, item: &DownloadItem, destination: &Path) -> bool {
        if self.config.force {
            return true;
        }
        if tokio::fs::metadata(destination).await.is_err() {
            return true;
        }
        if !item.keep_updated {
            return false;
        }

        match &self.cache {
            Some(cache) => cache.needs_update(destination).await,
            None => true,
        }
    }

    async fn process_item(&self, item: &DownloadItem, destination: &Path) -> OutcomeStatus {
        if !self.needs_download(item, destination).await {
            debug!("{} is up to date", destination.display());
            self.observer.handle(BatchEvent::ItemUpToDate {
                name: item.display_name().to_string(),
                destination: destination.to_path_buf(),
            });
            return OutcomeStatus::UpToDate;
        }

        self.observer.handle(BatchEvent::ItemStarted {
            name: item.display_name().to_string(),
            destination: destination.to_path_buf(),
        });

        let retries = self.config.retries.max(1);
        let mut last_error: Option<DownloadError> = None;

        for raw_url in &item.download_urls {
            let url = match Url::parse(raw_url.trim()) {
                Ok(url) => url,
                Err(e) => {
                    let error = DownloadError::InvalidUrl {
                        url: raw_url.clone(),
                        error: e.to_string(),
                    };
                    self.observer.handle(BatchEvent::UrlRejected {
                        url: raw_url.clone(),
                        error: error.to_string(),
                    });
                    last_error = Some(error);
                    continue;
                }
            };
            let url = match convert_github_url(&url) {
                Some(raw) => {
                    self.observer.handle(BatchEvent::UrlConverted {
                        from: raw_url.clone(),
                        to: raw.clone(),
                    });
                    raw
                }
                None => url,
            };

            for attempt in 1..=retries {
                self.observer.handle(BatchEvent::Attempt {
                    url: url.clone(),
                    attempt,
                    retries,
                });

                let error = match self
                    .downloader
                    .transfer(&url, destination, self.config.keep_old)
                    .await
                {
                    Ok(summary) => {
                        return OutcomeStatus::Downloaded {
                            bytes: summary.bytes,
                        }
                    }
                    Err(e) if e.is_external_cancel() => return OutcomeStatus::Cancelled,
                    Err(e) => e,
                };

                debug!("Attempt {} of {} for {} failed: {}", attempt, retries, url, error);
                self.observer.handle(BatchEvent::AttemptFailed {
                    kind: error.kind(),
                    error: error.to_string(),
                });

                let retryable = error.is_retryable();
                last_error = Some(error);
                if !retryable {
                    break;
                }

                if attempt < retries {
                    let delay = self.config.retry_delay(attempt);
                    self.observer
                        .handle(BatchEvent::RetryScheduled { delay });
                    if !self.pause(delay).await {
                        return OutcomeStatus::Cancelled;
                    }
                }
            }
        }

        match last_error {
            Some(e) if e.kind() == DownloadErrorKind::ResourceNotFound => OutcomeStatus::NotFound,
            Some(e) => OutcomeStatus::Failed {
                error: e.to_string(),
            },
            None => OutcomeStatus::Failed {
                error: "no usable download URL".to_string(),
            },
        }
    }

    /// Sleep for `delay`; false if the run was cancelled meanwhile
    async fn pause(&self, delay: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.downloader.cancellation().cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}
