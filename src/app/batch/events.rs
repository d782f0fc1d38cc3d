//! Narration of a batch run

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use super::stats::OutcomeStatus;
use crate::app::transfer::NullObserver;
use crate::errors::DownloadErrorKind;

#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    GroupStarted {
        group: String,
        items: usize,
    },
    ItemUpToDate {
        name: String,
        destination: PathBuf,
    },
    ItemStarted {
        name: String,
        destination: PathBuf,
    },
    UrlConverted {
        from: String,
        to: Url,
    },
    /// A configured URL could not be used at all
    UrlRejected {
        url: String,
        error: String,
    },
    Attempt {
        url: Url,
        attempt: u32,
        retries: u32,
    },
    AttemptFailed {
        kind: DownloadErrorKind,
        error: String,
    },
    RetryScheduled {
        delay: Duration,
    },
    ItemFinished {
        name: String,
        destination: PathBuf,
        status: OutcomeStatus,
    },
}

/// Receiver of batch narration
pub trait BatchObserver: Send + Sync {
    fn handle(&self, event: BatchEvent);
}

impl BatchObserver for NullObserver {
    fn handle(&self, _event: BatchEvent) {}
}
