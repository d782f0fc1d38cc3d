//! Events emitted while a file transfers
//!
//! The tracker and the downloader report through a [`TransferObserver`], which
//! keeps rendering (terminal status line, logs, test recorders) out of the
//! transfer logic.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use super::session::CancelReason;

/// Point-in-time view of a running transfer
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub bytes: u64,
    pub total: Option<u64>,
    /// Smoothed speed in bytes per second
    pub speed: f64,
    /// Present only when the total is known and the speed is trustworthy
    pub eta: Option<Duration>,
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    /// Completion percentage when the total is known
    pub fn percent(&self) -> Option<f64> {
        match self.total {
            Some(0) => Some(100.0),
            Some(total) => Some(self.bytes as f64 / total as f64 * 100.0),
            None => None,
        }
    }
}

/// Result of a committed transfer
#[derive(Debug, Clone, PartialEq)]
pub struct TransferSummary {
    pub file_name: String,
    pub bytes: u64,
    pub elapsed: Duration,
    /// Bytes per second over the whole transfer
    pub average_speed: f64,
    /// Where the previous file went, when it was kept
    pub backup_path: Option<PathBuf>,
}

impl TransferSummary {
    pub fn new(
        file_name: impl Into<String>,
        bytes: u64,
        elapsed: Duration,
        backup_path: Option<PathBuf>,
    ) -> Self {
        let secs = elapsed.as_secs_f64();
        let average_speed = if secs > 0.0 { bytes as f64 / secs } else { 0.0 };
        Self {
            file_name: file_name.into(),
            bytes,
            elapsed,
            average_speed,
            backup_path,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    /// Response headers arrived and the body is about to be copied
    Started {
        file_name: String,
        total: Option<u64>,
    },
    Progress(ProgressSnapshot),
    /// Smoothed speed is below the required minimum
    LowSpeed {
        speed: f64,
        low_for: Duration,
        min_speed: f64,
    },
    Recovered {
        speed: f64,
    },
    Cancelled {
        reason: CancelReason,
        speed: f64,
    },
    /// The new file is in place
    Completed(TransferSummary),
    /// The transfer ended without producing a file
    Aborted,
}

/// Receiver of transfer events; called from the tracker tasks and the downloader
pub trait TransferObserver: Send + Sync {
    fn handle(&self, event: TransferEvent);
}

/// Observer that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl TransferObserver for NullObserver {
    fn handle(&self, _event: TransferEvent) {}
}

/// Observer that keeps every event, for inspection after the fact
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<TransferEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TransferEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl TransferObserver for RecordingObserver {
    fn handle(&self, event: TransferEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
