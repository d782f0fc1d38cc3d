//! Shared state of one in-flight transfer
//!
//! A [`TransferSession`] lives from the moment response headers arrive until
//! the transfer routine returns. Its fields are partitioned by writer: the copy
//! loop owns the byte counter, the speed sampler owns the published speed, and
//! the terminal state is a single atomic that moves out of `running` once.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::errors::DownloadError;

const RUNNING: u8 = 0;
const COMPLETED: u8 = 1;
const LOW_SPEED: u8 = 2;
const EXTERNAL: u8 = 3;

/// Why a transfer was cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The low-speed watchdog gave up on the transfer
    LowSpeed,
    /// Interrupt or run deadline
    External,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::LowSpeed => f.write_str("speed too low"),
            CancelReason::External => f.write_str("interrupted"),
        }
    }
}

/// Observable state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Completed,
    Cancelled(CancelReason),
}

/// Low-speed policy carried by the session for error reporting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowSpeedLimit {
    pub min_speed: f64,
    pub duration: Duration,
}

/// State shared between the copy loop and the tracker tasks
#[derive(Debug)]
pub struct TransferSession {
    file_name: String,
    total_bytes: Option<u64>,
    bytes_transferred: AtomicU64,
    smoothed_speed_bits: AtomicU64,
    started_at: Instant,
    state: AtomicU8,
    limit: LowSpeedLimit,
    cancellation: CancellationToken,
    completion: CancellationToken,
}

impl TransferSession {
    /// Start a session whose cancellation follows `parent`
    pub fn new(
        file_name: impl Into<String>,
        total_bytes: Option<u64>,
        limit: LowSpeedLimit,
        parent: &CancellationToken,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            total_bytes,
            bytes_transferred: AtomicU64::new(0),
            smoothed_speed_bits: AtomicU64::new(0f64.to_bits()),
            started_at: Instant::now(),
            state: AtomicU8::new(RUNNING),
            limit,
            cancellation: parent.child_token(),
            completion: CancellationToken::new(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Declared length, if the server sent one
    pub fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }

    /// Counter written by the copy loop through a counting writer
    pub fn counter(&self) -> &AtomicU64 {
        &self.bytes_transferred
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred.load(Ordering::Acquire)
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Latest smoothed speed in bytes per second
    pub fn smoothed_speed(&self) -> f64 {
        f64::from_bits(self.smoothed_speed_bits.load(Ordering::Acquire))
    }

    /// Publish a new smoothed speed; only the sampler calls this
    pub(crate) fn publish_speed(&self, bytes_per_sec: f64) {
        self.smoothed_speed_bits
            .store(bytes_per_sec.max(0.0).to_bits(), Ordering::Release);
    }

    pub fn limit(&self) -> LowSpeedLimit {
        self.limit
    }

    pub fn state(&self) -> SessionState {
        match self.state.load(Ordering::Acquire) {
            COMPLETED => SessionState::Completed,
            LOW_SPEED => SessionState::Cancelled(CancelReason::LowSpeed),
            EXTERNAL => SessionState::Cancelled(CancelReason::External),
            _ => SessionState::Running,
        }
    }

    pub fn cancel_reason(&self) -> Option<CancelReason> {
        match self.state() {
            SessionState::Cancelled(reason) => Some(reason),
            _ => None,
        }
    }

    /// Token the copy loop and HTTP request wait on
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Token fired when the transfer routine ends
    pub fn completion(&self) -> &CancellationToken {
        &self.completion
    }

    /// Whether the periodic tasks should stop
    pub fn is_finished(&self) -> bool {
        self.completion.is_cancelled() || self.cancellation.is_cancelled()
    }

    /// Cancel the transfer. Returns true if this call decided the outcome.
    ///
    /// Only the first transition out of `running` wins; later calls are no-ops.
    /// A low-speed cancel that races an already-cancelled parent token is
    /// recorded as external.
    pub fn cancel(&self, reason: CancelReason) -> bool {
        if reason == CancelReason::LowSpeed && self.cancellation.is_cancelled() {
            self.transition(EXTERNAL);
            return false;
        }
        let code = match reason {
            CancelReason::LowSpeed => LOW_SPEED,
            CancelReason::External => EXTERNAL,
        };

        let won = self.transition(code);
        if won {
            self.cancellation.cancel();
        }
        won
    }

    fn transition(&self, code: u8) -> bool {
        self.state
            .compare_exchange(RUNNING, code, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Mark the transfer complete and stop the periodic tasks.
    ///
    /// Returns false if a cancellation got there first.
    pub fn complete(&self) -> bool {
        let won = self.transition(COMPLETED);
        self.finish();
        won
    }

    /// Stop the periodic tasks without changing the outcome
    pub fn finish(&self) {
        self.completion.cancel();
    }

    /// Error describing why the copy loop stopped early
    pub fn cancellation_error(&self) -> DownloadError {
        // A token cancelled without a recorded reason came from the parent
        self.cancel(CancelReason::External);
        match self.cancel_reason() {
            Some(CancelReason::LowSpeed) => DownloadError::LowSpeed {
                min_speed: self.limit.min_speed as u64,
                low_for_secs: self.limit.duration.as_secs(),
            },
            _ => DownloadError::Cancelled,
        }
    }
}
