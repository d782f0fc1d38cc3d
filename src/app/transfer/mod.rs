//! Single-file transfer with progress tracking and low-speed cancellation
//!
//! A transfer runs three activities over one [`TransferSession`]:
//!
//! - the copy loop, the only writer of the byte counter (through a
//!   [`CountingWriter`])
//! - the speed sampler, which smooths the counter into a speed and reports
//!   progress snapshots
//! - the watchdog, which cancels the session once the smoothed speed has stayed
//!   below the required minimum for long enough
//!
//! [`Downloader`] wires these together around a temp file and commits the
//! result with an atomic rename.

pub mod config;
pub mod copy;
pub mod counting;
pub mod events;
pub mod executor;
pub mod session;
pub mod speed;
pub mod tracker;
pub mod watchdog;

pub use config::TransferConfig;
pub use copy::copy_with_cancel;
pub use counting::CountingWriter;
pub use events::{
    NullObserver, ProgressSnapshot, RecordingObserver, TransferEvent, TransferObserver,
    TransferSummary,
};
pub use executor::{backup_path_for, Downloader};
pub use session::{CancelReason, LowSpeedLimit, SessionState, TransferSession};
pub use speed::{estimate_eta, SpeedSampler};
pub use tracker::ProgressTracker;
pub use watchdog::{LowSpeedWatchdog, Verdict};
