//! Batch processing of the item list
//!
//! - [`config`] - Output directory, retries and overwrite policy
//! - [`orchestrator`] - The sequential runner and dry-run planner
//! - [`events`] - Narration hooks for the CLI
//! - [`stats`] - Per-item outcomes and the final tally

pub mod config;
pub mod events;
pub mod orchestrator;
pub mod stats;

pub use config::BatchConfig;
pub use events::{BatchEvent, BatchObserver};
pub use orchestrator::{BatchRunner, PlannedAction, PlannedItem};
pub use stats::{BatchStats, ItemOutcome, OutcomeStatus};
