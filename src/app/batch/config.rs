//! Batch run configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{batch, files};

/// How a batch of items is processed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Root directory; each group gets a subdirectory
    pub output_dir: PathBuf,
    /// Attempts per URL
    pub retries: u32,
    /// Delay before attempt `n + 1` is `n` times this
    #[serde(with = "humantime_serde")]
    pub retry_delay_step: Duration,
    /// Move the previous file to `<name>.old` instead of replacing it
    pub keep_old: bool,
    /// Download even when the file exists and is up to date
    pub force: bool,
    /// Stop the whole run after this long (None = no limit)
    #[serde(with = "humantime_serde")]
    pub max_total_time: Option<Duration>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(files::DEFAULT_OUTPUT_DIR),
            retries: batch::DEFAULT_RETRIES,
            retry_delay_step: batch::RETRY_DELAY_STEP,
            keep_old: false,
            force: false,
            max_total_time: None,
        }
    }
}

impl BatchConfig {
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_retry_delay_step(mut self, step: Duration) -> Self {
        self.retry_delay_step = step;
        self
    }

    pub fn with_keep_old(mut self, keep_old: bool) -> Self {
        self.keep_old = keep_old;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Delay before the attempt following attempt number `attempt`
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        self.retry_delay_step.saturating_mul(attempt)
    }
}
