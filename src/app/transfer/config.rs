//! Transfer tracking configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::transfer;

/// Thresholds and cadences for a single file transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Copy buffer size in bytes
    pub buffer_size: usize,
    /// Longest wait for response headers before the attempt fails
    #[serde(with = "humantime_serde")]
    pub response_timeout: Duration,
    /// How often the speed sampler runs and the status line refreshes
    #[serde(with = "humantime_serde")]
    pub progress_interval: Duration,
    /// How often the low-speed watchdog checks the smoothed speed
    #[serde(with = "humantime_serde")]
    pub watchdog_interval: Duration,
    /// Cumulative slow time after which the transfer is cancelled
    #[serde(with = "humantime_serde")]
    pub low_speed_duration: Duration,
    /// Smoothed speed (B/s) the transfer must sustain
    pub min_required_speed: f64,
    /// Speeds at or below this (B/s) show no ETA
    pub min_valid_speed: f64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            buffer_size: transfer::BUFFER_SIZE,
            response_timeout: transfer::RESPONSE_TIMEOUT,
            progress_interval: transfer::PROGRESS_INTERVAL,
            watchdog_interval: transfer::WATCHDOG_INTERVAL,
            low_speed_duration: transfer::LOW_SPEED_DURATION,
            min_required_speed: transfer::MIN_REQUIRED_SPEED,
            min_valid_speed: transfer::MIN_VALID_SPEED,
        }
    }
}

impl TransferConfig {
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_watchdog_interval(mut self, interval: Duration) -> Self {
        self.watchdog_interval = interval;
        self
    }

    pub fn with_low_speed_duration(mut self, duration: Duration) -> Self {
        self.low_speed_duration = duration;
        self
    }

    pub fn with_min_required_speed(mut self, bytes_per_sec: f64) -> Self {
        self.min_required_speed = bytes_per_sec;
        self
    }

    /// Validate thresholds, returning a description of each problem
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        if self.buffer_size == 0 {
            problems.push("transfer.buffer_size must be greater than 0".to_string());
        }
        if self.response_timeout.is_zero() {
            problems.push("transfer.response_timeout must be greater than 0".to_string());
        }
        if self.progress_interval.is_zero() {
            problems.push("transfer.progress_interval must be greater than 0".to_string());
        }
        // The watchdog reads a speed of 0 until the sampler has published one
        if self.progress_interval >= self.low_speed_duration {
            problems.push(
                "transfer.progress_interval must be shorter than transfer.low_speed_duration"
                    .to_string(),
            );
        }
        if self.watchdog_interval.is_zero() {
            problems.push("transfer.watchdog_interval must be greater than 0".to_string());
        }
        if self.min_required_speed.is_nan() || self.min_required_speed < 0.0 {
            problems.push("transfer.min_required_speed must not be negative".to_string());
        }
        if self.min_valid_speed.is_nan() || self.min_valid_speed < 0.0 {
            problems.push("transfer.min_valid_speed must not be negative".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = TransferConfig::default();
        assert_eq!(config.buffer_size, 32 * 1024);
        assert_eq!(config.response_timeout, Duration::from_secs(30));
        assert_eq!(config.progress_interval, Duration::from_millis(500));
        assert_eq!(config.watchdog_interval, Duration::from_secs(5));
        assert_eq!(config.low_speed_duration, Duration::from_secs(15));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_collects_problems() {
        let config = TransferConfig::default()
            .with_buffer_size(0)
            .with_watchdog_interval(Duration::ZERO)
            .with_min_required_speed(f64::NAN);

        let problems = config.validate().unwrap_err();
        assert_eq!(problems.len(), 3);
    }

    #[test]
    fn test_sampling_must_outpace_low_speed_limit() {
        let config = TransferConfig::default()
            .with_progress_interval(Duration::from_secs(20))
            .with_low_speed_duration(Duration::from_secs(15));
        let problems = config.validate().unwrap_err();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("progress_interval"));

        let equal = TransferConfig::default()
            .with_progress_interval(Duration::from_secs(15))
            .with_low_speed_duration(Duration::from_secs(15));
        assert!(equal.validate().is_err());
    }

    #[test]
    fn test_zero_response_timeout_rejected() {
        let config = TransferConfig::default().with_response_timeout(Duration::ZERO);
        let problems = config.validate().unwrap_err();
        assert!(problems[0].contains("response_timeout"));
    }
}
