//! Speed sampling and ETA estimation

use std::time::{Duration, Instant};

use crate::constants::transfer::{MAX_ETA, SMOOTHING_PREVIOUS_WEIGHT, SMOOTHING_SAMPLE_WEIGHT};

/// Exponentially smoothed transfer rate
///
/// Owns the last-sample bookkeeping; the tracker's sampler task is its only user.
#[derive(Debug, Clone)]
pub struct SpeedSampler {
    last_time: Instant,
    last_bytes: u64,
    smoothed: Option<f64>,
}

impl SpeedSampler {
    pub fn new(start: Instant) -> Self {
        Self {
            last_time: start,
            last_bytes: 0,
            smoothed: None,
        }
    }

    /// Take a sample of the byte counter at `now`.
    ///
    /// Returns the updated smoothed speed, or `None` when no time has passed
    /// since the previous sample.
    pub fn sample(&mut self, bytes: u64, now: Instant) -> Option<f64> {
        let elapsed = now.saturating_duration_since(self.last_time);
        if elapsed.is_zero() {
            return None;
        }

        let delta = bytes.saturating_sub(self.last_bytes);
        let instant = delta as f64 / elapsed.as_secs_f64();
        let smoothed = match self.smoothed {
            None => instant,
            Some(previous) => {
                SMOOTHING_PREVIOUS_WEIGHT * previous + SMOOTHING_SAMPLE_WEIGHT * instant
            }
        }
        .max(0.0);

        self.smoothed = Some(smoothed);
        self.last_time = now;
        self.last_bytes = bytes;
        Some(smoothed)
    }

    /// Smoothed speed so far, zero before the first sample
    pub fn smoothed(&self) -> f64 {
        self.smoothed.unwrap_or(0.0)
    }
}

/// Time left at `speed` bytes per second, truncated to whole seconds and capped at 24h
pub fn estimate_eta(total: u64, transferred: u64, speed: f64) -> Option<Duration> {
    if speed.is_nan() || speed <= 0.0 {
        return None;
    }

    let remaining = total.saturating_sub(transferred) as f64;
    let secs = (remaining / speed).floor();
    if secs >= MAX_ETA.as_secs_f64() {
        Some(MAX_ETA)
    } else {
        Some(Duration::from_secs(secs as u64))
    }
}
