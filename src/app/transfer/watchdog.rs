//! Low-speed detection

use std::time::Duration;

/// Outcome of one watchdog check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Speed is fine and was fine last time too
    Healthy,
    /// Speed is back above the threshold after a slow streak
    Recovered,
    /// Below the threshold, not yet long enough to give up
    Slow { low_for: Duration },
    /// Below the threshold for long enough; cancel now
    Trip { low_for: Duration },
    /// Already tripped earlier; nothing more to do
    Tripped,
}

/// Counts consecutive slow checks and trips once their total time reaches the limit
#[derive(Debug, Clone)]
pub struct LowSpeedWatchdog {
    min_speed: f64,
    interval: Duration,
    limit: Duration,
    streak: u32,
    tripped: bool,
}

impl LowSpeedWatchdog {
    pub fn new(min_speed: f64, interval: Duration, limit: Duration) -> Self {
        Self {
            min_speed,
            interval,
            limit,
            streak: 0,
            tripped: false,
        }
    }

    /// Consecutive slow checks so far
    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn low_for(&self) -> Duration {
        self.interval.saturating_mul(self.streak)
    }

    pub fn observe(&mut self, speed: f64) -> Verdict {
        if self.tripped {
            return Verdict::Tripped;
        }

        if speed < self.min_speed {
            self.streak = self.streak.saturating_add(1);
            let low_for = self.low_for();
            if low_for >= self.limit {
                self.tripped = true;
                Verdict::Trip { low_for }
            } else {
                Verdict::Slow { low_for }
            }
        } else if self.streak > 0 {
            self.streak = 0;
            Verdict::Recovered
        } else {
            Verdict::Healthy
        }
    }
}
