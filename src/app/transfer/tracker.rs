//! Periodic progress sampling and low-speed supervision
//!
//! [`ProgressTracker::start`] spawns two tasks for one session:
//!
//! - the sampler, which turns the byte counter into a smoothed speed and
//!   reports a [`ProgressSnapshot`] every `progress_interval`
//! - the watchdog, which checks the smoothed speed every `watchdog_interval`
//!   and cancels the session once it has been too slow for too long
//!
//! Both wait on a timer tick alongside the session's completion and
//! cancellation tokens, so neither outlives the transfer by more than a tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, warn};

use super::config::TransferConfig;
use super::events::{ProgressSnapshot, TransferEvent, TransferObserver};
use super::session::{CancelReason, TransferSession};
use super::speed::{estimate_eta, SpeedSampler};
use super::watchdog::{LowSpeedWatchdog, Verdict};

/// Handle to the sampler and watchdog tasks of one transfer
#[derive(Debug)]
pub struct ProgressTracker {
    sampler: JoinHandle<()>,
    watchdog: JoinHandle<()>,
}

impl ProgressTracker {
    /// Spawn both periodic tasks for `session`
    pub fn start(
        session: Arc<TransferSession>,
        config: &TransferConfig,
        observer: Arc<dyn TransferObserver>,
    ) -> Self {
        let sampler = tokio::spawn(run_sampler(
            Arc::clone(&session),
            config.progress_interval,
            config.min_valid_speed,
            Arc::clone(&observer),
        ));

        let watchdog = tokio::spawn(run_watchdog(
            session,
            LowSpeedWatchdog::new(
                config.min_required_speed,
                config.watchdog_interval,
                config.low_speed_duration,
            ),
            config.watchdog_interval,
            observer,
        ));

        Self { sampler, watchdog }
    }

    /// Wait for both tasks to exit; call after the session finished
    pub async fn join(self) {
        if let Err(e) = self.sampler.await {
            warn!("Progress sampler task failed: {}", e);
        }
        if let Err(e) = self.watchdog.await {
            warn!("Low-speed watchdog task failed: {}", e);
        }
    }
}

fn ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Wait for the next tick. Returns false once the session is over.
async fn next_tick(session: &TransferSession, ticker: &mut Interval) -> bool {
    tokio::select! {
        biased;
        _ = session.completion().cancelled() => false,
        _ = session.cancellation().cancelled() => false,
        _ = ticker.tick() => !session.is_finished(),
    }
}

async fn run_sampler(
    session: Arc<TransferSession>,
    period: Duration,
    min_valid_speed: f64,
    observer: Arc<dyn TransferObserver>,
) {
    let mut sampler = SpeedSampler::new(session.started_at());
    let mut ticker = ticker(period);

    while next_tick(&session, &mut ticker).await {
        let bytes = session.bytes_transferred();
        let Some(speed) = sampler.sample(bytes, std::time::Instant::now()) else {
            continue;
        };
        session.publish_speed(speed);

        let total = session.total_bytes();
        let eta = match total {
            Some(total) if speed > min_valid_speed => estimate_eta(total, bytes, speed),
            _ => None,
        };

        observer.handle(TransferEvent::Progress(ProgressSnapshot {
            bytes,
            total,
            speed,
            eta,
            elapsed: session.elapsed(),
        }));
    }

    debug!("Progress sampler for {} stopped", session.file_name());
}

async fn run_watchdog(
    session: Arc<TransferSession>,
    mut watchdog: LowSpeedWatchdog,
    period: Duration,
    observer: Arc<dyn TransferObserver>,
) {
    let mut ticker = ticker(period);
    let min_speed = session.limit().min_speed;

    while next_tick(&session, &mut ticker).await {
        let speed = session.smoothed_speed();
        match watchdog.observe(speed) {
            Verdict::Healthy => {}
            Verdict::Slow { low_for } => {
                debug!(
                    "{} below {:.0} B/s for {:?}",
                    session.file_name(),
                    min_speed,
                    low_for
                );
                observer.handle(TransferEvent::LowSpeed {
                    speed,
                    low_for,
                    min_speed,
                });
            }
            Verdict::Recovered => observer.handle(TransferEvent::Recovered { speed }),
            Verdict::Trip { low_for } => {
                if session.cancel(CancelReason::LowSpeed) {
                    warn!(
                        "Cancelling {}: below {:.0} B/s for {:?}",
                        session.file_name(),
                        min_speed,
                        low_for
                    );
                    observer.handle(TransferEvent::Cancelled {
                        reason: CancelReason::LowSpeed,
                        speed,
                    });
                }
                break;
            }
            Verdict::Tripped => break,
        }
    }

    debug!("Low-speed watchdog for {} stopped", session.file_name());
}
