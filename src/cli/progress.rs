//! Console narration and the live status line
//!
//! [`ConsoleReporter`] receives both transfer and batch events. Batch
//! narration is printed to stdout. The live status line of the current
//! transfer is an indicatif spinner on stderr, drawn only when stderr is a
//! terminal.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::app::batch::{BatchEvent, BatchObserver, OutcomeStatus};
use crate::app::format::{format_duration, format_size, format_speed};
use crate::app::transfer::{ProgressSnapshot, TransferEvent, TransferObserver};

/// Render the status line for one progress snapshot
///
/// With a known total the line carries the percentage, plus the speed and ETA
/// when the speed is above `min_valid_speed`, the speed alone when it is
/// positive but lower, and "waiting for data" when nothing is arriving.
/// Without a total only the byte count and speed are shown.
pub fn status_message(snapshot: &ProgressSnapshot, min_valid_speed: f64) -> String {
    let transferred = format_size(snapshot.bytes);

    let Some(total) = snapshot.total else {
        return format!("{} {}", transferred, format_speed(snapshot.speed));
    };

    let percent = snapshot.percent().unwrap_or(0.0);
    let head = format!("{:5.1}% {}/{}", percent, transferred, format_size(total));

    if snapshot.speed > min_valid_speed {
        match snapshot.eta {
            Some(eta) => format!(
                "{} {} ETA {}",
                head,
                format_speed(snapshot.speed),
                format_duration(eta)
            ),
            None => format!("{} {}", head, format_speed(snapshot.speed)),
        }
    } else if snapshot.speed > 0.0 {
        format!("{} {}", head, format_speed(snapshot.speed))
    } else {
        format!("{} waiting for data", head)
    }
}

/// Terminal front end for a batch run
pub struct ConsoleReporter {
    bar: Mutex<Option<ProgressBar>>,
    is_terminal: bool,
    quiet: bool,
    min_valid_speed: f64,
}

impl ConsoleReporter {
    pub fn new(quiet: bool, min_valid_speed: f64) -> Self {
        Self {
            bar: Mutex::new(None),
            is_terminal: atty::is(atty::Stream::Stderr),
            quiet,
            min_valid_speed,
        }
    }

    fn bar(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.bar.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Print a narration line above the status line, if one is drawn
    fn say(&self, line: String) {
        if self.quiet {
            return;
        }
        match self.bar().as_ref() {
            Some(bar) => bar.println(line),
            None => println!("{}", line),
        }
    }

    fn start_bar(&self, file_name: &str) {
        if !self.is_terminal || self.quiet {
            return;
        }

        let bar = ProgressBar::new_spinner();
        match ProgressStyle::default_spinner().template("{spinner:.green} {prefix} {msg}") {
            Ok(style) => bar.set_style(style),
            Err(e) => debug!("Progress template error: {}", e),
        }
        bar.set_prefix(file_name.to_string());
        bar.set_message("connecting");
        bar.enable_steady_tick(Duration::from_millis(120));

        if let Some(previous) = self.bar().replace(bar) {
            previous.finish_and_clear();
        }
    }

    fn clear_bar(&self) {
        if let Some(bar) = self.bar().take() {
            bar.finish_and_clear();
        }
    }
}

impl TransferObserver for ConsoleReporter {
    fn handle(&self, event: TransferEvent) {
        match event {
            TransferEvent::Started { file_name, total } => {
                debug!("Transfer of {} started, size {:?}", file_name, total);
                self.start_bar(&file_name);
            }
            TransferEvent::Progress(snapshot) => {
                if let Some(bar) = self.bar().as_ref() {
                    bar.set_message(status_message(&snapshot, self.min_valid_speed));
                }
            }
            TransferEvent::LowSpeed {
                speed,
                low_for,
                min_speed,
            } => self.say(format!(
                "  ! speed {} below {} for {}",
                format_speed(speed),
                format_speed(min_speed),
                format_duration(low_for)
            )),
            TransferEvent::Recovered { speed } => {
                self.say(format!("  speed recovered to {}", format_speed(speed)))
            }
            TransferEvent::Cancelled { reason, speed } => {
                self.say(format!(
                    "  x transfer cancelled: {} ({})",
                    reason,
                    format_speed(speed)
                ));
            }
            TransferEvent::Completed(summary) => {
                self.clear_bar();
                self.say(format!(
                    "  saved {} in {} ({})",
                    format_size(summary.bytes),
                    format_duration(summary.elapsed),
                    format_speed(summary.average_speed)
                ));
                if let Some(backup) = summary.backup_path {
                    self.say(format!("  previous file kept as {}", backup.display()));
                }
            }
            TransferEvent::Aborted => self.clear_bar(),
        }
    }
}

impl BatchObserver for ConsoleReporter {
    fn handle(&self, event: BatchEvent) {
        match event {
            BatchEvent::GroupStarted { group, items } => {
                self.say(format!("\n[{}] {} item(s)", group, items));
            }
            BatchEvent::ItemUpToDate { name, destination } => {
                self.say(format!(
                    "- {} is up to date ({})",
                    name,
                    destination.display()
                ));
            }
            BatchEvent::ItemStarted { name, destination } => {
                self.say(format!("> {} -> {}", name, destination.display()));
            }
            BatchEvent::UrlConverted { from, to } => {
                self.say(format!("  using {} for {}", to, from));
            }
            BatchEvent::UrlRejected { url, error } => {
                self.say(format!("  skipping {}: {}", url, error));
            }
            BatchEvent::Attempt {
                url,
                attempt,
                retries,
            } => {
                self.say(format!("  [{}/{}] {}", attempt, retries, url));
            }
            BatchEvent::AttemptFailed { kind, error } => {
                self.say(format!("  failed ({}): {}", kind, error));
            }
            BatchEvent::RetryScheduled { delay } => {
                self.say(format!("  retrying in {}", format_duration(delay)));
            }
            BatchEvent::ItemFinished { name, status, .. } => match status {
                OutcomeStatus::NotFound => {
                    self.say(format!("  x {}: not found at any URL", name));
                }
                OutcomeStatus::Failed { error } => {
                    self.say(format!("  x {}: {}", name, error));
                }
                OutcomeStatus::Cancelled => {
                    self.clear_bar();
                    self.say(format!("  x {}: interrupted", name));
                }
                OutcomeStatus::Downloaded { .. } | OutcomeStatus::UpToDate => {}
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(bytes: u64, total: Option<u64>, speed: f64, eta: Option<Duration>) -> ProgressSnapshot {
        ProgressSnapshot {
            bytes,
            total,
            speed,
            eta,
            elapsed: Duration::from_secs(3),
        }
    }

    /// Test percentage, speed and ETA with a known size
    #[test]
    fn test_status_with_eta() {
        let line = status_message(
            &snapshot(512, Some(1024), 2048.0, Some(Duration::from_secs(65))),
            10.0,
        );
        assert_eq!(line, " 50.0% 512 B/1.00 KB 2.00 KB/s ETA 1m5s");
    }

    /// Test that a slow but non-zero speed shows no ETA
    #[test]
    fn test_status_slow_speed_without_eta() {
        let line = status_message(&snapshot(100, Some(1000), 5.0, None), 10.0);
        assert_eq!(line, " 10.0% 100 B/1000 B 5 B/s");
    }

    /// Test the waiting state at zero speed
    #[test]
    fn test_status_waiting_for_data() {
        let line = status_message(&snapshot(0, Some(1000), 0.0, None), 10.0);
        assert_eq!(line, "  0.0% 0 B/1000 B waiting for data");
    }

    /// Test that an unknown size shows only bytes and speed
    #[test]
    fn test_status_unknown_total() {
        let line = status_message(&snapshot(2048, None, 1024.0, None), 10.0);
        assert_eq!(line, "2.00 KB 1.00 KB/s");
        assert!(!line.contains('%'));
        assert!(!line.contains("ETA"));
    }

    /// Test that the reporter tolerates events without a drawn status line
    #[test]
    fn test_reporter_without_terminal() {
        let reporter = ConsoleReporter {
            bar: Mutex::new(None),
            is_terminal: false,
            quiet: true,
            min_valid_speed: 10.0,
        };

        TransferObserver::handle(
            &reporter,
            TransferEvent::Started {
                file_name: "a.bin".to_string(),
                total: Some(10),
            },
        );
        TransferObserver::handle(
            &reporter,
            TransferEvent::Progress(snapshot(5, Some(10), 1.0, None)),
        );
        TransferObserver::handle(&reporter, TransferEvent::Aborted);
        BatchObserver::handle(
            &reporter,
            BatchEvent::RetryScheduled {
                delay: Duration::from_secs(2),
            },
        );

        assert!(reporter.bar().is_none());
    }
}
