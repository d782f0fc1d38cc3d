//! Batch results

use std::path::PathBuf;
use std::time::Duration;

/// What happened to one item
#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeStatus {
    /// A fresh copy was saved
    Downloaded { bytes: u64 },
    /// The existing file was current
    UpToDate,
    /// The last URL tried answered 404
    NotFound,
    /// Every URL failed
    Failed { error: String },
    /// The run was cancelled while this item was in progress
    Cancelled,
}

impl OutcomeStatus {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            OutcomeStatus::Downloaded { .. } | OutcomeStatus::UpToDate
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemOutcome {
    pub group: String,
    pub name: String,
    pub destination: PathBuf,
    pub status: OutcomeStatus,
}

/// Tally of a batch run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchStats {
    /// Items in the list, attempted or not
    pub total: usize,
    /// One entry per item processed, in order
    pub outcomes: Vec<ItemOutcome>,
    /// The run stopped early
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl BatchStats {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: ItemOutcome) {
        if outcome.status == OutcomeStatus::Cancelled {
            self.cancelled = true;
        }
        self.outcomes.push(outcome);
    }

    /// Downloaded or already up to date
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status.is_success())
            .count()
    }

    pub fn downloaded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Downloaded { .. }))
            .count()
    }

    pub fn up_to_date(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::UpToDate)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o.status,
                    OutcomeStatus::NotFound | OutcomeStatus::Failed { .. }
                )
            })
            .count()
    }

    pub fn bytes_downloaded(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| match o.status {
                OutcomeStatus::Downloaded { bytes } => bytes,
                _ => 0,
            })
            .sum()
    }

    pub fn all_succeeded(&self) -> bool {
        !self.cancelled && self.succeeded() == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: OutcomeStatus) -> ItemOutcome {
        ItemOutcome {
            group: "g".to_string(),
            name: "n".to_string(),
            destination: PathBuf::from("out/g/n"),
            status,
        }
    }

    #[test]
    fn test_tally() {
        let mut stats = BatchStats::new(5);
        stats.record(outcome(OutcomeStatus::Downloaded { bytes: 100 }));
        stats.record(outcome(OutcomeStatus::UpToDate));
        stats.record(outcome(OutcomeStatus::NotFound));
        stats.record(outcome(OutcomeStatus::Failed {
            error: "boom".to_string(),
        }));
        stats.record(outcome(OutcomeStatus::Downloaded { bytes: 50 }));

        assert_eq!(stats.succeeded(), 3);
        assert_eq!(stats.downloaded(), 2);
        assert_eq!(stats.up_to_date(), 1);
        assert_eq!(stats.failed(), 2);
        assert_eq!(stats.bytes_downloaded(), 150);
        assert!(!stats.all_succeeded());
    }

    #[test]
    fn test_cancelled_outcome_marks_run() {
        let mut stats = BatchStats::new(2);
        stats.record(outcome(OutcomeStatus::UpToDate));
        stats.record(outcome(OutcomeStatus::Cancelled));
        assert!(stats.cancelled);
        assert_eq!(stats.succeeded(), 1);
        assert_eq!(stats.failed(), 0);
    }
}
