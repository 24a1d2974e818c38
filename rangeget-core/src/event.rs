use crate::errors::FetchError;

/// Messages sent from fetch tasks to the coordinator.
#[derive(Debug)]
pub enum Event {
    /// Bytes written into range `index` so far. Restarts from zero on retry.
    ProgressChanged { index: usize, written: u64 },
    /// Final outcome of range `index`. Sent once per range.
    Finished { index: usize, outcome: FetchOutcome },
}

#[derive(Debug)]
pub enum FetchOutcome {
    Success,
    Failed(FetchError),
}

/// Overall progress handed to the caller's progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub downloaded: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeFailure {
    pub index: usize,
    pub reason: String,
}

/// Tally of range outcomes, filled in by the coordinator.
#[derive(Debug, Default)]
pub struct DownloadResult {
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<RangeFailure>,
}

impl DownloadResult {
    pub fn record(&mut self, index: usize, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Success => self.succeeded += 1,
            FetchOutcome::Failed(e) => {
                self.failed += 1;
                self.failures.push(RangeFailure {
                    index,
                    reason: e.to_string(),
                });
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_counts_failures_only() {
        let mut result = DownloadResult::default();
        result.record(0, FetchOutcome::Success);
        result.record(
            2,
            FetchOutcome::Failed(FetchError::Incomplete {
                expected: 10,
                received: 4,
            }),
        );
        result.record(1, FetchOutcome::Success);

        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed, 1);
        assert!(!result.is_success());
        assert_eq!(result.failures[0].index, 2);
        assert_eq!(result.failures[0].reason, "expected 10 bytes, received 4");
    }

    #[test]
    fn test_empty_result_is_success() {
        assert!(DownloadResult::default().is_success());
    }
}
