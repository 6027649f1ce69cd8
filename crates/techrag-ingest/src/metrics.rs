//! Counters for one ingestion run

use std::time::Duration;
use techrag_domain::IngestOutcome;

/// Metrics derived from the settled outcomes of an ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestMetrics {
    /// Episodes handed to the policy
    pub episodes: usize,

    /// Episodes accepted by the store
    pub succeeded: usize,

    /// Episodes that failed after submission
    pub failed: usize,

    /// Episodes never submitted because of cancellation
    pub cancelled: usize,

    /// Episodes that needed more than one attempt
    pub retried: usize,

    /// Submissions made across all episodes
    pub total_attempts: u64,

    /// Wall-clock time of the run
    pub elapsed: Duration,
}

impl IngestMetrics {
    /// Tally a set of outcomes
    pub fn from_outcomes(outcomes: &[IngestOutcome], elapsed: Duration) -> Self {
        let mut metrics = Self {
            episodes: outcomes.len(),
            elapsed,
            ..Self::default()
        };
        for outcome in outcomes {
            metrics.total_attempts += u64::from(outcome.attempts);
            if outcome.attempts > 1 {
                metrics.retried += 1;
            }
            if outcome.succeeded {
                metrics.succeeded += 1;
            } else if outcome.was_cancelled() {
                metrics.cancelled += 1;
            } else {
                metrics.failed += 1;
            }
        }
        metrics
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Ingestion Metrics Summary".to_string(),
            "=========================".to_string(),
            format!("Episodes: {}", self.episodes),
            format!("Succeeded: {}", self.succeeded),
            format!("Failed: {}", self.failed),
        ];
        if self.cancelled > 0 {
            lines.push(format!("Cancelled: {}", self.cancelled));
        }
        lines.push(format!(
            "Attempts: {} ({} episodes retried)",
            self.total_attempts, self.retried
        ));
        lines.push(format!("Elapsed: {:.1}s", self.elapsed.as_secs_f64()));
        lines.join("\n")
    }
}
