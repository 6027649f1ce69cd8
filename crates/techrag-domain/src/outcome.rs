//! Outcome module - per-episode results and the run summary

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a single pipeline run (UUIDv7, sorts by start time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(uuid::Uuid);

impl RunId {
    /// Generate a new run identifier
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

const CANCELLED: &str = "cancelled";

/// Settled result of submitting one episode.
///
/// Every episode handed to the scheduler yields exactly one outcome.
/// `attempts` counts real submissions; it is zero only when the run was
/// cancelled before the episode was ever submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    /// Name of the episode
    pub episode_name: String,

    /// Whether the store accepted the episode
    pub succeeded: bool,

    /// Number of submissions made
    pub attempts: u32,

    /// Last error message for failed episodes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IngestOutcome {
    /// Outcome for an accepted episode
    pub fn success(episode_name: impl Into<String>, attempts: u32) -> Self {
        Self {
            episode_name: episode_name.into(),
            succeeded: true,
            attempts,
            error: None,
        }
    }

    /// Outcome for a rejected episode
    pub fn failure(episode_name: impl Into<String>, attempts: u32, error: impl Into<String>) -> Self {
        Self {
            episode_name: episode_name.into(),
            succeeded: false,
            attempts,
            error: Some(error.into()),
        }
    }

    /// Outcome for an episode skipped because the run was cancelled
    pub fn cancelled(episode_name: impl Into<String>) -> Self {
        Self::failure(episode_name, 0, CANCELLED)
    }

    /// Whether this outcome was produced by cancellation
    pub fn was_cancelled(&self) -> bool {
        !self.succeeded && self.attempts == 0 && self.error.as_deref() == Some(CANCELLED)
    }
}

/// Counters describing the extraction stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Chunks handed to the runner
    pub chunks: usize,

    /// Records produced
    pub records: usize,

    /// Chunks whose answer was discarded as useless
    pub discarded: usize,

    /// Chunks that failed (transform, parse or shape error)
    pub errored: usize,

    /// Of `errored`, chunks whose remote call failed or timed out
    #[serde(default)]
    pub transform_failures: usize,
}

impl ExtractionStats {
    /// Fold another set of counters into this one
    pub fn merge(&mut self, other: &ExtractionStats) {
        self.chunks += other.chunks;
        self.records += other.records;
        self.discarded += other.discarded;
        self.errored += other.errored;
        self.transform_failures += other.transform_failures;
    }
}

/// Operator-facing report of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Run identifier
    pub run_id: Option<RunId>,

    /// Episodes handed to the scheduler
    pub total_episodes: usize,

    /// Episodes accepted by the store
    pub succeeded: usize,

    /// Episodes that failed or were skipped
    pub failed: usize,

    /// Names of failed episodes, in input order
    pub failed_names: Vec<String>,

    /// Extraction counters (zero when extraction did not run)
    pub extraction: ExtractionStats,

    /// Whether the run observed cancellation
    pub cancelled: bool,
}

impl RunSummary {
    /// Build a summary from settled outcomes
    pub fn from_outcomes(outcomes: &[IngestOutcome]) -> Self {
        let failed_names: Vec<String> = outcomes
            .iter()
            .filter(|o| !o.succeeded)
            .map(|o| o.episode_name.clone())
            .collect();

        Self {
            run_id: None,
            total_episodes: outcomes.len(),
            succeeded: outcomes.len() - failed_names.len(),
            failed: failed_names.len(),
            failed_names,
            extraction: ExtractionStats::default(),
            cancelled: outcomes.iter().any(IngestOutcome::was_cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let outcomes = vec![
            IngestOutcome::success("a", 1),
            IngestOutcome::failure("b", 3, "boom"),
            IngestOutcome::success("c", 2),
        ];
        let summary = RunSummary::from_outcomes(&outcomes);
        assert_eq!(summary.total_episodes, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failed_names, vec!["b".to_string()]);
        assert!(!summary.cancelled);
    }

    #[test]
    fn test_cancelled_outcome_is_failed_with_zero_attempts() {
        let outcome = IngestOutcome::cancelled("x");
        assert!(!outcome.succeeded);
        assert_eq!(outcome.attempts, 0);
        assert!(outcome.was_cancelled());

        let summary = RunSummary::from_outcomes(&[outcome]);
        assert!(summary.cancelled);
        assert_eq!(summary.failed_names, vec!["x".to_string()]);
    }

    #[test]
    fn test_stats_merge() {
        let mut total = ExtractionStats::default();
        total.merge(&ExtractionStats { chunks: 4, records: 2, discarded: 1, errored: 1, transform_failures: 1 });
        total.merge(&ExtractionStats { chunks: 1, records: 3, discarded: 0, errored: 0, transform_failures: 0 });
        assert_eq!(
            total,
            ExtractionStats { chunks: 5, records: 5, discarded: 1, errored: 1, transform_failures: 1 }
        );
    }

    #[test]
    fn test_run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }
}
