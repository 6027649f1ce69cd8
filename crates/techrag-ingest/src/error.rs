//! Error types for the ingestion stage

use techrag_domain::StoreError;
use thiserror::Error;

/// Errors raised while submitting an episode.
///
/// These are episode-scoped: policies convert them into failed
/// [`IngestOutcome`](techrag_domain::IngestOutcome)s and never abort the run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestError {
    /// The store rejected or failed the submission
    #[error("Submission failed: {0}")]
    Submission(#[from] StoreError),

    /// The submission did not complete in time
    #[error("Submission timed out after {0}s")]
    Timeout(u64),

    /// Every allowed attempt failed
    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetryExhausted {
        /// Attempts made
        attempts: u32,
        /// Error of the final attempt
        last_error: String,
    },
}
