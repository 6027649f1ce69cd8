//! Error types for the extraction stage

use techrag_domain::TransformError;
use thiserror::Error;

/// Errors that can occur while extracting one chunk.
///
/// All of these are chunk-scoped: the batch runner logs and counts them and
/// moves on to the next chunk.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// The transformer call failed
    #[error("Transform call failed: {0}")]
    TransformCall(#[from] TransformError),

    /// The transformer call did not answer in time
    #[error("Transform call timed out after {0}s")]
    Timeout(u64),

    /// The answer is not valid JSON, even after repair
    #[error("Parse error: {0}")]
    Parse(String),

    /// The answer parsed but does not have the expected shape
    #[error("Unexpected response shape: {0}")]
    Shape(String),

    /// Cancellation was observed before the call was made
    #[error("Extraction cancelled")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractorError {
    /// Whether this error came from the remote call rather than its output
    pub fn is_transform_failure(&self) -> bool {
        matches!(self, ExtractorError::TransformCall(_) | ExtractorError::Timeout(_))
    }
}
