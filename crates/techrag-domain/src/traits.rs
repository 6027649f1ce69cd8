//! Trait definitions for external collaborators
//!
//! These traits define the boundaries between pipeline logic and the remote
//! services it drives. Implementations live in `techrag-llm` and
//! `techrag-graph`; tests use in-process fakes.

use async_trait::async_trait;
use thiserror::Error;

use crate::Episode;

/// Errors returned by a text transformer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The service asked us to slow down
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The service answered with something we cannot read
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Anything else
    #[error("Transformer error: {0}")]
    Other(String),
}

/// Errors returned by a graph store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The store answered with a non-success status
    #[error("Store rejected request ({status}): {body}")]
    Rejected {
        /// HTTP-like status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// Network or connection error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The store does not support this operation
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Anything else
    #[error("Store error: {0}")]
    Other(String),
}

/// Remote text-transformation service (an LLM endpoint in practice).
///
/// May fail, may be slow, and may return text that does not follow the
/// instructions. Callers own timeouts and output validation.
#[async_trait]
pub trait TextTransformer: Send + Sync {
    /// Name of the underlying model, for logs
    fn model_name(&self) -> &str;

    /// Transform `input` according to `instructions`
    async fn transform(&self, instructions: &str, input: &str) -> Result<String, TransformError>;
}

/// Remote graph-backed episode store.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Submit a single episode
    async fn submit(&self, episode: &Episode) -> Result<(), StoreError>;

    /// Submit several episodes in one call.
    ///
    /// The default implementation submits them one by one and stops at the
    /// first error.
    async fn submit_bulk(&self, episodes: &[Episode]) -> Result<(), StoreError> {
        for episode in episodes {
            self.submit(episode).await?;
        }
        Ok(())
    }

    /// Remove all existing data
    async fn clear(&self) -> Result<(), StoreError>;

    /// Build indices and constraints
    async fn build_indices(&self) -> Result<(), StoreError>;

    /// Release connections
    async fn close(&self) -> Result<(), StoreError>;
}
