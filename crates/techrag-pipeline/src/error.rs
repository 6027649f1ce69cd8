//! Error types for pipeline orchestration

use std::path::PathBuf;
use techrag_domain::{EpisodeError, StoreError};
use thiserror::Error;

/// Fatal errors that abort a run.
///
/// Chunk- and episode-level failures never surface here; they are counted in
/// the run summary instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A file could not be read or written
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A chunk file is not valid JSON of the expected shape
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// Intermediate extraction results could not be persisted or loaded
    #[error("Intermediate store failure at {path}: {reason}")]
    Intermediate {
        /// File involved
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Two input files map to the same document id
    #[error("Files {first} and {second} both map to document '{document_id}'")]
    DuplicateDocument {
        /// Shared document id
        document_id: String,
        /// File seen first, in sorted order
        first: PathBuf,
        /// File seen second
        second: PathBuf,
    },

    /// Store preparation (clear or index build) failed
    #[error("Store setup failed: {0}")]
    Store(#[from] StoreError),

    /// Records could not be mapped to episodes
    #[error(transparent)]
    Episode(#[from] EpisodeError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}
