//! TechRAG Domain Layer
//!
//! Shared data model and collaborator interfaces for the two-stage
//! extraction/ingestion pipeline.
//!
//! ## Key Concepts
//!
//! - **Chunk**: a bounded unit of source text produced by an external splitter
//! - **ExtractionRecord**: one structured fact extracted from a chunk
//! - **Episode**: one unit of content submitted to the graph store
//! - **IngestOutcome**: the settled result of submitting one episode
//! - **RunSummary**: the operator-facing report of one run
//!
//! ## Architecture
//!
//! This crate holds no I/O. Remote collaborators are expressed as traits
//! ([`TextTransformer`], [`GraphStore`]) implemented in `techrag-llm` and
//! `techrag-graph`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cancel;
pub mod chunk;
pub mod episode;
pub mod outcome;
pub mod record;
pub mod traits;

// Re-exports for convenience
pub use cancel::CancellationSignal;
pub use chunk::Chunk;
pub use episode::{Episode, EpisodeError, EpisodeKind};
pub use outcome::{ExtractionStats, IngestOutcome, RunId, RunSummary};
pub use record::ExtractionRecord;
pub use traits::{GraphStore, StoreError, TextTransformer, TransformError};
