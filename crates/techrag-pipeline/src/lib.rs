//! TechRAG Pipeline
//!
//! Orchestrates a full run: chunk files on disk, batched extraction,
//! durable intermediate results, episode building and ingestion.
//!
//! # Data flow
//!
//! ```text
//! chunks_dir/X_chunks.json ──extract──▶ intermediate_dir/X_clean.json ──ingest──▶ GraphStore
//! ```
//!
//! Extraction and ingestion can run separately ([`RunCoordinator::extract`],
//! [`RunCoordinator::ingest`]) or together ([`RunCoordinator::run`]).

#![warn(missing_docs)]

mod config;
mod coordinator;
mod error;
mod intermediate;
mod source;

pub use config::{PipelineConfig, StoreConfig, TransformerConfig};
pub use coordinator::{ExtractionRun, RunCoordinator};
pub use error::PipelineError;
pub use intermediate::{document_id_for_results, IntermediateStore};
pub use source::{document_id_for_chunks, list_json_files, read_chunks};
