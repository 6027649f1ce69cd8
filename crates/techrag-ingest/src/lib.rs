//! TechRAG Ingest
//!
//! Stage B of the pipeline: maps extraction records to episodes and delivers
//! them to a [`GraphStore`](techrag_domain::GraphStore).
//!
//! # Architecture
//!
//! ```text
//! ExtractionRecord[] → EpisodeBuilder → Episode[] → IngestionScheduler
//!                                                     └─ ExecutionPolicy → GraphStore
//! ```
//!
//! # Execution policies
//!
//! - [`BatchedPolicy`]: fixed-size concurrent batches, no retry, optional bulk calls
//! - [`BoundedParallelPolicy`]: semaphore-bounded workers with exponential backoff (default)
//! - [`SerialPolicy`]: one at a time with a fixed delay, extra cooldown on failure
//!
//! All three return exactly one [`IngestOutcome`](techrag_domain::IngestOutcome)
//! per episode.
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use chrono::Utc;
//! use techrag_graph::MemoryGraphStore;
//! use techrag_ingest::{EpisodeBuilder, IngestConfig, IngestionScheduler};
//!
//! # async fn example(records: Vec<techrag_domain::ExtractionRecord>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = IngestConfig::default();
//! let episodes = EpisodeBuilder::new(&config.source_label).build(&records, "acme", Utc::now())?;
//!
//! let scheduler = IngestionScheduler::new(Arc::new(MemoryGraphStore::new()), config);
//! let (outcomes, metrics) = scheduler.ingest_configured(&episodes).await;
//!
//! assert_eq!(outcomes.len(), episodes.len());
//! println!("{}", metrics.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod episode;
mod error;
mod metrics;
mod policy;
mod scheduler;

#[cfg(test)]
mod tests;

pub use config::{IngestConfig, PolicyConfig};
pub use episode::EpisodeBuilder;
pub use error::IngestError;
pub use metrics::IngestMetrics;
pub use policy::{
    BatchedPolicy, BoundedParallelPolicy, ExecutionPolicy, SerialPolicy, SubmissionContext,
};
pub use scheduler::IngestionScheduler;
