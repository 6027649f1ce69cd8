//! TechRAG Extractor
//!
//! Stage A of the pipeline: turns raw chunks into structured records by
//! calling an external [`TextTransformer`](techrag_domain::TextTransformer).
//!
//! # Architecture
//!
//! ```text
//! Chunk → StructuredExtractor → TextTransformer → fence strip → parse / repair
//!       → useless-response rule → ExtractionRecord[]
//! ```
//!
//! [`BatchExtractionRunner`] drives the extractor over a whole chunk file in
//! fixed-size concurrent batches with a courtesy pause between them.
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use techrag_domain::Chunk;
//! use techrag_extractor::{BatchExtractionRunner, ExtractorConfig, StructuredExtractor};
//! use techrag_llm::MockTransformer;
//!
//! # async fn example() {
//! let transformer = MockTransformer::new(r#"{"info": "Revenue $5B", "data": {"revenue": 5000000000}}"#);
//! let config = ExtractorConfig::default();
//! let batch_size = config.batch_size;
//!
//! let extractor = Arc::new(StructuredExtractor::new(Arc::new(transformer), config));
//! let runner = BatchExtractionRunner::new(extractor);
//!
//! let chunks = vec![Chunk::new(0, "Revenue was $5B", 4)];
//! let report = runner.run(&chunks, batch_size).await;
//! println!("{} records", report.records.len());
//! # }
//! ```

#![warn(missing_docs)]

mod batch;
mod config;
mod error;
mod extractor;
mod parser;
mod prompt;
mod repair;
mod types;

#[cfg(test)]
mod tests;

pub use batch::BatchExtractionRunner;
pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use extractor::StructuredExtractor;
pub use parser::{parse_response, strip_code_fence};
pub use prompt::Instructions;
pub use repair::{JsonRepair, LenientRepair};
pub use types::{ChunkExtraction, ExtractionReport, ParsedPayload};
