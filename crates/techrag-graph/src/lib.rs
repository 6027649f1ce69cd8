//! TechRAG Graph Store Layer
//!
//! Implementations of the [`GraphStore`](techrag_domain::GraphStore) trait.
//!
//! # Stores
//!
//! - `HttpGraphStore`: REST client for a remote episode-ingestion service
//! - `MemoryGraphStore`: In-process store for dry runs and tests, with
//!   scripted failures and in-flight accounting

#![warn(missing_docs)]

pub mod http;
pub mod memory;

pub use http::HttpGraphStore;
pub use memory::MemoryGraphStore;
