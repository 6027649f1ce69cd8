//! Configuration for a whole pipeline run
//!
//! One TOML file configures every stage:
//!
//! ```toml
//! chunks_dir = "data/chunks"
//! intermediate_dir = "data/clean_chunks"
//!
//! [extraction]
//! batch_size = 5
//!
//! [ingest.policy]
//! kind = "bounded_parallel"
//! max_concurrent = 5
//!
//! [store]
//! endpoint = "http://localhost:8000"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use techrag_extractor::ExtractorConfig;
use techrag_ingest::IngestConfig;

/// Remote graph store connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL of the episode service
    pub endpoint: String,

    /// HTTP timeout for store calls (seconds)
    pub timeout_secs: u64,
}

impl StoreConfig {
    /// Get the timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Remote text transformer connection.
///
/// The API key is never stored here; `api_key_env` names the environment
/// variable the binary reads it from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformerConfig {
    /// Base URL of the chat-completions API
    pub base_url: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Attempts per call for transient HTTP failures
    pub max_attempts: u32,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_attempts: 3,
        }
    }
}

/// Configuration for [`crate::RunCoordinator`]
///
/// # Examples
///
/// ```
/// use techrag_pipeline::PipelineConfig;
///
/// let config = PipelineConfig::default();
/// assert!(config.validate().is_ok());
/// assert!(config.clear_store);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory of `*_chunks.json` files
    pub chunks_dir: PathBuf,

    /// Directory of `*_clean.json` extraction results
    pub intermediate_dir: PathBuf,

    /// Wipe the store before ingesting
    pub clear_store: bool,

    /// Build store indices before ingesting
    pub build_indices: bool,

    /// Extraction stage
    pub extraction: ExtractorConfig,

    /// Ingestion stage
    pub ingest: IngestConfig,

    /// Graph store connection
    pub store: StoreConfig,

    /// Transformer connection
    pub transformer: TransformerConfig,
}

impl PipelineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunks_dir.as_os_str().is_empty() {
            return Err("chunks_dir must not be empty".to_string());
        }
        if self.intermediate_dir.as_os_str().is_empty() {
            return Err("intermediate_dir must not be empty".to_string());
        }
        if self.store.endpoint.trim().is_empty() {
            return Err("store.endpoint must not be empty".to_string());
        }
        if self.store.timeout_secs == 0 {
            return Err("store.timeout_secs must be greater than 0".to_string());
        }
        if self.transformer.max_attempts == 0 {
            return Err("transformer.max_attempts must be at least 1".to_string());
        }
        if self.transformer.max_attempts > 10 {
            return Err("transformer.max_attempts must not exceed 10".to_string());
        }
        self.extraction
            .validate()
            .map_err(|e| format!("extraction: {}", e))?;
        self.ingest.validate().map_err(|e| format!("ingest: {}", e))
    }

    /// Aggressive preset for both stages
    pub fn aggressive() -> Self {
        Self {
            extraction: ExtractorConfig::aggressive(),
            ingest: IngestConfig::aggressive(),
            ..Self::default()
        }
    }

    /// Lenient preset for both stages
    pub fn lenient() -> Self {
        Self {
            extraction: ExtractorConfig::lenient(),
            ingest: IngestConfig::lenient(),
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunks_dir: PathBuf::from("data/chunks"),
            intermediate_dir: PathBuf::from("data/clean_chunks"),
            clear_store: true,
            build_indices: true,
            extraction: ExtractorConfig::default(),
            ingest: IngestConfig::default(),
            store: StoreConfig::default(),
            transformer: TransformerConfig::default(),
        }
    }
}
