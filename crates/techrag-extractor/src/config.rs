//! Configuration for the extraction stage

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for [`crate::StructuredExtractor`] and [`crate::BatchExtractionRunner`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum time for a single transformer call (seconds)
    pub transform_timeout_secs: u64,

    /// Chunks submitted concurrently per batch
    pub batch_size: usize,

    /// Pause between batches (milliseconds); not applied after the last batch
    pub batch_pause_ms: u64,

    /// Model requested from the transformer
    pub model_name: String,

    /// Optional file overriding the built-in instruction template
    pub instructions_path: Option<PathBuf>,
}

impl ExtractorConfig {
    /// Get the transform timeout as a Duration
    pub fn transform_timeout(&self) -> Duration {
        Duration::from_secs(self.transform_timeout_secs)
    }

    /// Get the inter-batch pause as a Duration
    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }
        if self.transform_timeout_secs == 0 {
            return Err("transform_timeout_secs must be greater than 0".to_string());
        }
        if self.model_name.trim().is_empty() {
            return Err("model_name must not be empty".to_string());
        }
        Ok(())
    }

    /// Aggressive preset: wider batches, no pause, shorter timeout
    pub fn aggressive() -> Self {
        Self {
            transform_timeout_secs: 60,
            batch_size: 10,
            batch_pause_ms: 0,
            ..Self::default()
        }
    }

    /// Lenient preset: narrow batches and a longer courtesy pause
    pub fn lenient() -> Self {
        Self {
            transform_timeout_secs: 300,
            batch_size: 2,
            batch_pause_ms: 2_000,
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

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            transform_timeout_secs: 120,
            batch_size: 5,
            batch_pause_ms: 500,
            model_name: "gpt-5-nano".to_string(),
            instructions_path: None,
        }
    }
}
