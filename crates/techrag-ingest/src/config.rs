//! Configuration for the ingestion stage

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which execution policy submits episodes, and its knobs.
///
/// Serialized with a `kind` tag:
///
/// ```toml
/// [policy]
/// kind = "bounded_parallel"
/// max_concurrent = 5
/// max_retries = 3
/// base_delay_ms = 1000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyConfig {
    /// Fixed-size concurrent batches, no retry
    Batched {
        /// Episodes per batch
        #[serde(default = "default_batch_size")]
        batch_size: usize,
        /// Submit each batch with a single bulk call
        #[serde(default)]
        use_bulk: bool,
    },

    /// Bounded workers with exponential-backoff retry
    BoundedParallel {
        /// Concurrent submissions allowed
        #[serde(default = "default_max_concurrent")]
        max_concurrent: usize,
        /// Total submission attempts per episode
        #[serde(default = "default_max_retries")]
        max_retries: u32,
        /// Delay after the first failure; doubles after each further one
        #[serde(default = "default_base_delay_ms")]
        base_delay_ms: u64,
    },

    /// One submission at a time with a fixed delay
    Serial {
        /// Sleep after every submission (and once more after a failure)
        #[serde(default = "default_delay_ms")]
        delay_ms: u64,
    },
}

fn default_batch_size() -> usize {
    5
}

fn default_max_concurrent() -> usize {
    5
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_delay_ms() -> u64 {
    1_000
}

impl PolicyConfig {
    /// Batched policy with default knobs
    pub fn batched() -> Self {
        PolicyConfig::Batched {
            batch_size: default_batch_size(),
            use_bulk: false,
        }
    }

    /// Bounded-parallel policy with default knobs
    pub fn bounded_parallel() -> Self {
        PolicyConfig::BoundedParallel {
            max_concurrent: default_max_concurrent(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }

    /// Serial policy with default knobs
    pub fn serial() -> Self {
        PolicyConfig::Serial {
            delay_ms: default_delay_ms(),
        }
    }

    /// Short policy name for logs
    pub fn label(&self) -> &'static str {
        match self {
            PolicyConfig::Batched { .. } => "batched",
            PolicyConfig::BoundedParallel { .. } => "bounded_parallel",
            PolicyConfig::Serial { .. } => "serial",
        }
    }

    /// Validate the policy parameters
    pub fn validate(&self) -> Result<(), String> {
        match self {
            PolicyConfig::Batched { batch_size, .. } if *batch_size == 0 => {
                Err("batched.batch_size must be greater than 0".to_string())
            }
            PolicyConfig::BoundedParallel { max_concurrent, .. } if *max_concurrent == 0 => {
                Err("bounded_parallel.max_concurrent must be greater than 0".to_string())
            }
            PolicyConfig::BoundedParallel { max_retries, .. } if *max_retries == 0 => {
                Err("bounded_parallel.max_retries must be at least 1".to_string())
            }
            PolicyConfig::BoundedParallel { max_retries, .. } if *max_retries > 16 => {
                Err("bounded_parallel.max_retries must not exceed 16".to_string())
            }
            _ => Ok(()),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::bounded_parallel()
    }
}

/// Configuration for the [`crate::IngestionScheduler`]
///
/// # Examples
///
/// ```
/// use techrag_ingest::{IngestConfig, PolicyConfig};
///
/// let config = IngestConfig::default();
/// assert_eq!(config.policy.label(), "bounded_parallel");
///
/// let config = IngestConfig::aggressive();
/// assert!(matches!(config.policy, PolicyConfig::Batched { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Timeout for a single store submission (seconds)
    pub submit_timeout_secs: u64,

    /// Execution policy
    pub policy: PolicyConfig,

    /// Label used in source descriptions, e.g. "10-K filing"
    pub source_label: String,
}

impl IngestConfig {
    /// Get the submit timeout as a Duration
    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.submit_timeout_secs == 0 {
            return Err("submit_timeout_secs must be greater than 0".to_string());
        }
        if self.source_label.trim().is_empty() {
            return Err("source_label must not be empty".to_string());
        }
        self.policy.validate()
    }

    /// Aggressive preset: wide batches, no retry, short timeout
    pub fn aggressive() -> Self {
        Self {
            submit_timeout_secs: 30,
            policy: PolicyConfig::Batched {
                batch_size: 10,
                use_bulk: false,
            },
            ..Self::default()
        }
    }

    /// Lenient preset: few workers, more retries, long backoff
    pub fn lenient() -> Self {
        Self {
            submit_timeout_secs: 180,
            policy: PolicyConfig::BoundedParallel {
                max_concurrent: 2,
                max_retries: 5,
                base_delay_ms: 2_000,
            },
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

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            submit_timeout_secs: 120,
            policy: PolicyConfig::default(),
            source_label: "10-K filing".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(IngestConfig::default().validate().is_ok());
        assert!(IngestConfig::aggressive().validate().is_ok());
        assert!(IngestConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_invalid_policies() {
        for policy in [
            PolicyConfig::Batched { batch_size: 0, use_bulk: true },
            PolicyConfig::BoundedParallel { max_concurrent: 0, max_retries: 3, base_delay_ms: 10 },
            PolicyConfig::BoundedParallel { max_concurrent: 2, max_retries: 0, base_delay_ms: 10 },
        ] {
            assert!(policy.validate().is_err(), "{policy:?}");
        }
    }

    #[test]
    fn test_policy_from_toml_tag() {
        let config = IngestConfig::from_toml(
            r#"
            submit_timeout_secs = 45

            [policy]
            kind = "serial"
            delay_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.submit_timeout(), Duration::from_secs(45));
        assert_eq!(config.policy, PolicyConfig::Serial { delay_ms: 250 });
        assert_eq!(config.source_label, "10-K filing");
    }

    #[test]
    fn test_policy_fields_default() {
        let config = IngestConfig::from_toml("[policy]\nkind = \"batched\"").unwrap();
        assert_eq!(
            config.policy,
            PolicyConfig::Batched { batch_size: 5, use_bulk: false }
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let config = IngestConfig::lenient();
        let parsed = IngestConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }
}
