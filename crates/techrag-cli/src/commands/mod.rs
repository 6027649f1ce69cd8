//! Command implementations.

pub mod config;
pub mod extract;
pub mod ingest;
pub mod run;

pub use self::config::execute_config;
pub use self::extract::execute_extract;
pub use self::ingest::execute_ingest;
pub use self::run::execute_run;

use crate::error::{CliError, Result};
use std::sync::Arc;
use techrag_domain::{GraphStore, TextTransformer};
use techrag_graph::{HttpGraphStore, MemoryGraphStore};
use techrag_llm::OpenAiTransformer;
use techrag_pipeline::PipelineConfig;
use tracing::info;

/// Graph store for this invocation: in-memory for dry runs, HTTP otherwise
pub(crate) fn build_store(config: &PipelineConfig, dry_run: bool) -> Result<Arc<dyn GraphStore>> {
    if dry_run {
        info!("Dry run: episodes go to an in-memory store");
        return Ok(Arc::new(MemoryGraphStore::new()));
    }
    let store = HttpGraphStore::new(&config.store.endpoint, config.store.timeout())?;
    info!(endpoint = %store.base_url(), "Using graph store");
    Ok(Arc::new(store))
}

/// Transformer for this invocation, reading the API key from the environment
pub(crate) fn build_transformer(config: &PipelineConfig) -> Result<Arc<dyn TextTransformer>> {
    let var = &config.transformer.api_key_env;
    let api_key = std::env::var(var)
        .map_err(|_| CliError::Config(format!("environment variable {} is not set", var)))?;

    let transformer = OpenAiTransformer::new(
        &config.transformer.base_url,
        api_key,
        &config.extraction.model_name,
        config.extraction.transform_timeout(),
    )?
    .with_max_attempts(config.transformer.max_attempts);

    info!(
        endpoint = %transformer.endpoint(),
        model = %config.extraction.model_name,
        "Using transformer"
    );
    Ok(Arc::new(transformer))
}
