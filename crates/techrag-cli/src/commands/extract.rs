//! Extract command implementation.

use super::build_transformer;
use crate::cli::ExtractArgs;
use crate::config;
use crate::error::Result;
use crate::output::Formatter;
use std::sync::Arc;
use techrag_domain::CancellationSignal;
use techrag_graph::MemoryGraphStore;
use techrag_pipeline::{PipelineConfig, RunCoordinator};

/// Execute the extract command.
pub async fn execute_extract(
    args: ExtractArgs,
    mut pipeline: PipelineConfig,
    cancel: CancellationSignal,
    formatter: &Formatter,
) -> Result<()> {
    config::apply_extract(&mut pipeline, &args)?;
    config::validate(&pipeline)?;

    let transformer = build_transformer(&pipeline)?;
    // Extraction never touches the store
    let coordinator = RunCoordinator::new(pipeline, Arc::new(MemoryGraphStore::new()))?
        .with_transformer(transformer)
        .with_cancellation(cancel);

    let run = coordinator.extract().await?;
    println!("{}", formatter.format_extraction(&run)?);
    Ok(())
}
