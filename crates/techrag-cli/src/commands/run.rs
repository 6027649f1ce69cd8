//! Run command implementation.

use super::{build_store, build_transformer};
use crate::cli::RunArgs;
use crate::config;
use crate::error::Result;
use crate::output::Formatter;
use techrag_domain::CancellationSignal;
use techrag_pipeline::{PipelineConfig, RunCoordinator};

/// Execute the run command: extraction followed by ingestion.
pub async fn execute_run(
    args: RunArgs,
    mut pipeline: PipelineConfig,
    cancel: CancellationSignal,
    formatter: &Formatter,
) -> Result<()> {
    config::apply_extract(&mut pipeline, &args.extract)?;
    config::apply_ingest(&mut pipeline, &args.ingest_args());
    config::validate(&pipeline)?;

    let transformer = build_transformer(&pipeline)?;
    let store = build_store(&pipeline, args.dry_run)?;
    let coordinator = RunCoordinator::new(pipeline, store)?
        .with_transformer(transformer)
        .with_cancellation(cancel);

    let summary = coordinator.run().await?;
    println!("{}", formatter.format_summary(&summary)?);
    Ok(())
}
