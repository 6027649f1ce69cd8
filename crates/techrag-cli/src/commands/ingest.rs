//! Ingest command implementation.

use super::build_store;
use crate::cli::IngestArgs;
use crate::config;
use crate::error::Result;
use crate::output::Formatter;
use techrag_domain::CancellationSignal;
use techrag_pipeline::{PipelineConfig, RunCoordinator};

/// Execute the ingest command.
///
/// Failed episodes are reported, not returned as an error.
pub async fn execute_ingest(
    args: IngestArgs,
    mut pipeline: PipelineConfig,
    cancel: CancellationSignal,
    formatter: &Formatter,
) -> Result<()> {
    config::apply_ingest(&mut pipeline, &args);
    config::validate(&pipeline)?;

    let store = build_store(&pipeline, args.dry_run)?;
    let coordinator = RunCoordinator::new(pipeline, store)?.with_cancellation(cancel);

    let summary = coordinator.ingest().await?;
    println!("{}", formatter.format_summary(&summary)?);
    Ok(())
}
