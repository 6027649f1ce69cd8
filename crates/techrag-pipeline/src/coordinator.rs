//! Run orchestration

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::intermediate::IntermediateStore;
use crate::source::{document_id_for_chunks, list_json_files, read_chunks, unique_documents};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use techrag_domain::{
    CancellationSignal, Episode, ExtractionStats, GraphStore, RunId, RunSummary, TextTransformer,
};
use techrag_extractor::{BatchExtractionRunner, Instructions, StructuredExtractor};
use techrag_ingest::{EpisodeBuilder, IngestionScheduler};
use tracing::{error, info, warn};

/// Result of the extraction stage
#[derive(Debug, Clone, Default)]
pub struct ExtractionRun {
    /// Intermediate files written, one per source document
    pub written: Vec<PathBuf>,

    /// Counters across all documents
    pub stats: ExtractionStats,

    /// Whether cancellation stopped the stage early
    pub cancelled: bool,
}

/// Sequences extraction, persistence, episode building and ingestion.
///
/// Only failures around durable state (reading chunk files, writing or
/// reading intermediate results) and store preparation abort a run.
/// Chunk and episode failures are counted in the [`RunSummary`].
pub struct RunCoordinator {
    config: PipelineConfig,
    store: Arc<dyn GraphStore>,
    transformer: Option<Arc<dyn TextTransformer>>,
    cancel: CancellationSignal,
    reference_time: Option<DateTime<Utc>>,
    run_id: RunId,
}

impl RunCoordinator {
    /// Create a coordinator; the configuration is validated here
    pub fn new(config: PipelineConfig, store: Arc<dyn GraphStore>) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;
        Ok(Self {
            config,
            store,
            transformer: None,
            cancel: CancellationSignal::new(),
            reference_time: None,
            run_id: RunId::new(),
        })
    }

    /// Provide the transformer used by the extraction stage
    pub fn with_transformer(mut self, transformer: Arc<dyn TextTransformer>) -> Self {
        self.transformer = Some(transformer);
        self
    }

    /// Observe a run-level cancellation signal
    pub fn with_cancellation(mut self, cancel: CancellationSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Pin the reference time stamped on every episode (defaults to run start)
    pub fn with_reference_time(mut self, reference_time: DateTime<Utc>) -> Self {
        self.reference_time = Some(reference_time);
        self
    }

    /// Identifier of this run
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Extract every chunk file into the intermediate store.
    ///
    /// Results are persisted per document; a document interrupted by
    /// cancellation is not written.
    pub async fn extract(&self) -> Result<ExtractionRun, PipelineError> {
        let transformer = self
            .transformer
            .clone()
            .ok_or_else(|| PipelineError::Config("extraction requires a transformer".to_string()))?;

        let extraction = &self.config.extraction;
        let instructions = Instructions::load(extraction.instructions_path.as_deref())
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        let extractor = StructuredExtractor::new(transformer.clone(), extraction.clone())
            .with_instructions(instructions);
        let runner =
            BatchExtractionRunner::new(Arc::new(extractor)).with_cancellation(self.cancel.clone());
        let intermediate = IntermediateStore::new(&self.config.intermediate_dir);

        let documents = unique_documents(
            list_json_files(&self.config.chunks_dir)?,
            document_id_for_chunks,
        )?;
        info!(
            run_id = %self.run_id,
            "Extracting {} chunk files from {} with {}",
            documents.len(),
            self.config.chunks_dir.display(),
            transformer.model_name()
        );

        let mut run = ExtractionRun::default();
        for (document_id, path) in documents {
            if self.cancel.is_cancelled() {
                run.cancelled = true;
                break;
            }

            info!(document = %document_id, "Loading {}", path.display());
            let chunks = read_chunks(&path)?;

            let report = runner.run(&chunks, extraction.batch_size).await;
            run.stats.merge(&report.stats);
            if report.cancelled {
                warn!(document = %document_id, "Cancelled; results for this document are not saved");
                run.cancelled = true;
                break;
            }

            let written = intermediate.write(&document_id, &report.records)?;
            info!("Saved: {} ({} items)", written.display(), report.records.len());
            run.written.push(written);
        }

        Ok(run)
    }

    /// Ingest everything in the intermediate store.
    ///
    /// The store is always closed afterwards, including on error.
    pub async fn ingest(&self) -> Result<RunSummary, PipelineError> {
        let result = self.ingest_inner().await;

        match self.store.close().await {
            Ok(()) => info!("Connection closed"),
            Err(e) => warn!("Failed to close store connection: {}", e),
        }
        result
    }

    /// Extract, then ingest. Ingestion is skipped when extraction was cancelled.
    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        info!(run_id = %self.run_id, "Starting run");
        let extraction = self.extract().await?;

        let mut summary = if extraction.cancelled {
            RunSummary {
                run_id: Some(self.run_id),
                cancelled: true,
                ..RunSummary::default()
            }
        } else {
            self.ingest().await?
        };
        summary.extraction = extraction.stats;

        info!(
            run_id = %self.run_id,
            "Run finished: {}/{} episodes ingested",
            summary.succeeded,
            summary.total_episodes
        );
        Ok(summary)
    }

    async fn ingest_inner(&self) -> Result<RunSummary, PipelineError> {
        let episodes = self.load_episodes()?;

        if self.config.clear_store {
            info!("Clearing existing data...");
            self.store.clear().await?;
        }
        if self.config.build_indices {
            info!("Building indices and constraints...");
            self.store.build_indices().await?;
        }

        let scheduler = IngestionScheduler::with_cancellation(
            self.store.clone(),
            self.config.ingest.clone(),
            self.cancel.clone(),
        );
        let (outcomes, _metrics) = scheduler.ingest_configured(&episodes).await;

        let mut summary = RunSummary::from_outcomes(&outcomes);
        summary.run_id = Some(self.run_id);
        summary.cancelled |= self.cancel.is_cancelled();
        if !summary.failed_names.is_empty() {
            error!(
                "{} episodes failed: {}",
                summary.failed,
                summary.failed_names.join(", ")
            );
        }
        Ok(summary)
    }

    fn load_episodes(&self) -> Result<Vec<Episode>, PipelineError> {
        let intermediate = IntermediateStore::new(&self.config.intermediate_dir);
        let builder = EpisodeBuilder::new(&self.config.ingest.source_label);
        let reference_time = self.reference_time.unwrap_or_else(Utc::now);

        info!("Loading episodes from {}", intermediate.dir().display());
        let mut episodes = Vec::new();
        for (document_id, path) in intermediate.documents()? {
            info!(document = %document_id, "Loading {}", path.display());
            let records = intermediate.read(&path)?;
            episodes.extend(builder.build(&records, &document_id, reference_time)?);
        }
        info!("Total episodes to ingest: {}", episodes.len());
        Ok(episodes)
    }
}
