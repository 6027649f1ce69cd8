//! Batched, bounded-concurrency extraction over a chunk collection

use crate::error::ExtractorError;
use crate::extractor::StructuredExtractor;
use crate::types::{ChunkExtraction, ExtractionReport};
use futures_util::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use techrag_domain::{CancellationSignal, Chunk, ExtractionStats};
use tracing::{info, warn};

/// Drives a [`StructuredExtractor`] over chunks in consecutive batches.
///
/// All chunks of a batch are in flight together and the next batch starts
/// only once every call of the current one has settled, so at most
/// `batch_size` transformer calls are ever outstanding. Chunk-level errors are
/// logged and counted; they never stop the run.
pub struct BatchExtractionRunner {
    extractor: Arc<StructuredExtractor>,
    pause: Duration,
    cancel: CancellationSignal,
}

impl BatchExtractionRunner {
    /// Create a runner using the extractor's configured inter-batch pause
    pub fn new(extractor: Arc<StructuredExtractor>) -> Self {
        let pause = extractor.config().batch_pause();
        Self {
            extractor,
            pause,
            cancel: CancellationSignal::new(),
        }
    }

    /// Observe a run-level cancellation signal
    pub fn with_cancellation(mut self, cancel: CancellationSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Override the pause inserted between batches
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Extract every chunk, `batch_size` at a time.
    ///
    /// Records come back in submission order. If cancellation is observed,
    /// no further batch is started and the results of the batch in flight
    /// are discarded.
    pub async fn run(&self, chunks: &[Chunk], batch_size: usize) -> ExtractionReport {
        let batch_size = batch_size.max(1);
        let total = chunks.len();
        let total_batches = total.div_ceil(batch_size);
        let mut report = ExtractionReport::default();

        for (idx, batch) in chunks.chunks(batch_size).enumerate() {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let first = idx * batch_size + 1;
            info!(
                batch = idx + 1,
                "Processing batch {}/{} (chunks {}-{})",
                idx + 1,
                total_batches,
                first,
                first + batch.len() - 1
            );

            let tally = BatchTally::default();
            let settled = join_all(
                batch
                    .iter()
                    .map(|chunk| self.extract_logged(chunk, total, &tally)),
            )
            .await;

            if self.cancel.is_cancelled() {
                warn!(batch = idx + 1, "Cancelled; discarding results of the batch in flight");
                report.cancelled = true;
                break;
            }

            report.stats.chunks += batch.len();
            tally.commit(&mut report.stats);
            for extraction in settled.into_iter().flatten() {
                report.records.extend(extraction.records);
            }

            if idx + 1 < total_batches && !self.pause.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.pause) => {}
                    _ = self.cancel.cancelled() => {}
                }
            }
        }

        report.stats.records = report.records.len();
        info!(
            "Extraction finished: {} records from {} chunks ({} discarded, {} errored)",
            report.stats.records, report.stats.chunks, report.stats.discarded, report.stats.errored
        );
        report
    }

    async fn extract_logged(
        &self,
        chunk: &Chunk,
        total: usize,
        tally: &BatchTally,
    ) -> Option<ChunkExtraction> {
        let position = chunk.id.saturating_add(1);
        match self.extractor.extract_chunk(chunk, Some(&self.cancel)).await {
            Ok(extraction) if extraction.records.is_empty() => {
                info!(chunk_id = chunk.id, "Chunk {}/{}: Skipped (empty response)", position, total);
                tally.discarded.fetch_add(1, Ordering::Relaxed);
                None
            }
            Ok(extraction) => {
                let k = extraction.records.len();
                info!(
                    chunk_id = chunk.id,
                    "Chunk {}/{}: Added {} {}",
                    position,
                    total,
                    k,
                    if k == 1 { "item" } else { "items" }
                );
                Some(extraction)
            }
            Err(ExtractorError::Cancelled) => None,
            Err(e) => {
                if e.is_transform_failure() {
                    warn!(chunk_id = chunk.id, "Chunk {}/{}: no answer: {}", position, total, e);
                    tally.transform_failures.fetch_add(1, Ordering::Relaxed);
                } else {
                    warn!(chunk_id = chunk.id, "Chunk {}/{}: unusable answer: {}", position, total, e);
                }
                tally.errored.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }
}

/// Outcome counters of one batch, filled concurrently by its chunks
#[derive(Debug, Default)]
struct BatchTally {
    discarded: AtomicUsize,
    errored: AtomicUsize,
    transform_failures: AtomicUsize,
}

impl BatchTally {
    /// Add the counts of a batch whose results are kept
    fn commit(&self, stats: &mut ExtractionStats) {
        stats.discarded += self.discarded.load(Ordering::Relaxed);
        stats.errored += self.errored.load(Ordering::Relaxed);
        stats.transform_failures += self.transform_failures.load(Ordering::Relaxed);
    }
}
