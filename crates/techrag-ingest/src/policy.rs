//! Execution policies for submitting episodes
//!
//! Three interchangeable strategies share one accounting contract: every
//! episode handed to [`ExecutionPolicy::execute`] comes back as exactly one
//! [`IngestOutcome`], in input order.

use crate::config::PolicyConfig;
use crate::error::IngestError;
use async_trait::async_trait;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use techrag_domain::{CancellationSignal, Episode, GraphStore, IngestOutcome};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// What a policy uses to talk to the store.
///
/// Every call is bounded by the submit timeout; a timeout is reported as
/// [`IngestError::Timeout`] and treated like any other failure.
pub struct SubmissionContext {
    store: Arc<dyn GraphStore>,
    timeout: Duration,
    cancel: CancellationSignal,
}

impl SubmissionContext {
    /// Create a context
    pub fn new(store: Arc<dyn GraphStore>, timeout: Duration, cancel: CancellationSignal) -> Self {
        Self {
            store,
            timeout,
            cancel,
        }
    }

    /// Whether the run has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolve once the run is cancelled
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Submit one episode once
    pub async fn submit(&self, episode: &Episode) -> Result<(), IngestError> {
        timeout(self.timeout, self.store.submit(episode))
            .await
            .map_err(|_| IngestError::Timeout(self.timeout.as_secs()))?
            .map_err(IngestError::from)
    }

    /// Submit several episodes in one bulk call
    pub async fn submit_bulk(&self, episodes: &[Episode]) -> Result<(), IngestError> {
        timeout(self.timeout, self.store.submit_bulk(episodes))
            .await
            .map_err(|_| IngestError::Timeout(self.timeout.as_secs()))?
            .map_err(IngestError::from)
    }

    /// Sleep for `duration` unless cancelled first. Returns `false` on cancellation.
    pub async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.cancel.cancelled() => false,
        }
    }
}

/// A strategy for delivering episodes to the store
#[async_trait]
pub trait ExecutionPolicy: Send + Sync {
    /// Policy name for logs
    fn name(&self) -> &'static str;

    /// Submit every episode and return one outcome per episode, in input order
    async fn execute(&self, episodes: &[Episode], ctx: &SubmissionContext) -> Vec<IngestOutcome>;
}

impl PolicyConfig {
    /// Instantiate the configured policy
    pub fn build(&self) -> Box<dyn ExecutionPolicy> {
        match self {
            PolicyConfig::Batched {
                batch_size,
                use_bulk,
            } => Box::new(BatchedPolicy::new(*batch_size).with_bulk(*use_bulk)),
            PolicyConfig::BoundedParallel {
                max_concurrent,
                max_retries,
                base_delay_ms,
            } => Box::new(BoundedParallelPolicy::new(
                *max_concurrent,
                *max_retries,
                Duration::from_millis(*base_delay_ms),
            )),
            PolicyConfig::Serial { delay_ms } => {
                Box::new(SerialPolicy::new(Duration::from_millis(*delay_ms)))
            }
        }
    }
}

/// Fixed-size concurrent batches with no retry.
///
/// Batches run back to back. A failed submission is recorded with
/// `attempts = 1` and does not affect its siblings. With bulk enabled each
/// batch is one `submit_bulk` call and succeeds or fails as a whole.
#[derive(Debug, Clone)]
pub struct BatchedPolicy {
    batch_size: usize,
    use_bulk: bool,
}

impl BatchedPolicy {
    /// Create a policy submitting `batch_size` episodes at a time
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            use_bulk: false,
        }
    }

    /// Submit each batch with a single bulk call
    pub fn with_bulk(mut self, use_bulk: bool) -> Self {
        self.use_bulk = use_bulk;
        self
    }

    async fn submit_batch(&self, batch: &[Episode], ctx: &SubmissionContext) -> Vec<IngestOutcome> {
        if self.use_bulk {
            return match ctx.submit_bulk(batch).await {
                Ok(()) => batch.iter().map(|e| IngestOutcome::success(&e.name, 1)).collect(),
                Err(e) => {
                    let message = e.to_string();
                    batch
                        .iter()
                        .map(|ep| IngestOutcome::failure(&ep.name, 1, message.clone()))
                        .collect()
                }
            };
        }

        join_all(batch.iter().map(|episode| async move {
            match ctx.submit(episode).await {
                Ok(()) => IngestOutcome::success(&episode.name, 1),
                Err(e) => {
                    debug!(episode = %episode.name, "Submission failed: {}", e);
                    IngestOutcome::failure(&episode.name, 1, e.to_string())
                }
            }
        }))
        .await
    }
}

#[async_trait]
impl ExecutionPolicy for BatchedPolicy {
    fn name(&self) -> &'static str {
        "batched"
    }

    async fn execute(&self, episodes: &[Episode], ctx: &SubmissionContext) -> Vec<IngestOutcome> {
        let total_batches = episodes.len().div_ceil(self.batch_size);
        let mut outcomes = Vec::with_capacity(episodes.len());
        let mut failed_batches = Vec::new();

        for (idx, batch) in episodes.chunks(self.batch_size).enumerate() {
            let batch_num = idx + 1;
            if ctx.is_cancelled() {
                outcomes.extend(batch.iter().map(|e| IngestOutcome::cancelled(&e.name)));
                continue;
            }

            let batch_outcomes = self.submit_batch(batch, ctx).await;
            let failed: Vec<&IngestOutcome> = batch_outcomes.iter().filter(|o| !o.succeeded).collect();
            if failed.is_empty() {
                info!(
                    batch = batch_num,
                    "Ingested batch {}/{} ({} episodes)",
                    batch_num,
                    total_batches,
                    batch.len()
                );
            } else {
                error!(
                    batch = batch_num,
                    "Failed batch {}/{}: {} of {} episodes failed ({})",
                    batch_num,
                    total_batches,
                    failed.len(),
                    batch.len(),
                    failed[0].error.as_deref().unwrap_or("unknown error")
                );
                failed_batches.push(batch_num);
            }
            outcomes.extend(batch_outcomes);
        }

        if !failed_batches.is_empty() {
            warn!("Failed batches: {:?}", failed_batches);
        }
        outcomes
    }
}

/// Bounded workers with per-episode exponential-backoff retry.
///
/// At most `max_concurrent` submissions are in flight. An episode is tried up
/// to `max_retries` times in total; after failed attempt `i` (0-indexed) the
/// worker waits `base_delay * 2^i` before trying again. The permit is held
/// across the backoff.
#[derive(Debug, Clone)]
pub struct BoundedParallelPolicy {
    max_concurrent: usize,
    max_retries: u32,
    base_delay: Duration,
}

impl BoundedParallelPolicy {
    /// Create a policy
    pub fn new(max_concurrent: usize, max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
            max_retries: max_retries.max(1),
            base_delay,
        }
    }

    /// Delay after failed attempt `attempt` (0-indexed)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .checked_mul(2u32.saturating_pow(attempt))
            .unwrap_or(Duration::MAX)
    }

    async fn submit_with_retry(
        &self,
        episode: &Episode,
        ctx: &SubmissionContext,
        limiter: &Semaphore,
    ) -> IngestOutcome {
        let _permit = tokio::select! {
            permit = limiter.acquire() => match permit {
                Ok(permit) => permit,
                Err(_) => return IngestOutcome::cancelled(&episode.name),
            },
            _ = ctx.cancelled() => return IngestOutcome::cancelled(&episode.name),
        };
        if ctx.is_cancelled() {
            return IngestOutcome::cancelled(&episode.name);
        }

        let mut attempts = 0;
        loop {
            let error = match ctx.submit(episode).await {
                Ok(()) => return IngestOutcome::success(&episode.name, attempts + 1),
                Err(e) => e,
            };
            attempts += 1;

            if attempts >= self.max_retries {
                let exhausted = IngestError::RetryExhausted {
                    attempts,
                    last_error: error.to_string(),
                };
                warn!(episode = %episode.name, "{}", exhausted);
                return IngestOutcome::failure(&episode.name, attempts, exhausted.to_string());
            }

            let delay = self.backoff_delay(attempts - 1);
            warn!(
                episode = %episode.name,
                attempt = attempts,
                "Attempt {}/{} failed: {}; retrying in {:?}",
                attempts,
                self.max_retries,
                error,
                delay
            );
            if !ctx.pause(delay).await {
                return IngestOutcome::failure(
                    &episode.name,
                    attempts,
                    format!("{} (cancelled before retry)", error),
                );
            }
        }
    }
}

#[async_trait]
impl ExecutionPolicy for BoundedParallelPolicy {
    fn name(&self) -> &'static str {
        "bounded_parallel"
    }

    async fn execute(&self, episodes: &[Episode], ctx: &SubmissionContext) -> Vec<IngestOutcome> {
        let limiter = Semaphore::new(self.max_concurrent);
        join_all(
            episodes
                .iter()
                .map(|episode| self.submit_with_retry(episode, ctx, &limiter)),
        )
        .await
    }
}

/// Strictly serial submission with a fixed delay.
///
/// Sleeps `delay` after every submission and once more after a failure.
/// A failed episode is recorded as failed and is not resubmitted.
#[derive(Debug, Clone)]
pub struct SerialPolicy {
    delay: Duration,
}

impl SerialPolicy {
    /// Create a policy sleeping `delay` between submissions
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl ExecutionPolicy for SerialPolicy {
    fn name(&self) -> &'static str {
        "serial"
    }

    async fn execute(&self, episodes: &[Episode], ctx: &SubmissionContext) -> Vec<IngestOutcome> {
        let mut outcomes = Vec::with_capacity(episodes.len());

        for (idx, episode) in episodes.iter().enumerate() {
            if ctx.is_cancelled() {
                outcomes.push(IngestOutcome::cancelled(&episode.name));
                continue;
            }

            let failed = match ctx.submit(episode).await {
                Ok(()) => {
                    debug!(episode = %episode.name, "Submitted {}/{}", idx + 1, episodes.len());
                    outcomes.push(IngestOutcome::success(&episode.name, 1));
                    false
                }
                Err(e) => {
                    warn!(episode = %episode.name, "Submission failed: {}; cooling down", e);
                    outcomes.push(IngestOutcome::failure(&episode.name, 1, e.to_string()));
                    true
                }
            };

            if ctx.pause(self.delay).await && failed {
                ctx.pause(self.delay).await;
            }
        }

        outcomes
    }
}
