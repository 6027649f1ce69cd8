//! Ingestion scheduler

use crate::config::IngestConfig;
use crate::metrics::IngestMetrics;
use crate::policy::{ExecutionPolicy, SubmissionContext};
use std::collections::HashMap;
use std::sync::Arc;
use techrag_domain::{CancellationSignal, Episode, GraphStore, IngestOutcome};
use tokio::time::Instant;
use tracing::{error, info};

/// Submits episodes to a [`GraphStore`] under an [`ExecutionPolicy`].
///
/// Whatever the policy, `ingest` returns only once every episode has settled,
/// with exactly one outcome per episode in input order.
pub struct IngestionScheduler {
    ctx: SubmissionContext,
    config: IngestConfig,
}

impl IngestionScheduler {
    /// Create a scheduler for `store`
    pub fn new(store: Arc<dyn GraphStore>, config: IngestConfig) -> Self {
        Self::with_cancellation(store, config, CancellationSignal::new())
    }

    /// Create a scheduler observing a run-level cancellation signal
    pub fn with_cancellation(
        store: Arc<dyn GraphStore>,
        config: IngestConfig,
        cancel: CancellationSignal,
    ) -> Self {
        let ctx = SubmissionContext::new(store, config.submit_timeout(), cancel);
        Self { ctx, config }
    }

    /// The configuration in use
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Submit `episodes` with the configured policy
    pub async fn ingest_configured(&self, episodes: &[Episode]) -> (Vec<IngestOutcome>, IngestMetrics) {
        let policy = self.config.policy.build();
        self.ingest(episodes, policy.as_ref()).await
    }

    /// Submit `episodes` with an explicit policy
    pub async fn ingest(
        &self,
        episodes: &[Episode],
        policy: &dyn ExecutionPolicy,
    ) -> (Vec<IngestOutcome>, IngestMetrics) {
        info!(
            "Ingesting {} episodes with the {} policy",
            episodes.len(),
            policy.name()
        );
        let started = Instant::now();

        let outcomes = policy.execute(episodes, &self.ctx).await;
        let outcomes = reconcile(episodes, outcomes);

        let metrics = IngestMetrics::from_outcomes(&outcomes, started.elapsed());
        info!("Ingestion finished\n{}", metrics.summary());
        (outcomes, metrics)
    }
}

/// Guarantee one outcome per episode, in input order.
///
/// A policy that loses or duplicates outcomes is a bug; the episodes it lost
/// are reported as failed rather than dropped.
fn reconcile(episodes: &[Episode], outcomes: Vec<IngestOutcome>) -> Vec<IngestOutcome> {
    let aligned = outcomes.len() == episodes.len()
        && episodes
            .iter()
            .zip(&outcomes)
            .all(|(e, o)| e.name == o.episode_name);
    if aligned {
        return outcomes;
    }

    error!(
        "Policy returned {} outcomes for {} episodes; realigning",
        outcomes.len(),
        episodes.len()
    );
    let mut by_name: HashMap<String, IngestOutcome> = outcomes
        .into_iter()
        .map(|o| (o.episode_name.clone(), o))
        .collect();
    episodes
        .iter()
        .map(|e| {
            by_name
                .remove(&e.name)
                .unwrap_or_else(|| IngestOutcome::failure(&e.name, 0, "no outcome recorded"))
        })
        .collect()
}
