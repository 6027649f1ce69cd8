//! Integration tests for the ingestion stage

#[cfg(test)]
mod tests {
    use crate::{
        BatchedPolicy, BoundedParallelPolicy, ExecutionPolicy, IngestConfig, IngestionScheduler,
        PolicyConfig, SerialPolicy,
    };
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use std::time::Duration;
    use techrag_domain::{CancellationSignal, Episode, EpisodeKind, GraphStore, StoreError};
    use techrag_graph::MemoryGraphStore;
    use tokio::time::Instant;

    fn episodes(n: usize) -> Vec<Episode> {
        (0..n)
            .map(|i| Episode {
                name: format!("e{i}"),
                content: format!("content {i}"),
                kind: EpisodeKind::Text,
                source_description: "acme 10-K filing text".to_string(),
                reference_time: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            })
            .collect()
    }

    fn scheduler(store: &MemoryGraphStore) -> IngestionScheduler {
        IngestionScheduler::new(Arc::new(store.clone()), IngestConfig::default())
    }

    fn all_policies() -> Vec<Box<dyn ExecutionPolicy>> {
        vec![
            Box::new(BatchedPolicy::new(4)),
            Box::new(BatchedPolicy::new(4).with_bulk(true)),
            Box::new(BoundedParallelPolicy::new(3, 3, Duration::from_millis(10))),
            Box::new(SerialPolicy::new(Duration::from_millis(10))),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_outcome_per_episode_for_every_policy() {
        let input = episodes(11);
        for policy in all_policies() {
            let store = MemoryGraphStore::new()
                .always_fail("e3")
                .fail_times("e7", 1)
                .with_latency(Duration::from_millis(5));
            let (outcomes, metrics) = scheduler(&store).ingest(&input, policy.as_ref()).await;

            assert_eq!(outcomes.len(), input.len(), "{}", policy.name());
            for (episode, outcome) in input.iter().zip(&outcomes) {
                assert_eq!(episode.name, outcome.episode_name, "{}", policy.name());
                assert!(outcome.attempts >= 1, "{}", policy.name());
            }
            assert_eq!(metrics.episodes, input.len());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_then_success_reports_attempts() {
        let store = MemoryGraphStore::new().fail_times("e1", 2);
        let policy = BoundedParallelPolicy::new(2, 3, Duration::from_millis(100));

        let (outcomes, _) = scheduler(&store).ingest(&episodes(3), &policy).await;

        assert!(outcomes[1].succeeded);
        assert_eq!(outcomes[1].attempts, 3);
        assert_eq!(outcomes[0].attempts, 1);
        assert_eq!(store.episodes().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhaustion() {
        let store = MemoryGraphStore::new().always_fail("e0");
        let policy = BoundedParallelPolicy::new(2, 4, Duration::from_millis(100));

        let (outcomes, metrics) = scheduler(&store).ingest(&episodes(2), &policy).await;

        assert!(!outcomes[0].succeeded);
        assert_eq!(outcomes[0].attempts, 4);
        assert!(outcomes[0]
            .error
            .as_deref()
            .is_some_and(|e| e.contains("Gave up after 4 attempts")));
        assert_eq!(store.attempt_times("e0").len(), 4);
        assert_eq!(metrics.failed, 1);
        assert_eq!(metrics.succeeded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_doubles_between_attempts() {
        let store = MemoryGraphStore::new().fail_times("e0", 3);
        let policy = BoundedParallelPolicy::new(1, 5, Duration::from_secs(1));

        scheduler(&store).ingest(&episodes(1), &policy).await;

        let times = store.attempt_times("e0");
        assert_eq!(times.len(), 4);
        let gaps: Vec<Duration> = times.windows(2).map(|w| w[1] - w[0]).collect();
        for (gap, expected) in gaps.iter().zip([1u64, 2, 4]) {
            let expected = Duration::from_secs(expected);
            assert!(*gap >= expected, "{gap:?} < {expected:?}");
            assert!(*gap < expected + Duration::from_millis(50), "{gap:?} vs {expected:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_sleep_after_final_attempt() {
        let store = MemoryGraphStore::new().always_fail("e0");
        let policy = BoundedParallelPolicy::new(1, 3, Duration::from_secs(1));
        let start = Instant::now();

        scheduler(&store).ingest(&episodes(1), &policy).await;

        // 1s + 2s of backoff; a trailing 4s sleep would push this past 7s.
        assert!(start.elapsed() < Duration::from_secs(4), "{:?}", start.elapsed());
    }

    #[test]
    fn test_backoff_formula() {
        let policy = BoundedParallelPolicy::new(1, 3, Duration::from_millis(250));
        assert_eq!(policy.backoff_delay(0), Duration::from_millis(250));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(2_000));
        assert_eq!(policy.backoff_delay(200), Duration::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_parallel_respects_concurrency() {
        let store = MemoryGraphStore::new().with_latency(Duration::from_millis(50));
        let policy = BoundedParallelPolicy::new(3, 3, Duration::from_millis(10));

        let (outcomes, _) = scheduler(&store).ingest(&episodes(20), &policy).await;

        assert!(outcomes.iter().all(|o| o.succeeded));
        assert_eq!(store.peak_in_flight(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batched_bounds_and_no_retry() {
        let store = MemoryGraphStore::new()
            .always_fail("e2")
            .fail_times("e5", 1)
            .with_latency(Duration::from_millis(50));

        let (outcomes, _) = scheduler(&store)
            .ingest(&episodes(9), &BatchedPolicy::new(4))
            .await;

        assert_eq!(store.peak_in_flight(), 4);
        assert!(outcomes.iter().all(|o| o.attempts == 1));
        let failed: Vec<&str> = outcomes
            .iter()
            .filter(|o| !o.succeeded)
            .map(|o| o.episode_name.as_str())
            .collect();
        assert_eq!(failed, vec!["e2", "e5"]);
        assert_eq!(store.attempt_times("e5").len(), 1);
    }

    #[tokio::test]
    async fn test_bulk_failure_fails_whole_batch() {
        let store = MemoryGraphStore::new().fail_bulk();

        let (outcomes, metrics) = scheduler(&store)
            .ingest(&episodes(7), &BatchedPolicy::new(5).with_bulk(true))
            .await;

        assert_eq!(outcomes.len(), 7);
        assert!(outcomes.iter().all(|o| !o.succeeded && o.attempts == 1));
        assert_eq!(metrics.failed, 7);
    }

    #[tokio::test]
    async fn test_bulk_success() {
        let store = MemoryGraphStore::new();

        let (outcomes, _) = scheduler(&store)
            .ingest(&episodes(7), &BatchedPolicy::new(5).with_bulk(true))
            .await;

        assert!(outcomes.iter().all(|o| o.succeeded));
        assert_eq!(store.episodes().len(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_serial_order_delay_and_no_resubmit() {
        let store = MemoryGraphStore::new().fail_times("e1", 1);
        let start = Instant::now();

        let (outcomes, _) = scheduler(&store)
            .ingest(&episodes(3), &SerialPolicy::new(Duration::from_millis(100)))
            .await;

        let order: Vec<String> = store.attempts().into_iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["e0", "e1", "e2"]);
        assert!(!outcomes[1].succeeded);
        assert_eq!(outcomes[1].attempts, 1);
        assert_eq!(store.attempt_times("e1").len(), 1);

        // Three regular delays plus one cooldown after the failure.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(400), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(450), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_serial_one_in_flight() {
        let store = MemoryGraphStore::new().with_latency(Duration::from_millis(30));
        scheduler(&store)
            .ingest(&episodes(5), &SerialPolicy::new(Duration::ZERO))
            .await;
        assert_eq!(store.peak_in_flight(), 1);
    }

    struct HangingStore;

    #[async_trait]
    impl GraphStore for HangingStore {
        async fn submit(&self, _episode: &Episode) -> Result<(), StoreError> {
            std::future::pending().await
        }

        async fn clear(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn build_indices(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn close(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let config = IngestConfig {
            submit_timeout_secs: 5,
            ..IngestConfig::default()
        };
        let scheduler = IngestionScheduler::new(Arc::new(HangingStore), config);
        let policy = BoundedParallelPolicy::new(2, 2, Duration::from_millis(10));

        let (outcomes, _) = scheduler.ingest(&episodes(2), &policy).await;

        for outcome in outcomes {
            assert!(!outcome.succeeded);
            assert_eq!(outcome.attempts, 2);
            assert!(outcome.error.unwrap().contains("timed out after 5s"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_skips_unstarted_episodes() {
        let store = MemoryGraphStore::new().with_latency(Duration::from_secs(1));
        let signal = CancellationSignal::new();
        let scheduler = IngestionScheduler::with_cancellation(
            Arc::new(store.clone()),
            IngestConfig::default(),
            signal.clone(),
        );
        let policy = BoundedParallelPolicy::new(1, 3, Duration::from_millis(10));
        let input = episodes(5);

        let ((outcomes, metrics), _) = tokio::join!(scheduler.ingest(&input, &policy), async {
            tokio::time::sleep(Duration::from_millis(2_500)).await;
            signal.cancel();
        });

        let settled: Vec<(bool, u32)> = outcomes.iter().map(|o| (o.succeeded, o.attempts)).collect();
        assert_eq!(
            settled,
            vec![(true, 1), (true, 1), (true, 1), (false, 0), (false, 0)]
        );
        assert!(outcomes[3].was_cancelled());
        assert_eq!(metrics.cancelled, 2);
        assert_eq!(store.attempts().len(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_submits_nothing() {
        let store = MemoryGraphStore::new();
        let signal = CancellationSignal::new();
        signal.cancel();
        let scheduler = IngestionScheduler::with_cancellation(
            Arc::new(store.clone()),
            IngestConfig::default(),
            signal,
        );

        for policy in all_policies() {
            let (outcomes, _) = scheduler.ingest(&episodes(4), policy.as_ref()).await;
            assert_eq!(outcomes.len(), 4);
            assert!(outcomes.iter().all(|o| o.was_cancelled()), "{}", policy.name());
        }
        assert!(store.attempts().is_empty());
    }

    #[tokio::test]
    async fn test_configured_policy_is_used() {
        let store = MemoryGraphStore::new().fail_bulk();
        let config = IngestConfig {
            policy: PolicyConfig::Batched {
                batch_size: 2,
                use_bulk: true,
            },
            ..IngestConfig::default()
        };
        let scheduler = IngestionScheduler::new(Arc::new(store.clone()), config);

        let (outcomes, _) = scheduler.ingest_configured(&episodes(3)).await;
        assert!(outcomes.iter().all(|o| !o.succeeded));
    }
}
