//! Integration tests for the extraction stage

#[cfg(test)]
mod tests {
    use crate::{BatchExtractionRunner, ExtractorConfig, StructuredExtractor};
    use std::sync::Arc;
    use std::time::Duration;
    use techrag_domain::{CancellationSignal, Chunk};
    use techrag_llm::MockTransformer;
    use tokio::time::Instant;

    fn runner(mock: &MockTransformer, config: ExtractorConfig) -> BatchExtractionRunner {
        let extractor = StructuredExtractor::new(Arc::new(mock.clone()), config);
        BatchExtractionRunner::new(Arc::new(extractor))
    }

    fn filler_chunks(n: u64) -> Vec<Chunk> {
        (0..n).map(|id| Chunk::new(id, format!("chunk {id}"), 10)).collect()
    }

    #[tokio::test]
    async fn test_revenue_example() {
        let mock = MockTransformer::new(r#"{"info": "", "data": {}}"#).with_response(
            "Revenue was $5B",
            r#"{"info":"Revenue $5B","data":{"revenue":5000000000}}"#,
        );
        let chunks = vec![
            Chunk::new(0, "Revenue was $5B", 4),
            Chunk::new(1, "irrelevant filler", 2),
        ];

        let report = runner(&mock, ExtractorConfig::default()).run(&chunks, 5).await;

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].chunk_id, 0);
        assert_eq!(report.stats.chunks, 2);
        assert_eq!(report.stats.discarded, 1);
        assert_eq!(report.stats.errored, 0);
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn test_chunk_errors_do_not_stop_the_run() {
        let mock = MockTransformer::new(r#"{"info": "ok", "data": {}}"#)
            .with_error("chunk 1")
            .with_response("chunk 2", "not json at all")
            .with_response("chunk 3", "17");

        let report = runner(&mock, ExtractorConfig::default())
            .with_pause(Duration::ZERO)
            .run(&filler_chunks(6), 2)
            .await;

        assert_eq!(mock.call_count(), 6);
        assert_eq!(report.stats.errored, 3);
        assert_eq!(report.stats.transform_failures, 1);
        let ids: Vec<u64> = report.records.iter().map(|r| r.chunk_id).collect();
        assert_eq!(ids, vec![0, 4, 5]);
    }

    #[tokio::test]
    async fn test_records_keep_submission_order() {
        let mock = MockTransformer::new(r#"[{"info": "a"}, {"info": "b"}]"#);
        let report = runner(&mock, ExtractorConfig::default())
            .with_pause(Duration::ZERO)
            .run(&filler_chunks(5), 2)
            .await;

        let tags: Vec<(u64, &str)> = report
            .records
            .iter()
            .map(|r| (r.chunk_id, r.info.as_str()))
            .collect();
        assert_eq!(tags.len(), 10);
        assert_eq!(tags[0], (0, "a"));
        assert_eq!(tags[1], (0, "b"));
        assert_eq!(tags[9], (4, "b"));
        assert_eq!(report.stats.records, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_calls_bounded_by_batch_size() {
        let mock = MockTransformer::new(r#"{"info": "x"}"#).with_latency(Duration::from_millis(50));
        let report = runner(&mock, ExtractorConfig::default()).run(&filler_chunks(13), 4).await;

        assert_eq!(mock.call_count(), 13);
        assert_eq!(mock.peak_in_flight(), 4);
        assert_eq!(report.records.len(), 13);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_only_between_batches() {
        let mock = MockTransformer::new(r#"{"info": "x"}"#).with_latency(Duration::from_secs(1));
        let start = Instant::now();

        runner(&mock, ExtractorConfig::default()).run(&filler_chunks(6), 2).await;

        // Three batches of one second each, two 500ms pauses, none after the last.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(4_000), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(4_400), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_mid_batch() {
        let mock = MockTransformer::new(r#"{"info": "x"}"#).with_latency(Duration::from_secs(10));
        let signal = CancellationSignal::new();
        let runner = runner(&mock, ExtractorConfig::default()).with_cancellation(signal.clone());
        let chunks = filler_chunks(6);

        // Batch 1 runs 0s-10s, the pause ends at 10.5s, batch 2 runs 10.5s-20.5s.
        let (report, _) = tokio::join!(runner.run(&chunks, 2), async {
            tokio::time::sleep(Duration::from_secs(15)).await;
            signal.cancel();
        });

        assert!(report.cancelled);
        assert_eq!(mock.call_count(), 4, "batch 3 must never be dispatched");
        let ids: Vec<u64> = report.records.iter().map(|r| r.chunk_id).collect();
        assert_eq!(ids, vec![0, 1], "results of the cancelled batch are discarded");
    }

    #[tokio::test]
    async fn test_largest_chunk_id_is_handled() {
        let mock = MockTransformer::new(r#"{"info": "x"}"#);
        let chunks = vec![Chunk::new(u64::MAX, "last", 1)];

        let report = runner(&mock, ExtractorConfig::default()).run(&chunks, 1).await;

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].chunk_id, u64::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_batch_is_left_out_of_stats() {
        let mock = MockTransformer::new(r#"{"info": "x"}"#)
            .with_error("chunk 2")
            .with_response("chunk 3", r#"{"info": "", "data": {}}"#)
            .with_latency(Duration::from_secs(10));
        let signal = CancellationSignal::new();
        let runner = runner(&mock, ExtractorConfig::default()).with_cancellation(signal.clone());
        let chunks = filler_chunks(6);

        let (report, _) = tokio::join!(runner.run(&chunks, 2), async {
            tokio::time::sleep(Duration::from_secs(15)).await;
            signal.cancel();
        });

        assert!(report.cancelled);
        assert_eq!(report.stats.chunks, 2);
        assert_eq!(report.stats.records, 2);
        assert_eq!(report.stats.errored, 0);
        assert_eq!(report.stats.transform_failures, 0);
        assert_eq!(report.stats.discarded, 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let mock = MockTransformer::new(r#"{"info": "x"}"#);
        let signal = CancellationSignal::new();
        signal.cancel();

        let report = runner(&mock, ExtractorConfig::default())
            .with_cancellation(signal)
            .run(&filler_chunks(3), 2)
            .await;

        assert!(report.cancelled);
        assert!(report.is_empty());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let mock = MockTransformer::default();
        let report = runner(&mock, ExtractorConfig::default()).run(&[], 5).await;
        assert!(report.is_empty());
        assert_eq!(mock.call_count(), 0);
    }
}
