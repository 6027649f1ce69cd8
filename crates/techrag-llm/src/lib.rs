//! TechRAG Text Transformers
//!
//! Implementations of the [`TextTransformer`] trait from `techrag-domain`.
//!
//! # Transformers
//!
//! - `MockTransformer`: Deterministic, in-process transformer for testing
//! - `OpenAiTransformer`: OpenAI-compatible chat-completions endpoint
//!
//! # Examples
//!
//! ```
//! use techrag_llm::MockTransformer;
//! use techrag_domain::TextTransformer;
//!
//! # tokio_test::block_on(async {
//! let transformer = MockTransformer::new(r#"{"info": "", "data": {}}"#);
//! let out = transformer.transform("instructions", "chunk text").await.unwrap();
//! assert_eq!(out, r#"{"info": "", "data": {}}"#);
//! # });
//! ```

#![warn(missing_docs)]

pub mod openai;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use techrag_domain::{TextTransformer, TransformError};

pub use openai::OpenAiTransformer;

/// Scripted answer for a given input
#[derive(Debug, Clone)]
enum Scripted {
    Reply(String),
    Fail(TransformError),
}

/// Mock transformer for deterministic testing.
///
/// Returns pre-configured responses keyed by the input text, without any
/// network calls. Counters are shared between clones, so a test can keep a
/// handle while the pipeline owns another.
///
/// The mock also records how many calls were in flight at once, which lets
/// tests check admission limits.
///
/// # Examples
///
/// ```
/// use techrag_llm::MockTransformer;
/// use techrag_domain::TextTransformer;
///
/// # tokio_test::block_on(async {
/// let transformer = MockTransformer::new("default")
///     .with_response("chunk a", "answer a")
///     .with_error("chunk b");
///
/// assert_eq!(transformer.transform("i", "chunk a").await.unwrap(), "answer a");
/// assert!(transformer.transform("i", "chunk b").await.is_err());
/// assert_eq!(transformer.transform("i", "other").await.unwrap(), "default");
/// assert_eq!(transformer.call_count(), 3);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockTransformer {
    default_response: String,
    responses: HashMap<String, Scripted>,
    latency: Duration,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl MockTransformer {
    /// Create a mock with a fixed response for all inputs
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: HashMap::new(),
            latency: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer `response` when the input equals `input`
    pub fn with_response(mut self, input: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses
            .insert(input.into(), Scripted::Reply(response.into()));
        self
    }

    /// Fail when the input equals `input`
    pub fn with_error(mut self, input: impl Into<String>) -> Self {
        self.responses.insert(
            input.into(),
            Scripted::Fail(TransformError::Other("Mock error".to_string())),
        );
        self
    }

    /// Delay every call by `latency` before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed in flight at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockTransformer {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

/// Decrements the in-flight gauge when dropped, including when the call is abandoned
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TextTransformer for MockTransformer {
    fn model_name(&self) -> &str {
        "mock"
    }

    async fn transform(&self, _instructions: &str, input: &str) -> Result<String, TransformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.responses.get(input) {
            Some(Scripted::Reply(response)) => Ok(response.clone()),
            Some(Scripted::Fail(err)) => Err(err.clone()),
            None => Ok(self.default_response.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_call_leaves_flight() {
        let transformer = MockTransformer::new("slow").with_latency(Duration::from_secs(10));

        let abandoned =
            tokio::time::timeout(Duration::from_secs(1), transformer.transform("", "a")).await;
        assert!(abandoned.is_err());

        transformer.transform("", "b").await.unwrap();
        assert_eq!(transformer.call_count(), 2);
        assert_eq!(transformer.peak_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_mock_default_response() {
        let transformer = MockTransformer::new("Test response");
        let result = transformer.transform("instructions", "any input").await;
        assert_eq!(result.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_specific_responses() {
        let transformer = MockTransformer::default()
            .with_response("hello", "world")
            .with_response("foo", "bar");

        assert_eq!(transformer.transform("", "hello").await.unwrap(), "world");
        assert_eq!(transformer.transform("", "foo").await.unwrap(), "bar");
        assert_eq!(
            transformer.transform("", "unknown").await.unwrap(),
            "Default mock response"
        );
    }

    #[tokio::test]
    async fn test_mock_error() {
        let transformer = MockTransformer::default().with_error("bad input");
        let result = transformer.transform("", "bad input").await;
        assert!(matches!(result, Err(TransformError::Other(_))));
    }

    #[tokio::test]
    async fn test_mock_clone_shares_counters() {
        let first = MockTransformer::new("x");
        let second = first.clone();

        first.transform("", "a").await.unwrap();
        second.transform("", "b").await.unwrap();

        assert_eq!(first.call_count(), 2);
        assert_eq!(second.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_tracks_peak_in_flight() {
        let transformer = MockTransformer::new("x").with_latency(Duration::from_millis(100));

        let calls = (0..3).map(|i| {
            let t = transformer.clone();
            async move { t.transform("", &i.to_string()).await }
        });
        futures_util::future::join_all(calls).await;

        assert_eq!(transformer.peak_in_flight(), 3);
        assert_eq!(transformer.call_count(), 3);
    }
}
