//! In-process graph store

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use techrag_domain::{Episode, GraphStore, StoreError};
use tokio::time::Instant;

#[derive(Debug, Default)]
struct State {
    episodes: Vec<Episode>,
    // Remaining scripted failures per episode name; `None` means fail forever
    failures: HashMap<String, Option<u32>>,
    attempts: Vec<(String, Instant)>,
    fail_bulk: bool,
    clears: usize,
    index_builds: usize,
    closed: bool,
}

/// In-memory [`GraphStore`].
///
/// Used for `--dry-run` and as the test double for the ingestion stage.
/// Clones share state.
///
/// # Examples
///
/// ```
/// use techrag_graph::MemoryGraphStore;
///
/// let store = MemoryGraphStore::new()
///     .fail_times("doc_chunk_0_text", 2)
///     .always_fail("doc_chunk_1_json");
/// assert!(store.episodes().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryGraphStore {
    state: Arc<Mutex<State>>,
    latency: Duration,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl MemoryGraphStore {
    /// Create an empty store that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the first `times` submissions of the named episode
    pub fn fail_times(self, name: impl Into<String>, times: u32) -> Self {
        self.lock().failures.insert(name.into(), Some(times));
        self
    }

    /// Reject every submission of the named episode
    pub fn always_fail(self, name: impl Into<String>) -> Self {
        self.lock().failures.insert(name.into(), None);
        self
    }

    /// Reject every bulk submission
    pub fn fail_bulk(self) -> Self {
        self.lock().fail_bulk = true;
        self
    }

    /// Delay every submission by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Episodes accepted so far, in acceptance order
    pub fn episodes(&self) -> Vec<Episode> {
        self.lock().episodes.clone()
    }

    /// Every submission attempt, in order, with the time it was made
    pub fn attempts(&self) -> Vec<(String, Instant)> {
        self.lock().attempts.clone()
    }

    /// Times at which the named episode was submitted
    pub fn attempt_times(&self, name: &str) -> Vec<Instant> {
        self.lock()
            .attempts
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, at)| *at)
            .collect()
    }

    /// Highest number of submissions observed in flight at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// How many times `clear` was called
    pub fn clear_count(&self) -> usize {
        self.lock().clears
    }

    /// How many times `build_indices` was called
    pub fn index_build_count(&self) -> usize {
        self.lock().index_builds
    }

    /// Whether `close` was called
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn accept(&self, episode: &Episode) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.attempts.push((episode.name.clone(), Instant::now()));

        if let Some(remaining) = state.failures.get_mut(&episode.name) {
            match remaining {
                None => return Err(rejected(&episode.name)),
                Some(0) => {}
                Some(n) => {
                    *n -= 1;
                    return Err(rejected(&episode.name));
                }
            }
        }

        state.episodes.push(episode.clone());
        Ok(())
    }

    async fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        guard
    }
}

/// Decrements the in-flight gauge when dropped, including on cancellation
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn rejected(name: &str) -> StoreError {
    StoreError::Rejected {
        status: 503,
        body: format!("scripted failure for '{}'", name),
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn submit(&self, episode: &Episode) -> Result<(), StoreError> {
        let _in_flight = self.enter().await;
        self.accept(episode)
    }

    async fn submit_bulk(&self, episodes: &[Episode]) -> Result<(), StoreError> {
        let _in_flight = self.enter().await;
        let mut state = self.lock();
        let now = Instant::now();
        for episode in episodes {
            state.attempts.push((episode.name.clone(), now));
        }
        if state.fail_bulk {
            return Err(StoreError::Rejected {
                status: 500,
                body: "scripted bulk failure".to_string(),
            });
        }
        state.episodes.extend(episodes.iter().cloned());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.episodes.clear();
        state.clears += 1;
        Ok(())
    }

    async fn build_indices(&self) -> Result<(), StoreError> {
        self.lock().index_builds += 1;
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.lock().closed = true;
        Ok(())
    }
}
