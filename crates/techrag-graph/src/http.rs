//! REST client for a remote episode-ingestion service
//!
//! The service exposes:
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | POST | `/episodes` | one episode |
//! | POST | `/episodes/bulk` | `{"episodes": [...]}` |
//! | POST | `/clear` | empty |
//! | POST | `/indices` | empty |
//!
//! Any 2xx status is success; anything else is [`StoreError::Rejected`].

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use techrag_domain::{Episode, GraphStore, StoreError};
use tracing::debug;

/// Default request timeout (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// HTTP [`GraphStore`] implementation
#[derive(Debug, Clone)]
pub struct HttpGraphStore {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct BulkRequest<'a> {
    episodes: &'a [Episode],
}

impl HttpGraphStore {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Other(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: Option<&T>) -> Result<(), StoreError> {
        let mut request = self.client.post(self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Communication(format!("Request to {} failed: {}", path, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_string());
        Err(StoreError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl GraphStore for HttpGraphStore {
    async fn submit(&self, episode: &Episode) -> Result<(), StoreError> {
        self.post("/episodes", Some(episode)).await
    }

    async fn submit_bulk(&self, episodes: &[Episode]) -> Result<(), StoreError> {
        self.post("/episodes/bulk", Some(&BulkRequest { episodes })).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.post::<()>("/clear", None).await
    }

    async fn build_indices(&self) -> Result<(), StoreError> {
        self.post::<()>("/indices", None).await
    }

    async fn close(&self) -> Result<(), StoreError> {
        // reqwest pools connections per client; nothing to release eagerly
        debug!(base_url = %self.base_url, "Graph store connection closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let store = HttpGraphStore::new("http://localhost:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(store.base_url(), "http://localhost:8000");
        assert_eq!(store.url("/episodes"), "http://localhost:8000/episodes");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_communication_error() {
        let store = HttpGraphStore::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let result = store.clear().await;
        assert!(matches!(result, Err(StoreError::Communication(_))));
    }
}
