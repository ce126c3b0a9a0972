//! Content fetching.
//!
//! The detector talks to the network through the `ContentFetcher` trait so the
//! orchestration logic can be exercised with in-process fakes. `HttpFetcher` is
//! the production implementation on top of `reqwest`.
//!
//! There are no retries here: a caller wanting retries re-invokes detection.

mod request;

use std::time::Duration;

use async_trait::async_trait;

use crate::error_handling::DetectionError;

pub use request::HttpFetcher;

/// HTTP fetch capability used for page content and relay configuration.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetches `url` as a document and returns the body text.
    ///
    /// Fails with `DetectionError::Fetch` on a non-success status and
    /// `DetectionError::Timeout` when `timeout` elapses.
    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<String, DetectionError>;

    /// Fetches `url` expecting a JSON body.
    ///
    /// Fails like `fetch_page`, plus `DetectionError::Parse` for malformed JSON.
    async fn fetch_json(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<serde_json::Value, DetectionError>;
}

/// Runs `fut` under `deadline`, mapping expiry to `DetectionError::Timeout`.
///
/// Applied on top of the fetcher's own timeout so a misbehaving implementation
/// can never stall a scan.
pub(crate) async fn with_deadline<T, F>(
    operation: &str,
    deadline: Duration,
    fut: F,
) -> Result<T, DetectionError>
where
    F: std::future::Future<Output = Result<T, DetectionError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(outcome) => outcome,
        Err(_) => Err(DetectionError::timeout(operation, deadline)),
    }
}
