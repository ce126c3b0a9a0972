//! HTTP client initialization.

use std::time::Duration;

use reqwest::ClientBuilder;

use crate::error_handling::InitializationError;

/// TCP connect budget, kept below the per-request timeouts so unreachable hosts fail fast.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Initializes the HTTP client used for page and relay fetches.
///
/// Creates a `reqwest::Client` configured with:
/// - User-Agent header
/// - A connect timeout (per-request timeouts are set on each request)
/// - Redirect following (up to 10 hops)
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if client creation fails.
pub fn init_client(user_agent: &str) -> Result<reqwest::Client, InitializationError> {
    let client = ClientBuilder::new()
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_client_builds() {
        assert!(init_client(crate::config::DEFAULT_USER_AGENT).is_ok());
    }
}
