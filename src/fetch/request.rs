//! `reqwest`-backed fetcher with browser-like request headers.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use super::ContentFetcher;
use crate::config::{ACCEPT_HTML, ACCEPT_JSON, ACCEPT_LANGUAGE};
use crate::error_handling::{categorize_reqwest_error, DetectionError, InitializationError};
use crate::initialization::init_client;

/// Production fetcher: one GET per call, no retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Builds a fetcher that sends `user_agent` on every request.
    pub fn new(user_agent: &str) -> Result<Self, InitializationError> {
        Ok(Self {
            client: init_client(user_agent)?,
        })
    }

    /// Wraps an already configured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Applies the standard browser headers for the given `Accept` value.
    fn apply_headers(builder: reqwest::RequestBuilder, accept: &str) -> reqwest::RequestBuilder {
        builder
            .header(reqwest::header::ACCEPT, accept)
            .header(reqwest::header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .header(reqwest::header::UPGRADE_INSECURE_REQUESTS, "1")
    }

    async fn get_text(
        &self,
        url: &str,
        accept: &str,
        timeout: Duration,
    ) -> Result<String, DetectionError> {
        let request = Self::apply_headers(self.client.get(url), accept).timeout(timeout);
        let response = request
            .send()
            .await
            .map_err(|e| categorize_reqwest_error(e, url, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DetectionError::Fetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| categorize_reqwest_error(e, url, timeout))?;
        debug!("Fetched {} bytes from {url} (HTTP {})", body.len(), status.as_u16());
        Ok(body)
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<String, DetectionError> {
        self.get_text(url, ACCEPT_HTML, timeout).await
    }

    async fn fetch_json(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<serde_json::Value, DetectionError> {
        let body = self.get_text(url, ACCEPT_JSON, timeout).await?;
        serde_json::from_str(&body).map_err(|e| DetectionError::Parse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new("gtm-detect-test/1.0").expect("client builds")
    }

    #[tokio::test]
    async fn test_fetch_page_sends_browser_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(header("user-agent", "gtm-detect-test/1.0"))
            .and(header("accept-language", ACCEPT_LANGUAGE))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let body = fetcher()
            .fetch_page(&format!("{}/", server.uri()), Duration::from_secs(5))
            .await
            .expect("page fetched");
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_fetch_page_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fetcher()
            .fetch_page(&format!("{}/missing", server.uri()), Duration::from_secs(5))
            .await
            .expect_err("404 is a fetch error");
        assert!(matches!(err, DetectionError::Fetch { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_fetch_page_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let err = fetcher()
            .fetch_page(&format!("{}/slow", server.uri()), Duration::from_millis(200))
            .await
            .expect_err("slow response times out");
        assert!(err.is_timeout(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn test_fetch_json_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let err = fetcher()
            .fetch_json(&format!("{}/config", server.uri()), Duration::from_secs(5))
            .await
            .expect_err("malformed JSON");
        assert!(matches!(err, DetectionError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_fetch_json_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"generate": {"gtm_id": "GTM-ZZZZZZ"}})),
            )
            .mount(&server)
            .await;

        let value = fetcher()
            .fetch_json(&format!("{}/config", server.uri()), Duration::from_secs(5))
            .await
            .expect("json fetched");
        assert_eq!(value["generate"]["gtm_id"], "GTM-ZZZZZZ");
    }
}
