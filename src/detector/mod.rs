//! Detection orchestration.
//!
//! `GtmDetector` runs the strategies in order:
//! 1. The browser strategy, when enabled. Any valid ID it finds is
//!    authoritative and the page is not fetched.
//! 2. The page fetch followed by every static extractor, the storefront
//!    heuristic and the relay markup scan.
//! 3. The relay search over URLs found in the markup.
//! 4. If presence is established but no valid ID was recovered, the relay
//!    fallback search over constructed URLs.
//! 5. Final validation.
//!
//! Every path returns a report. Failures of individual attempts are recorded in
//! the evidence trail; only a failed page fetch or a rejected URL sets `error`.

mod batch;
mod validate;

use std::sync::Arc;

use log::{debug, info};
use scraper::Html;

use crate::app::validate_and_normalize_url;
use crate::browser::{detect_dynamic, BrowserEngine, ChromeEngine};
use crate::config::DetectorConfig;
use crate::error_handling::InitializationError;
use crate::fetch::{with_deadline, ContentFetcher, HttpFetcher};
use crate::parse::{run_static_extractors, truncate_at_char_boundary};
use crate::platform::{
    detect_storefront, scan_relay_markup, RelayContext, RelaySearch, RelaySignals,
    FALLBACK_STRATEGIES, STATIC_STRATEGIES,
};
use crate::result::{DetectionReport, DetectionResult, EvidenceSource};

pub use batch::{detect_many, scan_stream, ScanRecord};
pub use validate::{finalize, valid_id_count};

/// Multi-strategy tag manager detector.
///
/// Holds no per-scan state: one detector can run any number of detections,
/// sequentially or concurrently.
#[derive(Clone)]
pub struct GtmDetector {
    config: DetectorConfig,
    fetcher: Arc<dyn ContentFetcher>,
    browser: Option<Arc<dyn BrowserEngine>>,
}

impl std::fmt::Debug for GtmDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GtmDetector")
            .field("config", &self.config)
            .field("browser", &self.browser.is_some())
            .finish()
    }
}

impl GtmDetector {
    /// Builds a detector with the production HTTP fetcher and headless Chrome.
    ///
    /// Chrome is only launched when a detection runs the browser strategy.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::HttpClientError` if the HTTP client cannot be built.
    pub fn new(config: DetectorConfig) -> Result<Self, InitializationError> {
        let fetcher = HttpFetcher::new(&config.user_agent)?;
        // Outlives navigation, settle and the evaluations that follow
        let idle = config.navigation_timeout + config.settle_delay + config.fetch_timeout;
        let browser =
            ChromeEngine::new(config.user_agent.clone(), idle).with_sandbox(config.browser_sandbox);
        Ok(Self::with_components(
            config,
            Arc::new(fetcher),
            Some(Arc::new(browser)),
        ))
    }

    /// Builds a detector from explicit capabilities.
    pub fn with_components(
        config: DetectorConfig,
        fetcher: Arc<dyn ContentFetcher>,
        browser: Option<Arc<dyn BrowserEngine>>,
    ) -> Self {
        Self {
            config,
            fetcher,
            browser,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detects the tag manager on `url` using the configured mode.
    pub async fn detect(&self, url: &str) -> DetectionReport {
        self.detect_result(url, self.config.enable_dynamic)
            .await
            .into_report()
    }

    /// Detects the tag manager on `url`, overriding whether the browser runs.
    pub async fn detect_with(&self, url: &str, dynamic: bool) -> DetectionReport {
        self.detect_result(url, dynamic).await.into_report()
    }

    /// Runs a detection and returns the accumulator with its typed evidence.
    pub async fn detect_result(&self, url: &str, dynamic: bool) -> DetectionResult {
        let target = match validate_and_normalize_url(url) {
            Ok(target) => target,
            Err(e) => {
                let mut result = DetectionResult::new(url);
                result.log(EvidenceSource::Validation, e.to_string());
                result.set_error(e.to_string());
                return result;
            }
        };
        let mut result = DetectionResult::new(target.clone());
        info!("Detecting tag manager on {target} (dynamic: {dynamic})");

        if dynamic {
            match &self.browser {
                Some(engine) => {
                    let found = detect_dynamic(engine.as_ref(), &mut result, &self.config).await;
                    if found > 0 {
                        result.log(
                            EvidenceSource::Browser,
                            format!("{found} container ID(s) from rendered page; skipping static analysis"),
                        );
                        finalize(&mut result);
                        return result;
                    }
                }
                None => result.log(EvidenceSource::Browser, "No browser engine configured"),
            }
        }

        let page = with_deadline(
            "Page fetch",
            self.config.fetch_timeout,
            self.fetcher.fetch_page(&target, self.config.fetch_timeout),
        )
        .await;
        let html = match page {
            Ok(html) => html,
            Err(e) => {
                info!("Page fetch for {target} failed: {e}");
                result.log(EvidenceSource::Fetch, format!("Page fetch failed: {e}"));
                result.set_error(e.to_string());
                finalize(&mut result);
                return result;
            }
        };

        let signals = self.analyze_markup(&html, &mut result);
        let ctx = RelayContext::new(signals, self.config.relay.clone(), &target);
        let mut search = RelaySearch::new(self.fetcher.as_ref(), self.config.relay_timeout);
        search
            .run(STATIC_STRATEGIES, &ctx, &mut result, EvidenceSource::Relay)
            .await;

        if result.is_present() && valid_id_count(&result) == 0 {
            result.log(
                EvidenceSource::Fallback,
                "Tag manager evidence without a valid container ID; searching relay configuration",
            );
            let found = search
                .run(FALLBACK_STRATEGIES, &ctx, &mut result, EvidenceSource::Fallback)
                .await;
            if found.is_none() {
                result.log(
                    EvidenceSource::Fallback,
                    format!("No container ID recovered after {} relay attempt(s)", search.attempts()),
                );
            }
        }

        finalize(&mut result);
        debug!(
            "{target}: present={} ids={:?}",
            result.is_present(),
            result.container_ids().collect::<Vec<_>>()
        );
        result
    }

    /// Runs every synchronous markup analysis over the fetched page.
    fn analyze_markup(&self, html: &str, result: &mut DetectionResult) -> RelaySignals {
        let body = truncate_at_char_boundary(html, self.config.max_body_bytes);
        result.log(
            EvidenceSource::Fetch,
            format!("Fetched {} bytes", html.len()),
        );
        if body.len() < html.len() {
            result.log(
                EvidenceSource::Fetch,
                format!("Body truncated to {} bytes before parsing", body.len()),
            );
        }

        let document = Html::parse_document(body);
        run_static_extractors(&document, body, result);
        detect_storefront(&document, body, result);
        scan_relay_markup(body, &self.config.relay, result)
    }
}
