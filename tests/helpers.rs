// Shared test helpers: page fixtures, fake fetchers and a scripted browser.
//
// Each integration test file pulls this in with `mod helpers;` and uses a subset.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gtm_detect::browser::{BrowserEngine, BrowserPage, ObserveSpec, ObservedResponse};
use gtm_detect::fetch::ContentFetcher;
use gtm_detect::{DetectionError, DetectorConfig, RelayProfile};

/// Canonical install snippet for container GTM-ABCDEF.
pub const STANDARD_PAGE: &str = r#"<!DOCTYPE html>
<html><head>
<script>(function(w,d,s,l,i){w[l]=w[l]||[];w[l].push({'gtm.start':
new Date().getTime(),event:'gtm.js'});var f=d.getElementsByTagName(s)[0],
j=d.createElement(s),dl=l!='dataLayer'?'&l='+l:'';j.async=true;j.src=
'https://www.googletagmanager.com/gtm.js?id='+i+dl;f.parentNode.insertBefore(j,f);
})(window,document,'script','dataLayer','GTM-ABCDEF');</script>
</head>
<body>
<noscript><iframe src="https://www.googletagmanager.com/ns.html?id=GTM-ABCDEF"
height="0" width="0" style="display:none;visibility:hidden"></iframe></noscript>
<h1>Welcome</h1>
</body></html>"#;

/// No tag manager markers at all.
pub const PLAIN_PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Plain</title><script src="/static/app.js"></script></head>
<body><p>Nothing to see.</p></body></html>"#;

/// Analytics loader with a measurement ID only.
pub const MEASUREMENT_ONLY_PAGE: &str = r#"<!DOCTYPE html>
<html><head>
<script async src="https://www.googletagmanager.com/gtag/js?id=G-XXXXXXX"></script>
<script>window.dataLayer = window.dataLayer || [];
function gtag(){dataLayer.push(arguments);}
gtag('js', new Date());
gtag('config', 'G-XXXXXXX');</script>
</head><body></body></html>"#;

/// Storefront whose page embeds the relay configuration URL served by `base`.
pub fn relay_page(base: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head>
<script>window.sgtmSettings = {{"configUrl": "{base}/api/widget-config?shop=demo-store.myshopify.com"}};</script>
</head><body><h1>Demo store</h1></body></html>"#
    )
}

/// Storefront with platform tracking, a shop literal, and no ID or relay URL.
pub const STOREFRONT_PAGE: &str = r#"<!DOCTYPE html>
<html><head>
<link rel="stylesheet" href="//cdn.shopify.com/s/files/1/theme.css">
<script>window.Shopify = window.Shopify || {}; Shopify.shop = "acme-goods.myshopify.com";</script>
<script>window.ShopifyAnalytics = window.ShopifyAnalytics || {};
ShopifyAnalytics.lib.track("Viewed Product", {"event": "product_viewed"});</script>
</head><body><div class="shopify-section"></div></body></html>"#;

/// Detector settings with short deadlines and the relay pointed at `relay_base`.
pub fn test_config(relay_base: &str) -> DetectorConfig {
    DetectorConfig {
        fetch_timeout: Duration::from_secs(5),
        relay_timeout: Duration::from_secs(2),
        navigation_timeout: Duration::from_secs(2),
        settle_delay: Duration::ZERO,
        relay: RelayProfile {
            config_endpoint: format!("{relay_base}/api/widget-config"),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Serves one fixed page and counts every call.
pub struct CountingFetcher {
    page: String,
    pub page_calls: AtomicUsize,
    pub json_calls: AtomicUsize,
}

impl CountingFetcher {
    pub fn new(page: &str) -> Self {
        Self {
            page: page.to_string(),
            page_calls: AtomicUsize::new(0),
            json_calls: AtomicUsize::new(0),
        }
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentFetcher for CountingFetcher {
    async fn fetch_page(&self, _url: &str, _timeout: Duration) -> Result<String, DetectionError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.page.clone())
    }

    async fn fetch_json(
        &self,
        url: &str,
        _timeout: Duration,
    ) -> Result<serde_json::Value, DetectionError> {
        self.json_calls.fetch_add(1, Ordering::SeqCst);
        Err(DetectionError::Fetch {
            url: url.to_string(),
            status: 404,
        })
    }
}

/// Never completes a request and ignores the timeout it is given.
pub struct HangingFetcher;

#[async_trait]
impl ContentFetcher for HangingFetcher {
    async fn fetch_page(&self, _url: &str, _timeout: Duration) -> Result<String, DetectionError> {
        std::future::pending().await
    }

    async fn fetch_json(
        &self,
        _url: &str,
        _timeout: Duration,
    ) -> Result<serde_json::Value, DetectionError> {
        std::future::pending().await
    }
}

/// Serves one fixed page. Relay config fetches whose URL contains `stall_on`
/// never complete; all others return `config`.
pub struct StallingRelayFetcher {
    pub page: String,
    pub stall_on: String,
    pub config: serde_json::Value,
}

#[async_trait]
impl ContentFetcher for StallingRelayFetcher {
    async fn fetch_page(&self, _url: &str, _timeout: Duration) -> Result<String, DetectionError> {
        Ok(self.page.clone())
    }

    async fn fetch_json(
        &self,
        url: &str,
        _timeout: Duration,
    ) -> Result<serde_json::Value, DetectionError> {
        if url.contains(&self.stall_on) {
            std::future::pending::<()>().await;
        }
        Ok(self.config.clone())
    }
}

/// Counters shared between a scripted browser and its pages.
#[derive(Default)]
pub struct BrowserCalls {
    pub launched: AtomicUsize,
    pub closed: AtomicUsize,
}

impl BrowserCalls {
    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Browser that "renders" fixed markup, or fails to launch when `rendered` is `None`.
pub struct ScriptedBrowser {
    rendered: Option<String>,
    responses: Mutex<Vec<ObservedResponse>>,
    pub calls: Arc<BrowserCalls>,
}

impl ScriptedBrowser {
    pub fn rendering(markup: &str) -> Self {
        Self {
            rendered: Some(markup.to_string()),
            responses: Mutex::new(Vec::new()),
            calls: Arc::new(BrowserCalls::default()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            rendered: None,
            responses: Mutex::new(Vec::new()),
            calls: Arc::new(BrowserCalls::default()),
        }
    }

    pub fn with_responses(self, responses: Vec<ObservedResponse>) -> Self {
        *self.responses.lock().unwrap() = responses;
        self
    }
}

#[async_trait]
impl BrowserEngine for ScriptedBrowser {
    async fn launch(&self, _spec: ObserveSpec) -> Result<Box<dyn BrowserPage>, DetectionError> {
        let Some(rendered) = self.rendered.clone() else {
            return Err(DetectionError::BrowserLaunch(
                "Could not auto detect a chrome executable".to_string(),
            ));
        };
        self.calls.launched.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedPage {
            rendered,
            responses: std::mem::take(&mut *self.responses.lock().unwrap()),
            calls: Arc::clone(&self.calls),
        }))
    }
}

struct ScriptedPage {
    rendered: String,
    responses: Vec<ObservedResponse>,
    calls: Arc<BrowserCalls>,
}

#[async_trait]
impl BrowserPage for ScriptedPage {
    async fn navigate(&mut self, _url: &str, _timeout: Duration) -> Result<(), DetectionError> {
        Ok(())
    }

    async fn evaluate(&mut self, expression: &str) -> Result<serde_json::Value, DetectionError> {
        if expression.contains("outerHTML") {
            Ok(serde_json::Value::String(self.rendered.clone()))
        } else {
            Ok(serde_json::Value::String("[]".to_string()))
        }
    }

    fn take_responses(&mut self) -> Vec<ObservedResponse> {
        std::mem::take(&mut self.responses)
    }

    async fn close(&mut self) -> Result<(), DetectionError> {
        self.calls.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
