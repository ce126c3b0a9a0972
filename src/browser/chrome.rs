//! `headless_chrome` implementation of the browser capability.
//!
//! `headless_chrome` is blocking, so every operation runs on the blocking
//! thread pool. Dropping the last `Browser` handle kills the Chrome process.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use log::{debug, warn};

use super::{BrowserEngine, BrowserPage, ObserveSpec, ObservedResponse};
use crate::error_handling::DetectionError;

const RESPONSE_HANDLER: &str = "gtm_detect_observer";

/// Launches a local headless Chrome per detection.
#[derive(Debug, Clone)]
pub struct ChromeEngine {
    user_agent: String,
    /// Chrome exits after this long without CDP traffic
    idle_timeout: Duration,
    sandbox: bool,
}

impl ChromeEngine {
    /// Creates an engine that launches Chrome with its sandbox enabled.
    pub fn new(user_agent: impl Into<String>, idle_timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            idle_timeout,
            sandbox: true,
        }
    }

    /// Sets whether Chrome runs sandboxed. Containers running as root usually need `false`.
    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }
}

fn launch_options(
    sandbox: bool,
    idle_timeout: Duration,
) -> Result<LaunchOptions<'static>, DetectionError> {
    LaunchOptions::default_builder()
        .headless(true)
        .sandbox(sandbox)
        .idle_browser_timeout(idle_timeout)
        .build()
        .map_err(|e| DetectionError::BrowserLaunch(e.to_string()))
}

/// Coarse resource kind from a response MIME type.
fn resource_type_for(mime_type: &str) -> &'static str {
    if mime_type.contains("javascript") || mime_type.contains("ecmascript") {
        "script"
    } else if mime_type.contains("html") {
        "document"
    } else if mime_type.contains("json") || mime_type.contains("text/plain") {
        "xhr"
    } else if mime_type.starts_with("image/") {
        "image"
    } else {
        "other"
    }
}

/// Runs blocking browser work off the async runtime.
async fn blocking<T, F>(operation: &'static str, work: F) -> Result<T, DetectionError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, DetectionError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| DetectionError::Browser(format!("{operation} task failed: {e}")))?
}

#[async_trait]
impl BrowserEngine for ChromeEngine {
    async fn launch(&self, spec: ObserveSpec) -> Result<Box<dyn BrowserPage>, DetectionError> {
        let user_agent = self.user_agent.clone();
        let (sandbox, idle_timeout) = (self.sandbox, self.idle_timeout);
        if !sandbox {
            debug!("Launching Chrome without sandbox");
        }
        let responses: Arc<Mutex<Vec<ObservedResponse>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&responses);

        let (browser, tab) = blocking("Browser launch", move || {
            let options = launch_options(sandbox, idle_timeout)?;
            let browser =
                Browser::new(options).map_err(|e| DetectionError::BrowserLaunch(e.to_string()))?;
            let tab = browser
                .new_tab()
                .map_err(|e| DetectionError::BrowserLaunch(format!("new tab: {e}")))?;
            tab.set_user_agent(&user_agent, None, None)
                .map_err(|e| DetectionError::Browser(format!("user agent: {e}")))?;

            let markers = spec.body_markers;
            tab.register_response_handling(
                RESPONSE_HANDLER,
                Box::new(move |event, fetch_body| {
                    let response = &event.response;
                    let body = if markers.iter().any(|m| response.url.contains(m.as_str())) {
                        match fetch_body() {
                            Ok(body) => Some(body.body),
                            Err(e) => {
                                debug!("Could not read body of {}: {e}", response.url);
                                None
                            }
                        }
                    } else {
                        None
                    };
                    let observed = ObservedResponse {
                        url: response.url.clone(),
                        method: "GET".to_string(),
                        resource_type: resource_type_for(&response.mime_type).to_string(),
                        status: response.status as u16,
                        body,
                    };
                    if let Ok(mut guard) = sink.lock() {
                        guard.push(observed);
                    }
                }),
            )
            .map_err(|e| DetectionError::Browser(format!("response observer: {e}")))?;
            Ok((browser, tab))
        })
        .await?;

        Ok(Box::new(ChromePage {
            browser: Some(browser),
            tab,
            responses,
        }))
    }
}

/// An open Chrome tab plus the browser that owns it.
struct ChromePage {
    browser: Option<Browser>,
    tab: Arc<Tab>,
    responses: Arc<Mutex<Vec<ObservedResponse>>>,
}

#[async_trait]
impl BrowserPage for ChromePage {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), DetectionError> {
        let tab = Arc::clone(&self.tab);
        let url = url.to_string();
        blocking("Navigation", move || {
            tab.set_default_timeout(timeout);
            tab.navigate_to(&url)
                .and_then(|tab| tab.wait_until_navigated())
                .map(|_| ())
                .map_err(|e| DetectionError::Browser(format!("navigation to {url}: {e}")))
        })
        .await
    }

    async fn evaluate(&mut self, expression: &str) -> Result<serde_json::Value, DetectionError> {
        let tab = Arc::clone(&self.tab);
        let expression = expression.to_string();
        blocking("Evaluation", move || {
            let remote = tab
                .evaluate(&expression, false)
                .map_err(|e| DetectionError::Browser(format!("evaluate: {e}")))?;
            Ok(remote.value.unwrap_or(serde_json::Value::Null))
        })
        .await
    }

    fn take_responses(&mut self) -> Vec<ObservedResponse> {
        match self.responses.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => Vec::new(),
        }
    }

    async fn close(&mut self) -> Result<(), DetectionError> {
        let Some(browser) = self.browser.take() else {
            return Ok(());
        };
        let tab = Arc::clone(&self.tab);
        blocking("Browser close", move || {
            if let Err(e) = tab.deregister_response_handling(RESPONSE_HANDLER) {
                debug!("Response observer already gone: {e}");
            }
            if let Err(e) = tab.close(false) {
                warn!("Failed to close tab: {e}");
            }
            drop(browser);
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_type_for_mime() {
        assert_eq!(resource_type_for("application/javascript"), "script");
        assert_eq!(resource_type_for("text/html; charset=utf-8"), "document");
        assert_eq!(resource_type_for("application/json"), "xhr");
        assert_eq!(resource_type_for("image/gif"), "image");
        assert_eq!(resource_type_for("font/woff2"), "other");
    }

    #[test]
    fn test_sandbox_enabled_by_default() {
        let engine = ChromeEngine::new("ua", Duration::from_secs(5));
        assert!(engine.sandbox);
        assert!(!engine.with_sandbox(false).sandbox);
        let options = launch_options(true, Duration::from_secs(5)).expect("options build");
        assert!(options.sandbox);
        assert!(options.headless);
    }
}
