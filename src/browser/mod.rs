//! Headless-browser capability.
//!
//! The dynamic strategy drives a browser through the `BrowserEngine` and
//! `BrowserPage` traits. `ChromeEngine` is the production implementation on
//! top of `headless_chrome`; tests substitute scripted fakes.

mod chrome;
mod detect;

use async_trait::async_trait;

use crate::error_handling::DetectionError;

pub use chrome::ChromeEngine;
pub use detect::detect_dynamic;

/// What the page should capture while it loads.
#[derive(Debug, Clone, Default)]
pub struct ObserveSpec {
    /// Response bodies are captured only for URLs containing one of these
    pub body_markers: Vec<String>,
}

/// A network response seen during navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedResponse {
    pub url: String,
    pub method: String,
    pub resource_type: String,
    pub status: u16,
    /// Present only for URLs matching `ObserveSpec::body_markers`
    pub body: Option<String>,
}

/// Launches browser pages.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    /// Starts a browser and opens a page that records responses per `spec`.
    ///
    /// Fails with `DetectionError::BrowserLaunch` when no browser is available.
    async fn launch(&self, spec: ObserveSpec) -> Result<Box<dyn BrowserPage>, DetectionError>;
}

/// One open page. The owner must call `close` on every exit path.
#[async_trait]
pub trait BrowserPage: Send {
    /// Navigates and waits for the load to settle, bounded by `timeout`.
    async fn navigate(
        &mut self,
        url: &str,
        timeout: std::time::Duration,
    ) -> Result<(), DetectionError>;

    /// Evaluates a script expression in the page and returns its JSON value.
    async fn evaluate(&mut self, expression: &str) -> Result<serde_json::Value, DetectionError>;

    /// Drains the responses recorded since the last call.
    fn take_responses(&mut self) -> Vec<ObservedResponse>;

    /// Releases the page and its browser process.
    async fn close(&mut self) -> Result<(), DetectionError>;
}
