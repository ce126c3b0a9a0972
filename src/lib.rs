//! gtm_detect library: multi-strategy Google Tag Manager detection
//!
//! Determines whether a website uses Google Tag Manager (directly, after
//! client-side rendering, or through a server-side relay) and extracts the
//! container IDs in use, together with a trace of how each signal was obtained.
//!
//! # Example
//!
//! ```no_run
//! use gtm_detect::{DetectorConfig, GtmDetector};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let detector = GtmDetector::new(DetectorConfig::default())?;
//! let report = detector.detect("https://example.com").await;
//! println!("present: {}, containers: {:?}", report.is_gtm_present, report.container_ids);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. The browser strategy additionally
//! needs a local Chrome or Chromium installation; without one it is skipped
//! and the static strategies run.

pub mod app;
pub mod browser;
pub mod config;
pub mod detector;
pub mod error_handling;
pub mod fetch;
pub mod initialization;
pub mod parse;
pub mod platform;
pub mod result;

// Re-export public API
pub use app::BatchSummary;
pub use config::{DetectorConfig, LogFormat, LogLevel, RelayProfile};
pub use detector::{detect_many, scan_stream, GtmDetector, ScanRecord};
pub use error_handling::{DetectionError, InitializationError};
pub use result::{DetectionReport, DetectionResult, Evidence, EvidenceSource, NetworkRequest};

/// Detects Google Tag Manager on `url` with default settings.
///
/// `dynamic` selects whether the headless-browser strategy is attempted first.
///
/// # Errors
///
/// Returns `InitializationError` if the HTTP client cannot be built. Detection
/// failures never surface here: they are reported in the returned report's
/// `error` field.
pub async fn detect_gtm(url: &str, dynamic: bool) -> Result<DetectionReport, InitializationError> {
    let detector = GtmDetector::new(DetectorConfig::default())?;
    Ok(detector.detect_with(url, dynamic).await)
}
