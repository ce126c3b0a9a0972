//! Error type definitions.
//!
//! This module defines the detection error taxonomy and initialization errors.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Errors raised by individual detection operations.
///
/// Only a failure of the primary page fetch becomes terminal (`result.error`);
/// every other occurrence is logged into the evidence trail and the pipeline
/// carries on.
#[derive(Error, Debug)]
pub enum DetectionError {
    /// Non-success HTTP status.
    #[error("HTTP {status} fetching {url}")]
    Fetch {
        /// Requested URL
        url: String,
        /// Response status code
        status: u16,
    },

    /// A bounded operation exceeded its deadline.
    #[error("{operation} timed out after {seconds:.1}s")]
    Timeout {
        /// What was being waited on
        operation: String,
        /// Configured deadline in seconds
        seconds: f64,
    },

    /// The browser automation environment is unavailable.
    #[error("Browser launch failed: {0}")]
    BrowserLaunch(String),

    /// Navigation or evaluation failed after the browser started.
    #[error("Browser operation failed: {0}")]
    Browser(String),

    /// Malformed JSON from a relay configuration response.
    #[error("Malformed JSON from {url}: {message}")]
    Parse {
        /// Requested URL
        url: String,
        /// Parser message
        message: String,
    },

    /// Transport-level HTTP failure (connect, body, decode, ...).
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        /// Requested URL
        url: String,
        /// Underlying reqwest error
        #[source]
        source: ReqwestError,
    },

    /// The input URL was rejected before any request was made.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl DetectionError {
    /// Builds a timeout error for `operation` with the given deadline.
    pub fn timeout(operation: impl Into<String>, deadline: std::time::Duration) -> Self {
        DetectionError::Timeout {
            operation: operation.into(),
            seconds: deadline.as_secs_f64(),
        }
    }

    /// Returns true for deadline failures.
    pub fn is_timeout(&self) -> bool {
        matches!(self, DetectionError::Timeout { .. })
    }
}
