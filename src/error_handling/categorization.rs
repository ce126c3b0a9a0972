//! Error categorization.
//!
//! Maps transport errors from `reqwest` onto the detection error taxonomy.

use std::time::Duration;

use super::types::DetectionError;

/// Categorizes a `reqwest::Error` into a `DetectionError`.
///
/// Status errors become `Fetch`, deadline failures become `Timeout`, and
/// everything else (connect, body, decode, redirect) is kept as `Http` with the
/// original error as its source.
///
/// # Arguments
///
/// * `error` - The `reqwest::Error` to categorize
/// * `url` - The URL that was requested
/// * `deadline` - The timeout that applied to the request
pub fn categorize_reqwest_error(
    error: reqwest::Error,
    url: &str,
    deadline: Duration,
) -> DetectionError {
    if let Some(status) = error.status() {
        return DetectionError::Fetch {
            url: url.to_string(),
            status: status.as_u16(),
        };
    }

    if error.is_timeout() {
        return DetectionError::timeout(format!("Request to {url}"), deadline);
    }

    DetectionError::Http {
        url: url.to_string(),
        source: error,
    }
}
