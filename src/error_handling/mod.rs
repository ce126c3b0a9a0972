//! Error handling.
//!
//! This module provides:
//! - The `DetectionError` taxonomy (fetch, timeout, browser, parse)
//! - Initialization errors for the logger and HTTP client
//! - Categorization of `reqwest` errors into the taxonomy
//!
//! Detection is best-effort: errors from individual extractors or relay
//! attempts are logged and swallowed. Only the primary page fetch can end a
//! scan early, and even then the partial result is returned.

mod categorization;
mod types;

// Re-export public API
pub use categorization::categorize_reqwest_error;
pub use types::{DetectionError, InitializationError};
