//! Main application modules.
//!
//! This module provides utilities for URL validation, URL list input, progress
//! logging and batch statistics used by the detector and the command-line tool.

pub mod input;
pub mod logging;
pub mod statistics;
pub mod url;

// Re-export public API
pub use input::read_url_list;
pub use logging::log_progress;
pub use statistics::BatchSummary;
pub use url::validate_and_normalize_url;
