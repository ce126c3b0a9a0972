//! Application initialization.
//!
//! This module provides functions to initialize shared resources:
//! - The logger (plain or JSON output)
//! - The HTTP client used for page and relay fetches

mod client;
mod logger;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;
