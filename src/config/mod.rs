//! Detector configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, limits, relay defaults)
//! - The `DetectorConfig` and `RelayProfile` types
//! - Logging option types shared with the CLI

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{DetectorConfig, LogFormat, LogLevel, RelayProfile};
