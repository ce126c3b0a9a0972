//! Platform-specific detectors.
//!
//! Two known indirection patterns hide the container ID from the served markup:
//! - A storefront platform whose analytics app injects the tag manager at
//!   runtime (heuristic only, never yields an ID)
//! - A server-side relay that publishes the real ID in a JSON configuration

mod relay;
mod storefront;

// Re-export public API
pub use relay::{
    extract_gtm_id, scan_relay_markup, RelayContext, RelaySearch, RelaySignals, RelayStrategy,
    FALLBACK_STRATEGIES, STATIC_STRATEGIES,
};
pub use storefront::{detect_storefront, storefront_markers};
