//! Configuration constants.
//!
//! This module defines all configuration constants used throughout the detector,
//! including timeouts, size limits, and the relay service defaults.

use std::time::Duration;

/// Timeout for the primary page fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for each relay configuration fetch.
/// A slow relay endpoint only fails its own candidate URL, never the whole scan.
pub const RELAY_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall budget for browser navigation (launch excluded).
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Extra wait after navigation so deferred tag scripts get a chance to run.
pub const SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Default concurrency for batch scans from the CLI.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default User-Agent string for HTTP requests.
///
/// Mimics a current desktop Chrome build; many storefronts serve a stripped page
/// (or a bot challenge) to obviously automated user agents, which hides the tag
/// manager snippet.
///
/// Users can override this via the `--user-agent` CLI flag.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Standard browser `Accept` header for document requests.
pub const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Standard browser `Accept-Language` header.
pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// `Accept` header used for relay configuration requests.
pub const ACCEPT_JSON: &str = "application/json,text/plain;q=0.9,*/*;q=0.8";

// Response and body size limits
/// Maximum response body size in bytes (2MB).
/// Larger pages are truncated before parsing to bound memory use.
pub const MAX_RESPONSE_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Maximum inline script size scanned per `<script>` element (100KB).
pub const MAX_SCRIPT_CONTENT_SIZE: usize = 100 * 1024;

/// Maximum URL length accepted as detector input.
pub const MAX_URL_LENGTH: usize = 2048;

/// Maximum number of characters kept when a dataLayer object cannot be parsed as JSON.
pub const MAX_RAW_DATALAYER_CHARS: usize = 2000;

// Relay service defaults
/// Hosts/paths that identify the relay's CDN widget script.
pub const RELAY_WIDGET_MARKERS: &[&str] = &["cdn.stape.io", "stape.io/widget", "sgtm-widget.js"];

/// Base URL of the relay's public widget configuration endpoint.
pub const RELAY_CONFIG_ENDPOINT: &str = "https://widget.stape.io/api/widget-config";

/// Path fragment that identifies a widget configuration URL (in markup or in browser traffic).
pub const RELAY_CONFIG_PATH: &str = "/api/widget-config";

/// Query parameter carrying the shop identifier on the configuration endpoint.
pub const RELAY_SHOP_PARAM: &str = "shop";

/// Well-known paths a storefront may expose for a self-hosted relay configuration.
pub const RELAY_PATH_GUESSES: &[&str] = &[
    "/apps/stape/widget-config",
    "/apps/sgtm/config.json",
    "/a/sgtm/config",
];

/// Substrings that mark a browser request as tracking-related.
pub const TRACKING_REQUEST_MARKERS: &[&str] = &[
    "googletagmanager",
    "google-analytics",
    "gtm.js",
    "gtag/js",
    "/collect",
    "analytics",
    "stape",
    "widget-config",
];
