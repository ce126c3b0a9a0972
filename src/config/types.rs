//! Configuration types.
//!
//! This module defines the detector configuration, the relay service profile,
//! and the logging enums shared with the CLI.

use std::time::Duration;

use clap::ValueEnum;

use crate::config::constants::{
    DEFAULT_USER_AGENT, FETCH_TIMEOUT, MAX_RESPONSE_BODY_SIZE, NAVIGATION_TIMEOUT,
    RELAY_CONFIG_ENDPOINT, RELAY_CONFIG_PATH, RELAY_FETCH_TIMEOUT, RELAY_PATH_GUESSES,
    RELAY_SHOP_PARAM, RELAY_WIDGET_MARKERS, SETTLE_DELAY,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Where the server-side relay publishes its widget configuration.
///
/// The defaults describe the production relay service; tests point
/// `config_endpoint` at a mock server.
#[derive(Debug, Clone)]
pub struct RelayProfile {
    /// Substrings identifying the relay's CDN widget script in markup
    pub widget_markers: Vec<String>,
    /// Absolute URL of the public configuration endpoint (shop appended as a query parameter)
    pub config_endpoint: String,
    /// Path fragment recognising configuration URLs in markup and browser traffic
    pub config_path: String,
    /// Query parameter name carrying the shop identifier
    pub shop_param: String,
    /// Paths tried on the target origin during the fallback search
    pub path_guesses: Vec<String>,
}

impl Default for RelayProfile {
    fn default() -> Self {
        Self {
            widget_markers: RELAY_WIDGET_MARKERS.iter().map(|s| s.to_string()).collect(),
            config_endpoint: RELAY_CONFIG_ENDPOINT.to_string(),
            config_path: RELAY_CONFIG_PATH.to_string(),
            shop_param: RELAY_SHOP_PARAM.to_string(),
            path_guesses: RELAY_PATH_GUESSES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl RelayProfile {
    /// Builds the configuration URL for a shop identifier.
    pub fn config_url_for_shop(&self, shop: &str) -> String {
        match url::Url::parse(&self.config_endpoint) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair(&self.shop_param, shop);
                url.to_string()
            }
            Err(_) => format!("{}?{}={}", self.config_endpoint, self.shop_param, shop),
        }
    }
}

/// Detector configuration.
///
/// Constructed programmatically by library users or mapped from CLI flags.
///
/// # Examples
///
/// ```no_run
/// use gtm_detect::DetectorConfig;
/// use std::time::Duration;
///
/// let config = DetectorConfig {
///     enable_dynamic: true,
///     fetch_timeout: Duration::from_secs(15),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Attempt the headless-browser strategy before the static pipeline
    pub enable_dynamic: bool,

    /// Deadline for the primary page fetch
    pub fetch_timeout: Duration,

    /// Deadline for each relay configuration fetch
    pub relay_timeout: Duration,

    /// Deadline for browser navigation
    pub navigation_timeout: Duration,

    /// Fixed wait after navigation settles
    pub settle_delay: Duration,

    /// HTTP User-Agent header value
    pub user_agent: String,

    /// Page bodies above this size are truncated before parsing
    pub max_body_bytes: usize,

    /// Run Chrome with its sandbox. Containers running as root usually need `false`.
    pub browser_sandbox: bool,

    /// Relay service profile
    pub relay: RelayProfile,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            enable_dynamic: false,
            fetch_timeout: FETCH_TIMEOUT,
            relay_timeout: RELAY_FETCH_TIMEOUT,
            navigation_timeout: NAVIGATION_TIMEOUT,
            settle_delay: SETTLE_DELAY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_body_bytes: MAX_RESPONSE_BODY_SIZE,
            browser_sandbox: true,
            relay: RelayProfile::default(),
        }
    }
}
