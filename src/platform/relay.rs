//! Server-side relay detection.
//!
//! The relay serves the container from its own infrastructure and publishes a
//! JSON widget configuration whose `generate.gtm_id` field holds the real
//! container ID. Configuration URLs are either embedded in the markup or
//! constructed from a shop identifier, the target domain, or well-known paths.
//!
//! Candidate URLs are produced by an ordered list of [`RelayStrategy`] values
//! and tried in sequence until one yields a valid ID.

use std::collections::HashSet;
use std::time::Duration;

use log::{debug, warn};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::config::RelayProfile;
use crate::fetch::{with_deadline, ContentFetcher};
use crate::parse::{compile_regex_unsafe, is_valid_container_id};
use crate::result::{DetectionResult, EvidenceSource};

static SHOP_DOMAIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(r"\b[a-z0-9][a-z0-9-]*\.myshopify\.com\b", "SHOP_DOMAIN_PATTERN")
});

/// Relay indicators found in one page's markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelaySignals {
    /// The relay's CDN widget script is referenced
    pub widget_found: bool,
    /// Absolute configuration URLs embedded in the markup, first-seen order
    pub config_urls: Vec<String>,
    /// Shop identifier literals, first-seen order
    pub shops: Vec<String>,
}

/// Undoes the escaping commonly applied to URLs inside inline JSON and attributes.
fn unescape_markup(raw_html: &str) -> String {
    raw_html
        .replace("\\/", "/")
        .replace("&amp;", "&")
        .replace("\\u0026", "&")
}

/// Scans markup for relay widget references, configuration URLs and shop literals.
///
/// Findings are logged to `result` under the relay source. Nothing here sets
/// presence: only a fetched configuration can confirm the relay.
pub fn scan_relay_markup(
    raw_html: &str,
    profile: &RelayProfile,
    result: &mut DetectionResult,
) -> RelaySignals {
    let text = unescape_markup(raw_html);
    let mut signals = RelaySignals::default();

    if let Some(marker) = profile
        .widget_markers
        .iter()
        .find(|marker| text.contains(marker.as_str()))
    {
        signals.widget_found = true;
        result.log(
            EvidenceSource::Relay,
            format!("Relay widget script referenced ({marker})"),
        );
    }

    let config_pattern = format!(
        r#"(?:https?:)?//[^\s"'<>\\]+?{}[^\s"'<>\\]*"#,
        regex::escape(&profile.config_path)
    );
    match Regex::new(&config_pattern) {
        Ok(re) => {
            for m in re.find_iter(&text) {
                let found = m.as_str();
                let absolute = if found.starts_with("//") {
                    format!("https:{found}")
                } else {
                    found.to_string()
                };
                if !signals.config_urls.contains(&absolute) {
                    result.log(
                        EvidenceSource::Relay,
                        format!("Embedded relay configuration URL: {absolute}"),
                    );
                    signals.config_urls.push(absolute);
                }
            }
        }
        Err(e) => warn!("Invalid relay config path {:?}: {e}", profile.config_path),
    }

    for m in SHOP_DOMAIN_PATTERN.find_iter(&text) {
        let shop = m.as_str().to_string();
        if !signals.shops.contains(&shop) {
            signals.shops.push(shop);
        }
    }
    if !signals.shops.is_empty() {
        result.log(
            EvidenceSource::Relay,
            format!("Shop identifiers: {}", signals.shops.join(", ")),
        );
    }

    signals
}

/// Everything a strategy needs to construct candidate URLs.
#[derive(Debug, Clone)]
pub struct RelayContext {
    pub signals: RelaySignals,
    pub profile: RelayProfile,
    /// The page being scanned; `None` if it could not be parsed
    pub target: Option<Url>,
}

impl RelayContext {
    pub fn new(signals: RelaySignals, profile: RelayProfile, target_url: &str) -> Self {
        Self {
            signals,
            profile,
            target: Url::parse(target_url).ok(),
        }
    }
}

/// One named way of producing relay configuration URLs.
#[derive(Clone, Copy)]
pub struct RelayStrategy {
    pub label: &'static str,
    pub candidates: fn(&RelayContext) -> Vec<String>,
}

impl std::fmt::Debug for RelayStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayStrategy")
            .field("label", &self.label)
            .finish()
    }
}

fn embedded_urls(ctx: &RelayContext) -> Vec<String> {
    ctx.signals.config_urls.clone()
}

fn shop_urls_if_widget(ctx: &RelayContext) -> Vec<String> {
    if !ctx.signals.widget_found {
        return Vec::new();
    }
    shop_urls(ctx)
}

fn shop_urls(ctx: &RelayContext) -> Vec<String> {
    ctx.signals
        .shops
        .iter()
        .map(|shop| ctx.profile.config_url_for_shop(shop))
        .collect()
}

/// Shop identifiers guessed from the target host.
fn domain_urls(ctx: &RelayContext) -> Vec<String> {
    let Some(host) = ctx.target.as_ref().and_then(|u| u.host_str()) else {
        return Vec::new();
    };
    let bare = host.strip_prefix("www.").unwrap_or(host);
    let mut shops = vec![host.to_string(), bare.to_string()];
    if let Some(label) = bare.split('.').next().filter(|l| !l.is_empty()) {
        shops.push(format!("{label}.myshopify.com"));
    }
    shops.dedup();
    shops
        .iter()
        .map(|shop| ctx.profile.config_url_for_shop(shop))
        .collect()
}

/// Well-known relay configuration paths on the target origin.
fn path_guess_urls(ctx: &RelayContext) -> Vec<String> {
    let Some(target) = ctx.target.as_ref() else {
        return Vec::new();
    };
    ctx.profile
        .path_guesses
        .iter()
        .filter_map(|path| target.join(path).ok())
        .map(String::from)
        .collect()
}

/// Strategies run during the static phase.
pub const STATIC_STRATEGIES: &[RelayStrategy] = &[
    RelayStrategy {
        label: "embedded configuration URL",
        candidates: embedded_urls,
    },
    RelayStrategy {
        label: "shop identifier with relay widget",
        candidates: shop_urls_if_widget,
    },
];

/// Strategies run when presence is established but no valid ID survived.
pub const FALLBACK_STRATEGIES: &[RelayStrategy] = &[
    RelayStrategy {
        label: "embedded configuration URL",
        candidates: embedded_urls,
    },
    RelayStrategy {
        label: "shop identifier",
        candidates: shop_urls,
    },
    RelayStrategy {
        label: "target domain heuristic",
        candidates: domain_urls,
    },
    RelayStrategy {
        label: "well-known relay path",
        candidates: path_guess_urls,
    },
];

/// Reads `generate.gtm_id` from a relay configuration body if it is a valid ID.
pub fn extract_gtm_id(config: &serde_json::Value) -> Option<&str> {
    config
        .pointer("/generate/gtm_id")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|id| is_valid_container_id(id))
}

/// Tries relay configuration URLs until one yields a container ID.
///
/// URLs already attempted by an earlier `run` on the same search are skipped.
pub struct RelaySearch<'a> {
    fetcher: &'a dyn ContentFetcher,
    timeout: Duration,
    attempted: HashSet<String>,
}

impl<'a> RelaySearch<'a> {
    pub fn new(fetcher: &'a dyn ContentFetcher, timeout: Duration) -> Self {
        Self {
            fetcher,
            timeout,
            attempted: HashSet::new(),
        }
    }

    /// Number of distinct URLs fetched so far.
    pub fn attempts(&self) -> usize {
        self.attempted.len()
    }

    /// Runs `strategies` in order and returns the first valid container ID.
    ///
    /// The ID is added to `result` and presence is set. Fetch, timeout and
    /// parse failures are logged under `source` and the search continues.
    pub async fn run(
        &mut self,
        strategies: &[RelayStrategy],
        ctx: &RelayContext,
        result: &mut DetectionResult,
        source: EvidenceSource,
    ) -> Option<String> {
        for strategy in strategies {
            for url in (strategy.candidates)(ctx) {
                if !self.attempted.insert(url.clone()) {
                    continue;
                }
                debug!("Relay attempt ({}) {url}", strategy.label);
                let fetched = with_deadline(
                    "Relay config fetch",
                    self.timeout,
                    self.fetcher.fetch_json(&url, self.timeout),
                )
                .await;
                match fetched {
                    Ok(config) => match extract_gtm_id(&config) {
                        Some(id) => {
                            let id = id.to_string();
                            result.add_container_id(id.clone());
                            result.mark_present();
                            result.log(
                                source,
                                format!("Relay configuration at {url} ({}) names {id}", strategy.label),
                            );
                            return Some(id);
                        }
                        None => result.log(
                            source,
                            format!("Relay configuration at {url} has no valid generate.gtm_id"),
                        ),
                    },
                    Err(e) => result.log(source, format!("Relay attempt {url} failed: {e}")),
                }
            }
        }
        None
    }
}
