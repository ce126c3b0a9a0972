//! Script-tag and inline-script extraction.
//!
//! External scripts are matched against known tag-manager loader paths; inline
//! scripts are searched for initialization markers and container-ID tokens.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

use super::patterns::{
    compile_regex_unsafe, compile_selector_unsafe, find_container_ids, is_valid_container_id,
    truncate_at_char_boundary,
};
use crate::config::MAX_SCRIPT_CONTENT_SIZE;
use crate::result::{DetectionResult, EvidenceSource};

static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_selector_unsafe("script", "SCRIPT_SELECTOR"));

/// Loader path patterns, checked against the lowercased `src`.
const LOADER_PATTERNS: &[&str] = &["gtm.js", "gtag/js", "googletagmanager.com", "/loader.js"];

/// Hosts that serve the loader directly. Anything else is a relay.
const GOOGLE_TAG_HOSTS: &[&str] = &["www.googletagmanager.com", "googletagmanager.com"];

/// Initialization markers searched for in inline scripts.
static INIT_MARKERS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        (
            "google_tag_manager",
            compile_regex_unsafe(r"google_tag_manager", "INIT_MARKERS google_tag_manager"),
        ),
        (
            "googletagmanager.com",
            compile_regex_unsafe(r"googletagmanager\.com", "INIT_MARKERS googletagmanager"),
        ),
        (
            "gtag()",
            compile_regex_unsafe(r"\bgtag\s*\(", "INIT_MARKERS gtag"),
        ),
        ("ga()", compile_regex_unsafe(r"\bga\s*\(", "INIT_MARKERS ga")),
    ]
});

/// Resolves a script `src` against the page URL.
///
/// Protocol-relative sources (`//host/path`) resolve to the page's scheme.
fn resolve_script_url(base_url: &str, src: &str) -> Option<Url> {
    match Url::parse(src) {
        Ok(url) => Some(url),
        Err(_) => Url::parse(base_url).ok().and_then(|base| base.join(src).ok()),
    }
}

/// Scans `<script src=...>` elements for tag-manager loader URLs.
///
/// On a match the page is marked present, the script is recorded, and any `id=`
/// query parameter becomes a candidate identifier. A loader served from a host
/// other than Google's is logged as a server-side relay indicator; that alone
/// does not confirm presence.
pub fn scan_script_tags(document: &Html, _raw_html: &str, result: &mut DetectionResult) {
    let base_url = result.target_url().to_string();

    for element in document.select(&SCRIPT_SELECTOR) {
        let Some(src) = element.value().attr("src") else {
            continue;
        };
        let lowered = src.to_lowercase();
        let Some(pattern) = LOADER_PATTERNS.iter().find(|p| lowered.contains(*p)) else {
            continue;
        };

        let resolved = resolve_script_url(&base_url, src);
        let recorded = resolved
            .as_ref()
            .map(Url::to_string)
            .unwrap_or_else(|| src.to_string());

        result.mark_present();
        result.add_script(recorded.clone());
        result.log(
            EvidenceSource::ScriptTag,
            format!("Loader script matched '{pattern}': {recorded}"),
        );

        let Some(url) = resolved else {
            continue;
        };

        if let Some(id) = url
            .query_pairs()
            .find(|(key, _)| key == "id")
            .map(|(_, value)| value.trim().to_string())
            .filter(|id| !id.is_empty())
        {
            if result.add_container_id(id.clone()) {
                let note = if is_valid_container_id(&id) {
                    "container ID"
                } else {
                    "non-container ID, evidence only"
                };
                result.log(
                    EvidenceSource::ScriptTag,
                    format!("id parameter {id} ({note})"),
                );
            }
        }

        if let Some(host) = url.host_str() {
            if !GOOGLE_TAG_HOSTS.contains(&host) {
                result.log(
                    EvidenceSource::ScriptTag,
                    format!("Loader served from non-Google host {host} (possible server-side relay)"),
                );
            }
        }
    }
}

/// Scans inline `<script>` bodies for initialization markers and container IDs.
pub fn scan_inline_scripts(document: &Html, _raw_html: &str, result: &mut DetectionResult) {
    for (index, element) in document
        .select(&SCRIPT_SELECTOR)
        .filter(|element| element.value().attr("src").is_none())
        .enumerate()
    {
        let text: String = element.text().collect();
        let text = truncate_at_char_boundary(&text, MAX_SCRIPT_CONTENT_SIZE);
        if text.trim().is_empty() {
            continue;
        }

        let markers: Vec<&str> = INIT_MARKERS
            .iter()
            .filter(|(_, pattern)| pattern.is_match(text))
            .map(|(name, _)| *name)
            .collect();
        if !markers.is_empty() {
            result.mark_present();
            result.log(
                EvidenceSource::InlineScript,
                format!("Inline script #{index} has markers: {}", markers.join(", ")),
            );
        }

        for id in find_container_ids(text) {
            if result.add_container_id(id.clone()) {
                result.log(
                    EvidenceSource::InlineScript,
                    format!("Inline script #{index} references {id}"),
                );
            }
            result.mark_present();
        }
    }
}
