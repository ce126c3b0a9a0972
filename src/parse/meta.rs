//! Meta-tag and brute-force identifier extraction.

use scraper::{Html, Selector};
use std::sync::LazyLock;

use super::patterns::{compile_selector_unsafe, find_container_ids, is_valid_container_id};
use crate::result::{DetectionResult, EvidenceSource};

static META_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_selector_unsafe("meta", "META_SELECTOR"));

/// Scans `<meta>` tags for Google-related names or container-ID content.
///
/// A tag whose `name`/`property` mentions "google" contributes its `content` as a
/// candidate (verification tokens and the like are dropped at validation).
/// Any other tag contributes container-ID tokens found in its `content`.
pub fn scan_meta_tags(document: &Html, _raw_html: &str, result: &mut DetectionResult) {
    for element in document.select(&META_SELECTOR) {
        let value = element.value();
        let Some(content) = value.attr("content").map(str::trim).filter(|c| !c.is_empty())
        else {
            continue;
        };
        let label = value
            .attr("name")
            .or_else(|| value.attr("property"))
            .unwrap_or_default()
            .to_lowercase();

        let candidates = if label.contains("google") {
            vec![content.to_string()]
        } else {
            find_container_ids(content)
        };

        for candidate in candidates {
            if is_valid_container_id(&candidate) {
                result.mark_present();
            }
            if result.add_container_id(candidate.clone()) {
                result.log(
                    EvidenceSource::MetaTag,
                    format!("meta[{}] content {candidate}", label_or_unnamed(&label)),
                );
            }
        }
    }
}

fn label_or_unnamed(label: &str) -> &str {
    if label.is_empty() {
        "unnamed"
    } else {
        label
    }
}

/// Runs the container-ID regex over the whole document as a catch-all.
pub fn sweep_container_ids(_document: &Html, raw_html: &str, result: &mut DetectionResult) {
    let ids = find_container_ids(raw_html);
    if ids.is_empty() {
        return;
    }
    result.mark_present();
    for id in ids {
        let new = result.add_container_id(id.clone());
        result.log(
            EvidenceSource::Sweep,
            format!("{id} found in page source{}", if new { "" } else { " (already known)" }),
        );
    }
}
