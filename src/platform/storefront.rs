//! Storefront platform heuristic.
//!
//! Storefront apps inject the tag manager at runtime, so the container ID is
//! usually absent from the served markup. This detector can only report that
//! tracking is likely active.

use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

use crate::parse::compile_regex_unsafe;
use crate::result::{DetectionResult, EvidenceSource};

/// Markers identifying the storefront platform, with what kind of marker each is.
const PLATFORM_MARKERS: &[(&str, &str)] = &[
    ("Shopify.shop", "vendor JS namespace"),
    ("window.Shopify", "vendor JS namespace"),
    ("ShopifyAnalytics", "vendor JS namespace"),
    ("cdn.shopify.com", "vendor CDN asset"),
    ("myshopify.com", "platform shop domain"),
    ("data-shopify", "platform DOM attribute"),
    ("shopify-section", "platform DOM attribute"),
];

/// Platform-native event tracking calls.
const TRACKING_CALLS: &[&str] = &[
    "ShopifyAnalytics.lib.track",
    "Shopify.analytics.publish",
    "analytics.subscribe(",
    "trekkie",
];

/// Quoted e-commerce event names (platform customer events and GA4 names).
static ECOMMERCE_EVENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r#"["'](product_viewed|product_added_to_cart|collection_viewed|cart_viewed|checkout_started|checkout_completed|payment_info_submitted|add_to_cart|view_item|begin_checkout|purchase)["']"#,
        "ECOMMERCE_EVENT_PATTERN",
    )
});

/// Returns the platform markers present in `raw_html`.
pub fn storefront_markers(raw_html: &str) -> Vec<&'static str> {
    PLATFORM_MARKERS
        .iter()
        .filter(|(marker, _)| raw_html.contains(marker))
        .map(|(_, kind)| *kind)
        .fold(Vec::new(), |mut kinds, kind| {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
            kinds
        })
}

/// Detects indirect analytics activity on a storefront page.
///
/// Sets presence when the page belongs to the platform and shows platform
/// tracking calls or e-commerce event names. This is deliberately permissive:
/// a storefront with only e-commerce signals reports presence with no ID.
pub fn detect_storefront(_document: &Html, raw_html: &str, result: &mut DetectionResult) {
    let kinds = storefront_markers(raw_html);
    if kinds.is_empty() {
        return;
    }
    result.log(
        EvidenceSource::Storefront,
        format!("Storefront platform detected ({})", kinds.join(", ")),
    );

    let calls: Vec<&str> = TRACKING_CALLS
        .iter()
        .copied()
        .filter(|call| raw_html.contains(call))
        .collect();

    let mut events: Vec<&str> = Vec::new();
    for cap in ECOMMERCE_EVENT_PATTERN.captures_iter(raw_html) {
        if let Some(name) = cap.get(1).map(|m| m.as_str()) {
            if !events.contains(&name) {
                events.push(name);
            }
        }
    }

    if calls.is_empty() && events.is_empty() {
        result.log(
            EvidenceSource::Storefront,
            "No platform tracking activity found in markup",
        );
        return;
    }

    result.mark_present();
    if !calls.is_empty() {
        result.log(
            EvidenceSource::Storefront,
            format!("Platform tracking calls: {}", calls.join(", ")),
        );
    }
    if !events.is_empty() {
        result.log(
            EvidenceSource::Storefront,
            format!("E-commerce events: {}", events.join(", ")),
        );
    }
    result.log(
        EvidenceSource::Storefront,
        "Container ID may not be recoverable from markup: the platform app injects it at runtime",
    );
}
