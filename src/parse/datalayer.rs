//! `dataLayer` literal extraction.
//!
//! The page is not executed here: array assignments and `push` calls are located
//! with regexes and delimited with a bracket matcher that skips string literals.

use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

use super::patterns::{compile_regex_unsafe, truncate_at_char_boundary};
use crate::config::MAX_RAW_DATALAYER_CHARS;
use crate::result::{DetectionResult, EvidenceSource};

/// `dataLayer = [` and `dataLayer = window.dataLayer || [`
static ASSIGNMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r"\bdataLayer\s*=\s*(?:window\.dataLayer\s*\|\|\s*)?\[",
        "ASSIGNMENT_PATTERN",
    )
});

/// `dataLayer.push(`
static PUSH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(r"\bdataLayer\.push\s*\(", "PUSH_PATTERN"));

/// Unquoted object keys, for the lenient JSON retry.
static BARE_KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(r#"([{,]\s*)([A-Za-z_$][\w$.]*)\s*:"#, "BARE_KEY_PATTERN")
});

/// Lifecycle events only the tag manager runtime emits.
const LIFECYCLE_EVENTS: &[&str] = &["gtm.js", "gtm.dom", "gtm.load"];

/// Common e-commerce event names (GA4 and Universal Analytics enhanced e-commerce).
const ECOMMERCE_EVENTS: &[&str] = &[
    "add_to_cart",
    "remove_from_cart",
    "view_item",
    "view_item_list",
    "begin_checkout",
    "add_payment_info",
    "purchase",
    "addToCart",
    "productClick",
    "checkout",
];

/// Returns the byte index one past the bracket that closes the one at `open`.
fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (offset, ch) in text[open..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' | '`' => quote = Some(ch),
            '[' | '{' | '(' => depth += 1,
            ']' | '}' | ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + offset + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Object literals sitting directly inside a bracketed container (`[...]` or `(...)`).
fn top_level_objects(container: &str) -> Vec<&str> {
    let mut objects = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut object_start = None;

    for (idx, ch) in container.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' | '`' => quote = Some(ch),
            '[' | '{' | '(' => {
                if depth == 1 && ch == '{' {
                    object_start = Some(idx);
                }
                depth += 1;
            }
            ']' | '}' | ')' => {
                depth = depth.saturating_sub(1);
                if depth == 1 && ch == '}' {
                    if let Some(start) = object_start.take() {
                        objects.push(&container[start..=idx]);
                    }
                }
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
    }
    objects
}

/// Parses a JS object literal as JSON, retrying once with quotes normalized.
///
/// Literals that still fail (function calls, expressions) are kept as
/// `{"raw": "<text>"}` so nothing is silently dropped.
fn object_literal_to_json(literal: &str) -> serde_json::Value {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(literal) {
        return value;
    }
    let normalized = literal.replace('\'', "\"");
    let normalized = BARE_KEY_PATTERN.replace_all(&normalized, r#"$1"$2":"#);
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&normalized) {
        return value;
    }
    serde_json::json!({ "raw": truncate_at_char_boundary(literal, MAX_RAW_DATALAYER_CHARS) })
}

/// Every `dataLayer` array literal and `push(...)` argument list in `raw_html`.
fn data_layer_literals(raw_html: &str) -> Vec<&str> {
    let mut literals = Vec::new();
    for m in ASSIGNMENT_PATTERN
        .find_iter(raw_html)
        .chain(PUSH_PATTERN.find_iter(raw_html))
    {
        // The match ends right after the opening bracket
        let open = m.end() - 1;
        if let Some(close) = matching_close(raw_html, open) {
            literals.push(&raw_html[open..close]);
        }
    }
    literals
}

/// Scans `dataLayer` literals for lifecycle and e-commerce events.
///
/// Lifecycle events set presence. E-commerce events are only logged as a hint of
/// custom or indirect tracking.
pub fn scan_data_layer(_document: &Html, raw_html: &str, result: &mut DetectionResult) {
    let literals = data_layer_literals(raw_html);
    if literals.is_empty() {
        return;
    }
    result.log(
        EvidenceSource::DataLayer,
        format!("Found {} dataLayer literal(s)", literals.len()),
    );

    let mut lifecycle_seen: Vec<&str> = Vec::new();
    let mut ecommerce_seen: Vec<&str> = Vec::new();

    for literal in literals {
        for &event in LIFECYCLE_EVENTS {
            if literal.contains(event) && !lifecycle_seen.contains(&event) {
                lifecycle_seen.push(event);
            }
        }
        for &event in ECOMMERCE_EVENTS {
            let quoted = [format!("'{event}'"), format!("\"{event}\"")];
            if quoted.iter().any(|q| literal.contains(q.as_str()))
                && !ecommerce_seen.contains(&event)
            {
                ecommerce_seen.push(event);
            }
        }
        for object in top_level_objects(literal) {
            result.push_data_layer_event(object_literal_to_json(object));
        }
    }

    if !lifecycle_seen.is_empty() {
        result.mark_present();
        result.log(
            EvidenceSource::DataLayer,
            format!("Lifecycle events: {}", lifecycle_seen.join(", ")),
        );
    }
    if !ecommerce_seen.is_empty() {
        result.log(
            EvidenceSource::DataLayer,
            format!(
                "E-commerce events (possible custom tracking): {}",
                ecommerce_seen.join(", ")
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(html: &str) -> DetectionResult {
        let document = Html::parse_document(html);
        let mut result = DetectionResult::new("https://example.com/");
        scan_data_layer(&document, html, &mut result);
        result
    }

    #[test]
    fn test_matching_close_skips_strings() {
        let text = r#"[{"a": "]"}, 'x)']; tail"#;
        let close = matching_close(text, 0).expect("balanced");
        assert_eq!(&text[..close], r#"[{"a": "]"}, 'x)']"#);
    }

    #[test]
    fn test_matching_close_unbalanced() {
        assert_eq!(matching_close("[{", 0), None);
    }

    #[test]
    fn test_top_level_objects() {
        let objects = top_level_objects(r#"[{"a": {"b": 1}}, 2, {"c": [3]}]"#);
        assert_eq!(objects, vec![r#"{"a": {"b": 1}}"#, r#"{"c": [3]}"#]);
    }

    #[test]
    fn test_lifecycle_event_sets_presence() {
        let html = r#"<script>dataLayer = [{"event": "gtm.js", "gtm.start": 1700000000000}];</script>"#;
        let result = scan(html);
        assert!(result.is_present());
        assert_eq!(result.data_layer_events().len(), 1);
        assert_eq!(result.data_layer_events()[0]["event"], "gtm.js");
    }

    #[test]
    fn test_ecommerce_event_only_logged() {
        let html = r#"<script>window.dataLayer = window.dataLayer || [{event: 'add_to_cart', value: 12}];</script>"#;
        let result = scan(html);
        assert!(!result.is_present());
        assert!(result
            .evidence()
            .iter()
            .any(|e| e.message.contains("add_to_cart")));
        assert_eq!(result.data_layer_events()[0]["event"], "add_to_cart");
        assert_eq!(result.data_layer_events()[0]["value"], 12);
    }

    #[test]
    fn test_push_calls_are_collected() {
        let html = r#"<script>dataLayer.push({'event': 'gtm.load'}); dataLayer.push({ecommerce: null});</script>"#;
        let result = scan(html);
        assert!(result.is_present());
        assert_eq!(result.data_layer_events().len(), 2);
        assert_eq!(result.data_layer_events()[1]["ecommerce"], serde_json::Value::Null);
    }

    #[test]
    fn test_unparseable_object_kept_raw() {
        let html = r#"<script>dataLayer.push({'gtm.start': new Date().getTime(), event: 'gtm.js'});</script>"#;
        let result = scan(html);
        assert!(result.is_present());
        let raw = result.data_layer_events()[0]["raw"]
            .as_str()
            .expect("raw literal");
        assert!(raw.contains("new Date()"));
    }

    #[test]
    fn test_no_data_layer() {
        let result = scan("<html><body><p>nothing here</p></body></html>");
        assert!(!result.is_present());
        assert!(result.evidence().is_empty());
        assert!(result.data_layer_events().is_empty());
    }
}
