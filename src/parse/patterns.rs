//! Shared container-ID patterns and selector helpers.

use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

/// Helper function to compile a static regex pattern, panicking with a detailed error message
/// if compilation fails. Only used for compile-time constant patterns.
pub(crate) fn compile_regex_unsafe(pattern: &str, context: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| {
        panic!(
            "Failed to compile regex pattern '{}' in {}: {}. This is a programming error.",
            pattern, context, e
        )
    })
}

/// Parses a static CSS selector, panicking with a detailed error message on failure.
pub(crate) fn compile_selector_unsafe(selector: &str, context: &str) -> Selector {
    Selector::parse(selector).unwrap_or_else(|e| {
        panic!(
            "Failed to parse CSS selector '{}' in {}: {}. This is a programming error.",
            selector, context, e
        )
    })
}

/// Container-ID token as it appears inside larger text.
pub(crate) static CONTAINER_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(r"\bGTM-[A-Z0-9]{4,}\b", "CONTAINER_ID_PATTERN")
});

static CANONICAL_CONTAINER_ID: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(r"^GTM-[A-Z0-9]{4,}$", "CANONICAL_CONTAINER_ID")
});

/// Returns true if `id` is a canonical container identifier (`GTM-` + uppercase alphanumerics).
///
/// Measurement IDs (`G-...`), legacy analytics IDs (`UA-...`) and malformed tokens
/// are rejected.
pub fn is_valid_container_id(id: &str) -> bool {
    CANONICAL_CONTAINER_ID.is_match(id)
}

/// Finds every container-ID token in `text`, unique and in first-seen order.
pub fn find_container_ids(text: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for m in CONTAINER_ID_PATTERN.find_iter(text) {
        if !ids.iter().any(|seen| seen == m.as_str()) {
            ids.push(m.as_str().to_string());
        }
    }
    ids
}

/// Truncates `text` to at most `max_bytes`, backing off to a char boundary.
pub(crate) fn truncate_at_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
