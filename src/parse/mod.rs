//! Static signal extraction.
//!
//! Each extractor scans the parsed document and/or the raw HTML for one category
//! of evidence and mutates the shared `DetectionResult`:
//! - Script tags pointing at tag-manager loaders
//! - Inline script bodies (initialization markers, container IDs)
//! - `dataLayer` literals (lifecycle and e-commerce events)
//! - Meta tags
//! - A brute-force container-ID sweep over the raw HTML
//!
//! Extractors are independent: running them in any order yields the same
//! validated identifier set.
//!
//! All HTML parsing is done with the `scraper` crate; nothing is executed.

mod datalayer;
mod meta;
mod patterns;
mod scripts;

use scraper::Html;

use crate::result::DetectionResult;

// Re-export public API
pub use datalayer::scan_data_layer;
pub use meta::{scan_meta_tags, sweep_container_ids};
pub use patterns::{find_container_ids, is_valid_container_id};
pub use scripts::{scan_inline_scripts, scan_script_tags};

pub(crate) use patterns::{compile_regex_unsafe, truncate_at_char_boundary};

/// Signature shared by every markup extractor: `(document, raw_html, result)`.
pub type Extractor = fn(&Html, &str, &mut DetectionResult);

/// The static extractors, by name.
pub const STATIC_EXTRACTORS: &[(&str, Extractor)] = &[
    ("script-tag", scan_script_tags),
    ("inline-script", scan_inline_scripts),
    ("data-layer", scan_data_layer),
    ("meta-tag", scan_meta_tags),
    ("sweep", sweep_container_ids),
];

/// Runs every static extractor against one document.
pub fn run_static_extractors(document: &Html, raw_html: &str, result: &mut DetectionResult) {
    for (name, extractor) in STATIC_EXTRACTORS {
        log::trace!("Running {name} extractor on {}", result.target_url());
        extractor(document, raw_html, result);
    }
}
