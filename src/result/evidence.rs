//! Typed evidence entries.

use std::fmt;

use strum_macros::{Display as DisplayMacro, EnumIter as EnumIterMacro};

/// Which stage of the pipeline produced an evidence entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DisplayMacro, EnumIterMacro)]
#[strum(serialize_all = "kebab-case")]
pub enum EvidenceSource {
    // Dynamic phase
    Browser,
    BrowserNetwork,
    RenderedDom,
    // Static phase
    Fetch,
    ScriptTag,
    InlineScript,
    DataLayer,
    MetaTag,
    Sweep,
    // Platform detectors
    Storefront,
    Relay,
    // Finalization
    Fallback,
    Validation,
}

/// One human-readable line of the detection trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    pub source: EvidenceSource,
    pub message: String,
}

impl Evidence {
    pub fn new(source: EvidenceSource, message: impl Into<String>) -> Self {
        Self {
            source,
            message: message.into(),
        }
    }
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.source, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_source_labels_are_kebab_case() {
        assert_eq!(EvidenceSource::ScriptTag.to_string(), "script-tag");
        assert_eq!(EvidenceSource::BrowserNetwork.to_string(), "browser-network");
        for source in EvidenceSource::iter() {
            let label = source.to_string();
            assert!(!label.is_empty());
            assert_eq!(label, label.to_lowercase());
        }
    }
}
