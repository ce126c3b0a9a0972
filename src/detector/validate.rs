//! Final validation of accumulated candidates.

use crate::parse::is_valid_container_id;
use crate::result::{DetectionResult, EvidenceSource};

/// Number of candidates currently in canonical container-ID form.
pub fn valid_id_count(result: &DetectionResult) -> usize {
    result
        .container_ids()
        .filter(|id| is_valid_container_id(id))
        .count()
}

/// Drops candidates that are not canonical container IDs.
///
/// Survivors keep their first-seen order. Rejected tokens are recorded in the
/// evidence trail. Presence is set when at least one ID survives and is never
/// cleared.
pub fn finalize(result: &mut DetectionResult) {
    let mut rejected = Vec::new();
    result.retain_container_ids(|id| {
        let keep = is_valid_container_id(id);
        if !keep {
            rejected.push(id.to_string());
        }
        keep
    });
    for token in rejected {
        result.log(
            EvidenceSource::Validation,
            format!("Discarded malformed candidate {token:?}"),
        );
    }
    if valid_id_count(result) > 0 {
        result.mark_present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalize_filters_and_keeps_order() {
        let mut result = DetectionResult::new("https://example.com/");
        for id in ["GTM-BBBBBB", "G-12345678", "gtm-lower1", "GTM-AAAAAA", "GTM-AB"] {
            result.add_container_id(id);
        }
        finalize(&mut result);

        assert_eq!(
            result.container_ids().collect::<Vec<_>>(),
            vec!["GTM-BBBBBB", "GTM-AAAAAA"]
        );
        assert!(result.is_present());
        let discarded = result
            .evidence()
            .iter()
            .filter(|e| e.source == EvidenceSource::Validation)
            .count();
        assert_eq!(discarded, 3);
    }

    #[test]
    fn test_finalize_keeps_presence_without_ids() {
        let mut result = DetectionResult::new("https://example.com/");
        result.mark_present();
        result.add_container_id("G-MEASURE1");
        finalize(&mut result);
        assert!(result.is_present());
        assert_eq!(result.container_ids().count(), 0);
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut result = DetectionResult::new("https://example.com/");
        result.add_container_id("GTM-ABCDEF");
        result.add_container_id("UA-1-1");
        finalize(&mut result);
        let first: Vec<String> = result.container_ids().map(str::to_string).collect();
        finalize(&mut result);
        let second: Vec<String> = result.container_ids().map(str::to_string).collect();
        assert_eq!(first, second);
    }
}
