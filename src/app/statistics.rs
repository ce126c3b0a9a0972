//! Batch summary statistics.

use std::collections::HashMap;

use log::info;
use strum::IntoEnumIterator;

use crate::result::{DetectionReport, EvidenceSource};

/// Running totals for a batch scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Reports recorded
    pub scanned: usize,
    /// Reports with `isGTMPresent`
    pub present: usize,
    /// Reports with at least one container ID
    pub with_ids: usize,
    /// Reports carrying a terminal error
    pub errored: usize,
    /// Evidence entries per source label across all reports
    by_source: HashMap<String, usize>,
}

impl BatchSummary {
    pub fn record(&mut self, report: &DetectionReport) {
        self.scanned += 1;
        if report.is_gtm_present {
            self.present += 1;
        }
        if !report.container_ids.is_empty() {
            self.with_ids += 1;
        }
        if report.error.is_some() {
            self.errored += 1;
        }
        for method in &report.detection_methods {
            if let Some(label) = method
                .strip_prefix('[')
                .and_then(|rest| rest.split_once(']'))
                .map(|(label, _)| label)
            {
                *self.by_source.entry(label.to_string()).or_insert(0) += 1;
            }
        }
    }

    /// Evidence entries recorded under `source`.
    pub fn source_count(&self, source: EvidenceSource) -> usize {
        self.by_source
            .get(source.to_string().as_str())
            .copied()
            .unwrap_or(0)
    }

    /// Presence detected but no identifier recovered.
    pub fn present_without_ids(&self) -> usize {
        self.present.saturating_sub(self.with_ids)
    }

    /// Prints a one-line summary of the run.
    ///
    /// Works with both plain and JSON log formats (`log::info!` handles formatting).
    pub fn log_summary(&self, elapsed_seconds: f64) {
        info!(
            "✅ Scanned {} URL{} in {:.1}s: {} with tag manager ({} with container IDs, {} without), {} failed",
            self.scanned,
            if self.scanned == 1 { "" } else { "s" },
            elapsed_seconds,
            self.present,
            self.with_ids,
            self.present_without_ids(),
            self.errored
        );

        let breakdown: Vec<String> = EvidenceSource::iter()
            .filter_map(|source| {
                let count = self.source_count(source);
                (count > 0).then(|| format!("{source}={count}"))
            })
            .collect();
        if !breakdown.is_empty() {
            info!("Evidence by source: {}", breakdown.join(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(present: bool, ids: &[&str], error: Option<&str>) -> DetectionReport {
        DetectionReport {
            is_gtm_present: present,
            container_ids: ids.iter().map(|s| s.to_string()).collect(),
            detection_methods: vec!["[fetch] Fetched 100 bytes".to_string()],
            data_layer_events: Vec::new(),
            scripts_found: Vec::new(),
            network_requests: Vec::new(),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_record_counts_each_category() {
        let mut summary = BatchSummary::default();
        summary.record(&report(true, &["GTM-AAAAAA"], None));
        summary.record(&report(true, &[], None));
        summary.record(&report(false, &[], Some("HTTP 500 fetching https://x.example/")));
        summary.record(&report(false, &[], None));

        assert_eq!(summary.scanned, 4);
        assert_eq!(summary.present, 2);
        assert_eq!(summary.with_ids, 1);
        assert_eq!(summary.errored, 1);
        assert_eq!(summary.present_without_ids(), 1);
        assert_eq!(summary.source_count(EvidenceSource::Fetch), 4);
    }

    #[test]
    fn test_source_counts_by_label() {
        let mut summary = BatchSummary::default();
        let mut with_sweep = report(true, &["GTM-AAAAAA"], None);
        with_sweep.detection_methods.extend([
            "[sweep] GTM-AAAAAA found in page source".to_string(),
            "[script-tag] Loader script https://www.googletagmanager.com/gtm.js".to_string(),
            "no label here".to_string(),
        ]);
        summary.record(&with_sweep);

        assert_eq!(summary.source_count(EvidenceSource::Sweep), 1);
        assert_eq!(summary.source_count(EvidenceSource::ScriptTag), 1);
        assert_eq!(summary.source_count(EvidenceSource::Relay), 0);
        summary.log_summary(1.0);
    }

    #[test]
    fn test_log_summary_empty_batch() {
        // Should not panic with zero URLs
        BatchSummary::default().log_summary(0.0);
    }
}
