//! Detection result model.
//!
//! `DetectionResult` is the per-invocation accumulator every pipeline stage
//! mutates in place. `DetectionReport` is its JSON shape as consumed by the
//! scan-persistence layer and the report generator.

mod evidence;
mod report;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

pub use evidence::{Evidence, EvidenceSource};
pub use report::DetectionReport;

/// A network request seen by the browser strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRequest {
    /// Request URL
    pub url: String,
    /// HTTP method
    pub method: String,
    /// Coarse resource kind (script, xhr, document, image, other)
    pub resource_type: String,
    /// Response status, when the request completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

/// Accumulated evidence for one detection run.
///
/// Collections keep first-seen order. `is_present` only ever moves from
/// `false` to `true`.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    target_url: String,
    is_present: bool,
    container_ids: IndexSet<String>,
    evidence: Vec<Evidence>,
    scripts_observed: IndexSet<String>,
    network_requests: IndexSet<NetworkRequest>,
    data_layer_events: Vec<serde_json::Value>,
    error: Option<String>,
}

impl DetectionResult {
    /// Creates an empty result for `target_url`.
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            is_present: false,
            container_ids: IndexSet::new(),
            evidence: Vec::new(),
            scripts_observed: IndexSet::new(),
            network_requests: IndexSet::new(),
            data_layer_events: Vec::new(),
            error: None,
        }
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn is_present(&self) -> bool {
        self.is_present
    }

    /// Records qualifying evidence of a tag manager on the page.
    pub fn mark_present(&mut self) {
        self.is_present = true;
    }

    /// Adds a candidate identifier. Returns `true` if it was not already known.
    pub fn add_container_id(&mut self, id: impl Into<String>) -> bool {
        self.container_ids.insert(id.into())
    }

    /// Candidate identifiers in first-seen order (unvalidated until finalize).
    pub fn container_ids(&self) -> impl Iterator<Item = &str> {
        self.container_ids.iter().map(String::as_str)
    }

    /// Keeps only candidates for which `keep` returns true, preserving order.
    pub fn retain_container_ids<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.container_ids.retain(|id| keep(id));
    }

    /// Appends an evidence entry and mirrors it to the debug log.
    pub fn log(&mut self, source: EvidenceSource, message: impl Into<String>) {
        let evidence = Evidence::new(source, message);
        log::debug!("{}: {}", self.target_url, evidence);
        self.evidence.push(evidence);
    }

    pub fn evidence(&self) -> &[Evidence] {
        &self.evidence
    }

    pub fn add_script(&mut self, src: impl Into<String>) -> bool {
        self.scripts_observed.insert(src.into())
    }

    pub fn scripts(&self) -> impl Iterator<Item = &str> {
        self.scripts_observed.iter().map(String::as_str)
    }

    pub fn add_network_request(&mut self, request: NetworkRequest) -> bool {
        self.network_requests.insert(request)
    }

    pub fn network_requests(&self) -> impl Iterator<Item = &NetworkRequest> {
        self.network_requests.iter()
    }

    pub fn push_data_layer_event(&mut self, event: serde_json::Value) {
        self.data_layer_events.push(event);
    }

    pub fn data_layer_events(&self) -> &[serde_json::Value] {
        &self.data_layer_events
    }

    /// Records a terminal failure. Evidence gathered so far is kept.
    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Converts the accumulator into its serialized shape.
    pub fn into_report(self) -> DetectionReport {
        DetectionReport {
            is_gtm_present: self.is_present,
            container_ids: self.container_ids.into_iter().collect(),
            detection_methods: self.evidence.iter().map(ToString::to_string).collect(),
            data_layer_events: self.data_layer_events,
            scripts_found: self.scripts_observed.into_iter().collect(),
            network_requests: self.network_requests.into_iter().collect(),
            error: self.error,
        }
    }
}
