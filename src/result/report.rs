//! Serialized detection output.

use serde::{Deserialize, Serialize};

use super::NetworkRequest;

/// JSON shape of a finished detection.
///
/// Field names are fixed: the scan-persistence layer stores this object as-is
/// and derives container counts from `containerIDs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    #[serde(rename = "isGTMPresent")]
    pub is_gtm_present: bool,
    /// Validated, deduplicated, first-seen order
    #[serde(rename = "containerIDs")]
    pub container_ids: Vec<String>,
    pub detection_methods: Vec<String>,
    pub data_layer_events: Vec<serde_json::Value>,
    pub scripts_found: Vec<String>,
    /// Only populated when the browser strategy ran
    pub network_requests: Vec<NetworkRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
