//! Dynamic (rendered page) detection.

use log::{debug, info};

use super::{BrowserEngine, BrowserPage, ObserveSpec, ObservedResponse};
use crate::config::{DetectorConfig, TRACKING_REQUEST_MARKERS};
use crate::detector::valid_id_count;
use crate::error_handling::DetectionError;
use crate::fetch::with_deadline;
use crate::parse::{find_container_ids, is_valid_container_id};
use crate::platform::extract_gtm_id;
use crate::result::{DetectionResult, EvidenceSource, NetworkRequest};

const RENDERED_BODY_SCRIPT: &str = "document.body ? document.body.outerHTML : ''";
/// Stringified so the array survives a by-reference evaluation.
const RUNTIME_CONTAINERS_SCRIPT: &str = "JSON.stringify(Object.keys(window.google_tag_manager || {}).filter(function (k) { return k.indexOf('GTM-') === 0; }))";

/// Renders `result.target_url()` in a browser and records what it observes.
///
/// Launch and navigation failures are logged to the evidence trail and are
/// not fatal. The page is closed on every path.
///
/// # Returns
///
/// The number of format-valid container IDs held by `result` afterwards.
pub async fn detect_dynamic(
    engine: &dyn BrowserEngine,
    result: &mut DetectionResult,
    config: &DetectorConfig,
) -> usize {
    let spec = ObserveSpec {
        body_markers: vec![config.relay.config_path.clone()],
    };
    let launched = with_deadline(
        "Browser launch",
        config.navigation_timeout,
        engine.launch(spec),
    )
    .await;
    let mut page = match launched {
        Ok(page) => page,
        Err(e) => {
            info!("Dynamic detection unavailable for {}: {e}", result.target_url());
            result.log(EvidenceSource::Browser, format!("Browser unavailable: {e}"));
            return valid_id_count(result);
        }
    };
    result.log(EvidenceSource::Browser, "Browser launched");

    if let Err(e) = observe(page.as_mut(), result, config).await {
        result.log(EvidenceSource::Browser, format!("Dynamic detection failed: {e}"));
    }
    // Late responses still count
    record_responses(page.take_responses(), result, config);

    if let Err(e) = page.close().await {
        debug!("Browser close for {} failed: {e}", result.target_url());
    }
    valid_id_count(result)
}

async fn observe(
    page: &mut dyn BrowserPage,
    result: &mut DetectionResult,
    config: &DetectorConfig,
) -> Result<(), DetectionError> {
    let url = result.target_url().to_string();
    with_deadline(
        "Navigation",
        config.navigation_timeout,
        page.navigate(&url, config.navigation_timeout),
    )
    .await?;
    tokio::time::sleep(config.settle_delay).await;
    result.log(EvidenceSource::Browser, format!("Rendered {url}"));

    record_responses(page.take_responses(), result, config);

    let body = page.evaluate(RENDERED_BODY_SCRIPT).await?;
    if let Some(markup) = body.as_str() {
        for id in find_container_ids(markup) {
            result.mark_present();
            if result.add_container_id(id.clone()) {
                result.log(
                    EvidenceSource::RenderedDom,
                    format!("Container ID {id} in rendered DOM"),
                );
            }
        }
    }

    match page.evaluate(RUNTIME_CONTAINERS_SCRIPT).await {
        Ok(value) => match runtime_container_keys(&value) {
            Ok(keys) => {
                for id in keys.iter().filter(|k| is_valid_container_id(k)) {
                    result.mark_present();
                    if result.add_container_id(id.as_str()) {
                        result.log(
                            EvidenceSource::RenderedDom,
                            format!("Container {id} registered at runtime"),
                        );
                    }
                }
            }
            Err(reason) => result.log(
                EvidenceSource::Browser,
                format!("Runtime container lookup unreadable: {reason}"),
            ),
        },
        Err(e) => debug!("Runtime container lookup failed on {url}: {e}"),
    }
    Ok(())
}

/// Decodes the JSON string produced by `RUNTIME_CONTAINERS_SCRIPT`.
fn runtime_container_keys(value: &serde_json::Value) -> Result<Vec<String>, String> {
    let serde_json::Value::String(encoded) = value else {
        return Err(format!("expected a JSON string, got {value}"));
    };
    serde_json::from_str::<Vec<String>>(encoded).map_err(|e| format!("{e} in {encoded:?}"))
}

/// Keeps tracking-related requests and reads relay configuration bodies.
fn record_responses(
    responses: Vec<ObservedResponse>,
    result: &mut DetectionResult,
    config: &DetectorConfig,
) {
    for response in responses {
        let lowered = response.url.to_ascii_lowercase();
        if TRACKING_REQUEST_MARKERS.iter().any(|m| lowered.contains(m)) {
            result.add_network_request(NetworkRequest {
                url: response.url.clone(),
                method: response.method.clone(),
                resource_type: response.resource_type.clone(),
                status: Some(response.status),
            });
        }

        if !response.url.contains(config.relay.config_path.as_str()) {
            continue;
        }
        let Some(body) = response.body.as_deref() else {
            continue;
        };
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(value) => match extract_gtm_id(&value) {
                Some(id) => {
                    result.mark_present();
                    result.add_container_id(id);
                    result.log(
                        EvidenceSource::BrowserNetwork,
                        format!("Relay configuration response {} names {id}", response.url),
                    );
                }
                None => result.log(
                    EvidenceSource::BrowserNetwork,
                    format!("Relay configuration response {} has no valid generate.gtm_id", response.url),
                ),
            },
            Err(e) => result.log(
                EvidenceSource::BrowserNetwork,
                format!("Malformed JSON from {}: {e}", response.url),
            ),
        }
    }
}
