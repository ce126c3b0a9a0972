//! Concurrent detection over many URLs.

use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};

use super::GtmDetector;
use crate::result::DetectionReport;

/// One line of batch output: the input URL plus its report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub url: String,
    #[serde(flatten)]
    pub report: DetectionReport,
}

/// Streams reports for `urls`, running up to `concurrency` detections at once.
///
/// Records are yielded in completion order. Each detection is independent.
pub fn scan_stream<'a, I>(
    detector: &'a GtmDetector,
    urls: I,
    concurrency: usize,
) -> impl Stream<Item = ScanRecord> + 'a
where
    I: IntoIterator<Item = String>,
    I::IntoIter: 'a,
{
    stream::iter(urls)
        .map(move |url| async move {
            let report = detector.detect(&url).await;
            ScanRecord { url, report }
        })
        .buffer_unordered(concurrency.max(1))
}

/// Runs detection over `urls` and collects the records in input order.
pub async fn detect_many(
    detector: &GtmDetector,
    urls: Vec<String>,
    concurrency: usize,
) -> Vec<ScanRecord> {
    let mut indexed: Vec<(usize, ScanRecord)> = stream::iter(urls.into_iter().enumerate())
        .map(|(index, url)| async move {
            let report = detector.detect(&url).await;
            (index, ScanRecord { url, report })
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, record)| record).collect()
}
