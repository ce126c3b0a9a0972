//! URL list input.

use std::path::Path;

use tokio::io::{AsyncBufReadExt, BufReader};

/// Reads one URL per line from `path`.
///
/// Blank lines and lines starting with `#` are skipped; surrounding whitespace
/// is trimmed. Validation happens later, per URL, so malformed entries still
/// produce a report.
///
/// # Errors
///
/// Returns the I/O error if the file cannot be opened or read.
pub async fn read_url_list(path: &Path) -> std::io::Result<Vec<String>> {
    let file = tokio::fs::File::open(path).await?;
    let mut lines = BufReader::new(file).lines();
    let mut urls = Vec::new();
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        urls.push(trimmed.to_string());
    }
    Ok(urls)
}
