//! URL validation and normalization utilities.

use log::warn;

use crate::config::MAX_URL_LENGTH;
use crate::error_handling::DetectionError;

/// Validates and normalizes a target URL.
///
/// Adds an `https://` prefix if missing, then validates that the URL is
/// syntactically valid, has a host and uses the http/https scheme. URLs longer
/// than `MAX_URL_LENGTH` are rejected.
///
/// # Arguments
///
/// * `url` - The URL string to validate and normalize
///
/// # Errors
///
/// Returns `DetectionError::InvalidUrl` describing why the URL was rejected.
pub fn validate_and_normalize_url(url: &str) -> Result<String, DetectionError> {
    let normalized = if !url.starts_with("http://") && !url.starts_with("https://") {
        format!("https://{url}")
    } else {
        url.to_string()
    };

    // Checked after the prefix is added so the limit applies to what is fetched
    if normalized.len() > MAX_URL_LENGTH {
        let preview: String = normalized.chars().take(50).collect();
        warn!(
            "Rejecting URL exceeding maximum length ({} > {}): {preview}...",
            normalized.len(),
            MAX_URL_LENGTH
        );
        return Err(DetectionError::InvalidUrl(format!(
            "URL exceeds {MAX_URL_LENGTH} characters"
        )));
    }

    match url::Url::parse(&normalized) {
        Ok(parsed) => match parsed.scheme() {
            "http" | "https" if parsed.host_str().is_some_and(|h| !h.is_empty()) => Ok(normalized),
            "http" | "https" => Err(DetectionError::InvalidUrl(format!("{url} has no host"))),
            scheme => Err(DetectionError::InvalidUrl(format!(
                "unsupported scheme {scheme} in {url}"
            ))),
        },
        Err(e) => {
            warn!("Rejecting invalid URL {url:?}: {e}");
            Err(DetectionError::InvalidUrl(format!("{url}: {e}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::validate_and_normalize_url;

    fn normalized(url: &str) -> Option<String> {
        validate_and_normalize_url(url).ok()
    }

    #[test]
    fn test_validate_and_normalize_url_adds_https() {
        assert_eq!(normalized("example.com"), Some("https://example.com".to_string()));
    }

    #[test]
    fn test_validate_and_normalize_url_preserves_scheme() {
        assert_eq!(normalized("https://example.com"), Some("https://example.com".to_string()));
        assert_eq!(normalized("http://example.com"), Some("http://example.com".to_string()));
    }

    #[test]
    fn test_validate_and_normalize_url_rejects_invalid_url() {
        let err = validate_and_normalize_url("not a valid url!!!").expect_err("rejected");
        assert!(err.to_string().starts_with("Invalid URL"));
    }

    #[test]
    fn test_validate_and_normalize_url_with_path_and_port() {
        assert_eq!(
            normalized("example.com/path?query=value"),
            Some("https://example.com/path?query=value".to_string())
        );
        assert_eq!(normalized("example.com:8080"), Some("https://example.com:8080".to_string()));
    }

    #[test]
    fn test_validate_and_normalize_url_ipv6() {
        assert_eq!(normalized("http://[2001:db8::1]"), Some("http://[2001:db8::1]".to_string()));
        assert_eq!(normalized("[2001:db8::1]"), Some("https://[2001:db8::1]".to_string()));
    }

    #[test]
    fn test_validate_and_normalize_url_edge_cases() {
        assert_eq!(normalized(""), None);
        assert_eq!(normalized("   "), None);
        assert_eq!(normalized("https://"), None);
        assert_eq!(normalized("://example.com"), None);
    }

    #[test]
    fn test_validate_and_normalize_url_rejects_too_long_url() {
        let long_url = format!("https://example.com/{}", "a".repeat(2100));
        assert_eq!(normalized(&long_url), None);
    }

    #[test]
    fn test_validate_and_normalize_url_accepts_url_at_limit() {
        // "https://example.com/" is 20 chars
        let url_at_limit = format!("https://example.com/{}", "a".repeat(2028));
        assert_eq!(url_at_limit.len(), 2048);
        assert!(normalized(&url_at_limit).is_some());
    }

    #[test]
    fn test_validate_and_normalize_url_rejects_too_long_url_after_normalization() {
        let url = format!("example.com/{}", "a".repeat(2030));
        assert!(url.len() <= 2048);
        assert_eq!(normalized(&url), None);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for url in ["shop.example", "http://a.example/x", "www.example.com/p?q=1"] {
            let once = normalized(url).expect("valid");
            assert_eq!(normalized(&once), Some(once.clone()));
        }
    }
}
