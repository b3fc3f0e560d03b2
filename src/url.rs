//! Profile URL extraction, validation and normalization
//!
//! Handles the input side of a batch: scanning free text for LinkedIn
//! profile URLs, validating candidates, and normalizing them by stripping
//! tracking query parameters while preserving the rest of the query in its
//! original order.

use regex::Regex;
use std::collections::HashSet;
use url::Url;

use crate::error::FetchError;

/// Expected host suffix for all target URLs
const PROFILE_DOMAIN: &str = "linkedin.com";

/// First path segments that mark a profile page
const PROFILE_PATH_MARKERS: &[&str] = &["in", "pub"];

/// Query parameters stripped during normalization. LinkedIn appends these
/// for click tracking; they carry no addressing information.
const TRACKING_PARAMS: &[&str] = &[
    "trk",
    "trackingId",
    "original_referer",
    "originalSubdomain",
    "refId",
    "lipi",
    "midToken",
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_content",
    "utm_term",
];

/// Profile URL extractor and normalizer
pub struct UrlExtractor {
    /// Pattern for profile URLs embedded in arbitrary text
    profile_pattern: Regex,
}

impl UrlExtractor {
    /// Create a new URL extractor with compiled patterns
    #[must_use]
    pub fn new() -> Self {
        Self {
            // Matches linkedin.com/in/... with or without scheme/www
            profile_pattern: Regex::new(
                r#"(?:https?://)?(?:[\w-]+\.)?linkedin\.com/(?:in|pub)/[^\s"'<>)\]]+"#,
            )
            .unwrap(),
        }
    }

    /// Extract profile URLs from free text
    ///
    /// Scans arbitrary text (notes, exported messages, HTML) for LinkedIn
    /// profile URLs, normalizes each hit and returns a deduplicated,
    /// sorted vector.
    pub fn extract_urls(&self, text: &str) -> Vec<String> {
        let mut urls = HashSet::new();

        for m in self.profile_pattern.find_iter(text) {
            // Trailing sentence punctuation is not part of the URL
            let hit = m.as_str().trim_end_matches(['.', ',', ';', ':']);
            if let Ok(normalized) = self.normalize(hit) {
                urls.insert(normalized);
            }
        }

        let mut result: Vec<String> = urls.into_iter().collect();
        result.sort();
        result
    }

    /// Normalize a profile URL
    ///
    /// Ensures an https scheme, validates host and path, strips tracking
    /// query parameters by denylist and re-joins the remaining query pairs
    /// in their original order.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] when the candidate does not look
    /// like a profile URL.
    pub fn normalize(&self, raw: &str) -> Result<String, FetchError> {
        let candidate = raw.trim().trim_end_matches('/');
        let with_scheme = if candidate.starts_with("http://") || candidate.starts_with("https://") {
            candidate.to_string()
        } else {
            format!("https://{candidate}")
        };

        let mut parsed = Url::parse(&with_scheme)
            .map_err(|e| FetchError::InvalidUrl(format!("{raw}: {e}")))?;

        if !self.is_valid_profile_url(&parsed) {
            return Err(FetchError::InvalidUrl(raw.to_string()));
        }

        // Drop the fragment and rebuild the query without tracking params,
        // keeping surviving pairs in their original order.
        parsed.set_fragment(None);
        let kept: Vec<(String, String)> = parsed
            .query_pairs()
            .filter(|(k, _)| !TRACKING_PARAMS.contains(&k.as_ref()))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            parsed.set_query(None);
        } else {
            let query = kept
                .iter()
                .map(|(k, v)| {
                    if v.is_empty() {
                        k.clone()
                    } else {
                        format!("{k}={v}")
                    }
                })
                .collect::<Vec<_>>()
                .join("&");
            parsed.set_query(Some(&query));
        }

        let mut normalized = parsed.to_string();
        if normalized.ends_with('/') {
            normalized.pop();
        }
        Ok(normalized)
    }

    /// Validate a parsed URL as a profile page address
    ///
    /// Requires a host under the expected domain, a known profile path
    /// marker as the first segment, and more than one path segment.
    fn is_valid_profile_url(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        if host != PROFILE_DOMAIN && !host.ends_with(&format!(".{PROFILE_DOMAIN}")) {
            return false;
        }

        let segments: Vec<&str> = match url.path_segments() {
            Some(s) => s.filter(|s| !s.is_empty()).collect(),
            None => return false,
        };

        segments.len() > 1 && PROFILE_PATH_MARKERS.contains(&segments[0])
    }

    /// Derive a display name from the profile slug
    ///
    /// `linkedin.com/in/jane-doe` yields `"Jane Doe"`. Used as a last-resort
    /// record when the page itself could not be fetched.
    pub fn name_from_slug(&self, url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        let segments: Vec<&str> = parsed.path_segments()?.filter(|s| !s.is_empty()).collect();
        if segments.len() < 2 || !PROFILE_PATH_MARKERS.contains(&segments[0]) {
            return None;
        }

        let slug = segments[1];
        let name = slug
            .split('-')
            .filter(|w| !w.is_empty() && !w.chars().all(|c| c.is_ascii_digit()))
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" ");

        (!name.is_empty()).then_some(name)
    }
}

impl Default for UrlExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_params_stripped() {
        let extractor = UrlExtractor::new();
        let normalized = extractor.normalize("linkedin.com/in/jane-doe?trk=x").unwrap();
        assert_eq!(normalized, "https://linkedin.com/in/jane-doe");
    }

    #[test]
    fn test_non_tracking_query_preserved_in_order() {
        let extractor = UrlExtractor::new();
        let normalized = extractor
            .normalize("https://www.linkedin.com/in/jane-doe?b=2&trk=x&a=1")
            .unwrap();
        assert_eq!(normalized, "https://www.linkedin.com/in/jane-doe?b=2&a=1");
    }

    #[test]
    fn test_scheme_added_and_fragment_dropped() {
        let extractor = UrlExtractor::new();
        let normalized = extractor
            .normalize("www.linkedin.com/in/jane-doe#section")
            .unwrap();
        assert_eq!(normalized, "https://www.linkedin.com/in/jane-doe");
    }

    #[test]
    fn test_rejects_foreign_host() {
        let extractor = UrlExtractor::new();
        assert!(extractor.normalize("https://example.com/in/jane-doe").is_err());
        assert!(extractor
            .normalize("https://notlinkedin.com.evil.org/in/jane")
            .is_err());
    }

    #[test]
    fn test_rejects_non_profile_path() {
        let extractor = UrlExtractor::new();
        assert!(extractor.normalize("https://linkedin.com/feed/update/1").is_err());
        // Marker alone, only one segment
        assert!(extractor.normalize("https://linkedin.com/in").is_err());
    }

    #[test]
    fn test_extract_urls_from_text() {
        let extractor = UrlExtractor::new();
        let text = r#"
            Check out https://www.linkedin.com/in/jane-doe?trk=share and
            also linkedin.com/in/john-smith. Not this: https://example.com/in/x
        "#;
        let urls = extractor.extract_urls(text);
        assert_eq!(
            urls,
            vec![
                "https://linkedin.com/in/john-smith",
                "https://www.linkedin.com/in/jane-doe",
            ]
        );
    }

    #[test]
    fn test_name_from_slug() {
        let extractor = UrlExtractor::new();
        assert_eq!(
            extractor.name_from_slug("https://linkedin.com/in/jane-doe"),
            Some(String::from("Jane Doe"))
        );
        // Numeric disambiguation suffixes are dropped
        assert_eq!(
            extractor.name_from_slug("https://linkedin.com/in/jane-doe-12345"),
            Some(String::from("Jane Doe"))
        );
        assert_eq!(extractor.name_from_slug("https://linkedin.com/feed"), None);
    }
}
