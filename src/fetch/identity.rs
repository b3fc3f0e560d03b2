//! Rotated request identity
//!
//! Browser-like headers with a randomized User-Agent so consecutive attempts
//! do not present an identical fingerprint.

use rand::seq::SliceRandom;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, COOKIE, REFERER,
    USER_AGENT,
};

/// Pool of realistic User-Agent strings for rotation
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// Fixed referer presented with profile requests
const PROFILE_REFERER: &str = "https://www.linkedin.com/feed/";

/// Pick a random user agent from the pool
#[must_use]
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .unwrap_or(&USER_AGENTS[0])
}

/// Build browser-like headers for a profile page request
///
/// Sets a rotated User-Agent, fixed referer and Sec-Fetch metadata, and
/// attaches the session cookie header when one is available.
#[must_use]
pub fn build_profile_headers(cookie_header: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(random_user_agent()),
    );
    headers.insert(REFERER, HeaderValue::from_static(PROFILE_REFERER));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(
        ACCEPT_ENCODING,
        HeaderValue::from_static("gzip, deflate, br"),
    );

    // Sec-Fetch headers for modern browser compatibility
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("document"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-user"),
        HeaderValue::from_static("?1"),
    );
    headers.insert(
        HeaderName::from_static("upgrade-insecure-requests"),
        HeaderValue::from_static("1"),
    );

    if let Some(cookie) = cookie_header {
        if let Ok(value) = HeaderValue::from_str(cookie) {
            headers.insert(COOKIE, value);
        }
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_rotation() {
        let mut agents = std::collections::HashSet::new();
        for _ in 0..100 {
            let agent = random_user_agent();
            assert!(USER_AGENTS.contains(&agent));
            agents.insert(agent);
        }

        // With 100 draws over 4 agents, more than one should appear
        assert!(agents.len() > 1, "User agents should rotate");
    }

    #[test]
    fn test_profile_headers() {
        let headers = build_profile_headers(None);

        assert!(headers.contains_key(USER_AGENT));
        assert_eq!(
            headers.get(REFERER).unwrap(),
            HeaderValue::from_static(PROFILE_REFERER)
        );
        assert!(headers.contains_key(ACCEPT));
        assert!(headers.contains_key("sec-fetch-dest"));
        assert!(headers.contains_key("sec-fetch-mode"));
        assert!(headers.contains_key("sec-fetch-site"));
        assert!(headers.contains_key("upgrade-insecure-requests"));
        assert!(!headers.contains_key(COOKIE));
    }

    #[test]
    fn test_cookie_header_attached() {
        let headers = build_profile_headers(Some("li_at=tok; JSESSIONID=abc"));
        assert_eq!(
            headers.get(COOKIE).unwrap(),
            HeaderValue::from_static("li_at=tok; JSESSIONID=abc")
        );
    }
}
