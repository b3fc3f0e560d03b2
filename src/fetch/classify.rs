//! Response classification
//!
//! A total, deterministic function from a raw HTTP response to an
//! [`Outcome`]. Transport failures never reach this point; they are handled
//! separately by the executor. The decision order matters: rate limiting is
//! checked before the captcha marker because it is cheaper to recover from.

use regex::Regex;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use std::sync::OnceLock;
use std::time::Duration;

/// LinkedIn's legacy "soft block" status, treated like a 429
pub const SOFT_BLOCK_STATUS: u16 = 999;

/// Applied when a rate-limited response carries no usable Retry-After
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(10);

/// Case-insensitive body marker for an anti-automation challenge page
const BLOCK_MARKER: &str = "security check";

/// Case-insensitive body marker for an explicit CAPTCHA challenge
const CAPTCHA_MARKER: &str = "captcha";

/// Classified result of one HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 200 response with no challenge markers; carries the body
    Success(String),

    /// Service-issued throttle (429 or soft-block status)
    RateLimited { retry_after: Duration },

    /// Heuristic detection of an anti-automation challenge page
    Blocked { marker: String },

    /// Explicit CAPTCHA challenge, with the site key when present in markup
    CaptchaRequired { site_key: Option<String> },

    /// Any other non-200 status
    HttpError(u16),
}

/// Classify a response by status, headers and body text
///
/// Decision order (first match wins): rate limiting, block marker, captcha
/// marker, non-200 status, success. The substring markers can false-positive
/// on pages that merely mention those words; that trade-off is accepted in
/// exchange for working across markup variants.
#[must_use]
pub fn classify(status: u16, headers: &HeaderMap, body: &str) -> Outcome {
    if status == 429 || status == SOFT_BLOCK_STATUS {
        return Outcome::RateLimited {
            retry_after: retry_after(headers),
        };
    }

    let lower = body.to_lowercase();

    if lower.contains(BLOCK_MARKER) {
        return Outcome::Blocked {
            marker: BLOCK_MARKER.to_string(),
        };
    }

    if lower.contains(CAPTCHA_MARKER) {
        return Outcome::CaptchaRequired {
            site_key: extract_site_key(body),
        };
    }

    if status != 200 {
        return Outcome::HttpError(status);
    }

    Outcome::Success(body.to_string())
}

/// Parse the Retry-After header as whole seconds, falling back to the
/// default when absent or unparsable (HTTP-date form included)
fn retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(DEFAULT_RETRY_AFTER, Duration::from_secs)
}

/// Pull a `data-sitekey` attribute out of challenge markup, if present
fn extract_site_key(body: &str) -> Option<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern =
        PATTERN.get_or_init(|| Regex::new(r#"data-sitekey=["']([\w-]+)["']"#).unwrap());

    pattern
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
