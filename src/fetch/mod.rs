//! Resilient fetch executor
//!
//! One fetch is a bounded loop of paced attempts. Each attempt builds a
//! fresh HTTP client around a randomly drawn healthy proxy (or a direct
//! connection when no proxies are configured), presents a rotated browser
//! identity plus the current session cookies, and classifies the response.
//! Retryable outcomes consume an attempt and back off on a strictly
//! increasing schedule; permanent statuses and typed subsystem failures
//! abort immediately.

pub mod classify;
pub mod identity;

use governor::{Quota, RateLimiter};
use rand::Rng;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::captcha::CaptchaResolver;
use crate::config::FetchConfig;
use crate::error::{AuthError, FailureKind, FetchError};
use crate::extract::ProfileExtractor;
use crate::models::ProfileRecord;
use crate::proxy::{ProxyEndpoint, ProxyPool};
use crate::session::SessionStore;

use classify::Outcome;

/// Header used to resubmit a request with a solved CAPTCHA token
const CAPTCHA_TOKEN_HEADER: &str = "x-captcha-token";

/// Retry delay schedule for one fetch
///
/// Grows linearly with the attempt index and never hands out a delay
/// shorter than the previous one, even when an outcome-specific floor
/// (Retry-After, block cooldown) stretched an earlier wait.
struct BackoffSchedule {
    base: Duration,
    last: Duration,
}

impl BackoffSchedule {
    fn new(base: Duration) -> Self {
        Self {
            base,
            last: Duration::ZERO,
        }
    }

    fn next(&mut self, attempt: u32, floor: Option<Duration>) -> Duration {
        let mut delay = self.base * attempt;
        if let Some(floor) = floor {
            delay = delay.max(floor);
        }
        delay = delay.max(self.last);
        self.last = delay;
        delay
    }
}

/// Executor for individual profile page fetches
pub struct FetchExecutor {
    proxies: Arc<ProxyPool>,
    session: Arc<SessionStore>,
    captcha: Option<Arc<CaptchaResolver>>,
    extractor: ProfileExtractor,
    pacer: governor::DefaultDirectRateLimiter,
    request_timeout: Duration,
    base_delay: Duration,
    base_backoff: Duration,
    blocked_backoff: (Duration, Duration),
    max_retries: u32,
}

impl FetchExecutor {
    pub fn new(
        config: &FetchConfig,
        proxies: Arc<ProxyPool>,
        session: Arc<SessionStore>,
        captcha: Option<Arc<CaptchaResolver>>,
    ) -> Self {
        // One request per base-delay period; validated config keeps this nonzero
        let quota = Quota::with_period(Duration::from_secs(config.base_delay_secs))
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::new(1).unwrap()));

        Self {
            proxies,
            session,
            captcha,
            extractor: ProfileExtractor::new(),
            pacer: RateLimiter::direct(quota),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            base_delay: Duration::from_secs(config.base_delay_secs),
            base_backoff: Duration::from_secs(config.base_backoff_secs),
            blocked_backoff: (
                Duration::from_secs(config.blocked_backoff_min_secs),
                Duration::from_secs(config.blocked_backoff_max_secs),
            ),
            max_retries: config.max_retries.max(1),
        }
    }

    /// Fetch a profile page and extract a structured record from it
    ///
    /// # Errors
    ///
    /// Everything [`fetch`](Self::fetch) can raise, plus
    /// [`FetchError::Extract`] when the page yields no profile data.
    pub async fn fetch_profile(&self, url: &str) -> Result<ProfileRecord, FetchError> {
        let body = self.fetch(url).await?;
        Ok(self.extractor.extract(&body, url)?)
    }

    /// Fetch one URL, returning the page body of the first successful attempt
    ///
    /// # Errors
    ///
    /// [`FetchError::Http`] for a permanent status, [`FetchError::Proxy`]
    /// once the pool is exhausted, and [`FetchError::RetriesExhausted`] when
    /// the attempt budget runs out; the latter carries the kind of the last
    /// failure.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut last_failure = FailureKind::Transport;
        let mut captcha_token: Option<String> = None;
        let mut schedule = BackoffSchedule::new(self.base_backoff);

        for attempt in 1..=self.max_retries {
            self.pace().await;

            let proxy = self.draw_proxy()?;
            let cookie_header = match self.session.cookies().await {
                Ok(jar) => Some(jar.header_value()),
                Err(AuthError::Unavailable) => None,
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Session refresh failed");
                    last_failure = FailureKind::Auth;
                    self.backoff(&mut schedule, attempt, None).await;
                    continue;
                }
            };

            let client = self.build_client(proxy.as_ref())?;
            let mut request = client
                .get(url)
                .headers(identity::build_profile_headers(cookie_header.as_deref()));
            if let Some(token) = &captcha_token {
                request = request.header(CAPTCHA_TOKEN_HEADER, token.as_str());
            }

            tracing::debug!(
                attempt,
                url = %url,
                proxy = ?proxy,
                "Fetching profile page"
            );

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    if let Some(p) = &proxy {
                        self.proxies.mark_bad(p);
                    }
                    tracing::warn!(attempt, error = %e, "Transport failure");
                    last_failure = FailureKind::Transport;
                    self.backoff(&mut schedule, attempt, None).await;
                    continue;
                }
            };

            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = match response.text().await {
                Ok(b) => b,
                Err(e) => {
                    if let Some(p) = &proxy {
                        self.proxies.mark_bad(p);
                    }
                    tracing::warn!(attempt, error = %e, "Failed to read response body");
                    last_failure = FailureKind::Transport;
                    self.backoff(&mut schedule, attempt, None).await;
                    continue;
                }
            };

            match classify::classify(status, &headers, &body) {
                Outcome::Success(body) => {
                    tracing::debug!(attempt, url = %url, "Fetch succeeded");
                    return Ok(body);
                }
                Outcome::RateLimited { retry_after } => {
                    tracing::warn!(
                        attempt,
                        retry_after_secs = retry_after.as_secs(),
                        "Rate limited"
                    );
                    last_failure = FailureKind::RateLimited;
                    self.backoff(&mut schedule, attempt, Some(retry_after)).await;
                }
                Outcome::Blocked { marker } => {
                    tracing::warn!(attempt, marker = %marker, "Challenge page detected");
                    if let Some(p) = &proxy {
                        self.proxies.mark_bad(p);
                    }
                    last_failure = FailureKind::Blocked;
                    self.backoff(&mut schedule, attempt, Some(self.blocked_delay())).await;
                }
                Outcome::CaptchaRequired { site_key } => {
                    last_failure = FailureKind::Captcha;
                    match (&self.captcha, site_key) {
                        (Some(resolver), Some(key)) if resolver.is_configured() => {
                            match resolver.solve(&key, url).await {
                                Ok(token) => {
                                    tracing::info!(attempt, "CAPTCHA solved, retrying with token");
                                    captcha_token = Some(token);
                                }
                                Err(e) => {
                                    tracing::warn!(attempt, error = %e, "CAPTCHA solve failed");
                                    last_failure = FailureKind::Solve;
                                }
                            }
                        }
                        _ => {
                            tracing::warn!(attempt, "CAPTCHA required but no solver available");
                        }
                    }
                    self.backoff(&mut schedule, attempt, None).await;
                }
                Outcome::HttpError(status) => {
                    if is_permanent(status) {
                        tracing::warn!(attempt, status, "Permanent HTTP error");
                        return Err(FetchError::Http(status));
                    }
                    tracing::warn!(attempt, status, "Retryable HTTP error");
                    last_failure = FailureKind::Http(status);
                    self.backoff(&mut schedule, attempt, None).await;
                }
            }
        }

        Err(FetchError::RetriesExhausted {
            attempts: self.max_retries,
            last: last_failure,
        })
    }

    /// Wait out the pacing window before an attempt: the rate limiter
    /// enforces the base inter-request floor, the jitter stretches the
    /// effective delay into [base, 1.5 * base]
    async fn pace(&self) {
        self.pacer.until_ready().await;

        let ceiling = self.base_delay.as_millis() as u64 / 2;
        if ceiling > 0 {
            let jitter = rand::thread_rng().gen_range(0..=ceiling);
            tokio::time::sleep(Duration::from_millis(jitter)).await;
        }
    }

    /// Sleep before the next attempt, honoring the outcome-specific floor
    /// (Retry-After, block cooldown); consecutive waits never shrink
    async fn backoff(&self, schedule: &mut BackoffSchedule, attempt: u32, floor: Option<Duration>) {
        if attempt >= self.max_retries {
            return;
        }

        let delay = schedule.next(attempt, floor);
        tracing::debug!(attempt, delay_secs = delay.as_secs(), "Backing off");
        tokio::time::sleep(delay).await;
    }

    /// Randomized cooldown applied after a challenge page
    fn blocked_delay(&self) -> Duration {
        let (min, max) = self.blocked_backoff;
        if max <= min {
            return min;
        }
        let span = (max - min).as_millis() as u64;
        min + Duration::from_millis(rand::thread_rng().gen_range(0..=span))
    }

    /// Draw a healthy proxy, or `None` for a direct connection when no
    /// endpoints are configured at all
    fn draw_proxy(&self) -> Result<Option<ProxyEndpoint>, FetchError> {
        if self.proxies.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.proxies.acquire()?))
    }

    /// Per-attempt client so proxy rotation applies to every request
    fn build_client(&self, proxy: Option<&ProxyEndpoint>) -> Result<reqwest::Client, FetchError> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .gzip(true)
            .redirect(reqwest::redirect::Policy::limited(5));

        if let Some(endpoint) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(endpoint.url())?);
        }

        Ok(builder.build()?)
    }
}

/// Statuses that no amount of retrying, proxy rotation or re-login will fix
fn is_permanent(status: u16) -> bool {
    matches!(status, 400 | 401 | 404 | 410)
}
