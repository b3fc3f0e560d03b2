//! External CAPTCHA solving client
//!
//! Two-phase protocol against a 2Captcha-compatible service: submit the
//! challenge parameters for a job id, then poll the result endpoint on a
//! fixed interval up to a bounded number of attempts. A "not ready" reply
//! keeps polling; any other non-success reply is terminal. Submission
//! itself is never retried locally.

use serde::Deserialize;
use std::time::Duration;

use crate::config::CaptchaConfig;
use crate::error::SolveError;

/// The service's "keep polling" sentinel (their spelling)
const NOT_READY: &str = "CAPCHA_NOT_READY";

/// Wire format shared by the submit and poll endpoints
#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: u8,
    request: String,
}

/// Client for the external solving service
pub struct CaptchaResolver {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    poll_interval: Duration,
    max_polls: u32,
}

impl CaptchaResolver {
    /// Create a resolver from configuration
    ///
    /// # Errors
    ///
    /// Returns `SolveError::Http` if the HTTP client cannot be created.
    pub fn new(config: &CaptchaConfig) -> Result<Self, SolveError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            max_polls: config.max_polls,
        })
    }

    /// True when an API key is configured
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Solve a challenge and return the token
    ///
    /// # Errors
    ///
    /// `NoApiKey` without a configured key; `SubmissionFailed` when the
    /// submit phase is rejected; `SolveTimeout` when the poll ceiling is
    /// reached; `SolveRejected` on a terminal service error.
    pub async fn solve(&self, site_key: &str, page_url: &str) -> Result<String, SolveError> {
        let api_key = self.api_key.as_ref().ok_or(SolveError::NoApiKey)?;

        let job_id = self.submit(api_key, site_key, page_url).await?;
        tracing::info!(job_id = %job_id, "CAPTCHA challenge submitted, polling for token");

        self.poll(api_key, &job_id).await
    }

    /// Phase one: submit challenge parameters, obtain a job id
    async fn submit(
        &self,
        api_key: &str,
        site_key: &str,
        page_url: &str,
    ) -> Result<String, SolveError> {
        let response = self
            .client
            .post(format!("{}/in.php", self.api_url))
            .query(&[
                ("key", api_key),
                ("method", "userrecaptcha"),
                ("googlekey", site_key),
                ("pageurl", page_url),
                ("json", "1"),
            ])
            .send()
            .await?;

        let body: ApiResponse = response.json().await?;
        if body.status != 1 {
            return Err(SolveError::SubmissionFailed(body.request));
        }

        Ok(body.request)
    }

    /// Phase two: poll the result endpoint until a token, a terminal
    /// rejection, or the poll ceiling
    async fn poll(&self, api_key: &str, job_id: &str) -> Result<String, SolveError> {
        for attempt in 0..self.max_polls {
            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .client
                .get(format!("{}/res.php", self.api_url))
                .query(&[("key", api_key), ("action", "get"), ("id", job_id), ("json", "1")])
                .send()
                .await?;

            let body: ApiResponse = response.json().await?;

            if body.status == 1 {
                tracing::debug!(polls = attempt + 1, "CAPTCHA token received");
                return Ok(body.request);
            }

            if body.request != NOT_READY {
                return Err(SolveError::SolveRejected(body.request));
            }
        }

        Err(SolveError::SolveTimeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_url: &str, key: Option<&str>) -> CaptchaConfig {
        CaptchaConfig {
            api_url: api_url.to_string(),
            poll_interval_secs: 1,
            max_polls: 3,
            api_key: key.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_solve_without_key_fails() {
        let resolver = CaptchaResolver::new(&config("http://localhost:1", None)).unwrap();
        assert!(!resolver.is_configured());

        let err = resolver.solve("sitekey", "https://example.com").await.unwrap_err();
        assert!(matches!(err, SolveError::NoApiKey));
    }
}
