//! Configuration management for linkmark
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files. Secrets (login credentials, solver API key) are
//! only ever read from the process environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Fetch subsystem configuration
    pub fetch: FetchConfig,

    /// Session/login configuration
    pub session: SessionConfig,

    /// CAPTCHA solving service configuration
    pub captcha: CaptchaConfig,

    /// Batch processing configuration
    pub batch: BatchConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Fetch executor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Base inter-request pacing delay in seconds; the actual delay is
    /// randomized within [base, 1.5 * base]
    pub base_delay_secs: u64,

    /// Maximum attempts per fetch
    pub max_retries: u32,

    /// Base retry backoff in seconds, scaled linearly with the attempt index
    pub base_backoff_secs: u64,

    /// Lower bound of the randomized sleep after a blocked response, seconds
    pub blocked_backoff_min_secs: u64,

    /// Upper bound of the randomized sleep after a blocked response, seconds
    pub blocked_backoff_max_secs: u64,

    /// Proxy endpoints as host:port strings; empty means direct connections
    pub proxies: Vec<String>,
}

/// Session refresh configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session validity window in seconds
    pub ttl_secs: u64,

    /// Bound on each wait step of the automated login flow, in seconds
    pub login_timeout_secs: u64,

    /// Run the login browser headless
    pub headless: bool,

    /// Account identifier, from LINKEDIN_USERNAME
    #[serde(skip)]
    pub username: Option<String>,

    /// Account secret, from LINKEDIN_PASSWORD
    #[serde(skip)]
    pub password: Option<String>,
}

/// CAPTCHA solving service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptchaConfig {
    /// Solving service endpoint
    pub api_url: String,

    /// Poll interval in seconds
    pub poll_interval_secs: u64,

    /// Maximum number of result polls before giving up
    pub max_polls: u32,

    /// API key, from CAPTCHA_API_KEY
    #[serde(skip)]
    pub api_key: Option<String>,
}

/// Batch processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Consecutive per-URL failures that abort the whole batch
    pub max_consecutive_failures: u32,

    /// Accumulate per-URL failures and continue instead of aborting on the
    /// first one; the consecutive-failure breaker still applies
    pub skip_errors: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 25,
            base_delay_secs: 4,
            max_retries: 3,
            base_backoff_secs: 5,
            blocked_backoff_min_secs: 30,
            blocked_backoff_max_secs: 60,
            proxies: Vec::new(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            login_timeout_secs: 30,
            headless: true,
            username: None,
            password: None,
        }
    }
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            api_url: String::from("https://2captcha.com"),
            poll_interval_secs: 6,
            max_polls: 30,
            api_key: None,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_consecutive_failures: 5,
            skip_errors: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = env_parse::<u64>("LINKMARK_REQUEST_TIMEOUT") {
            config.fetch.request_timeout_secs = v;
        }
        if let Some(v) = env_parse::<u64>("LINKMARK_BASE_DELAY") {
            config.fetch.base_delay_secs = v;
        }
        if let Some(v) = env_parse::<u32>("LINKMARK_MAX_RETRIES") {
            config.fetch.max_retries = v;
        }
        if let Ok(list) = std::env::var("LINKMARK_PROXIES") {
            config.fetch.proxies = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = env_parse::<u64>("LINKMARK_SESSION_TTL") {
            config.session.ttl_secs = v;
        }
        if let Some(v) = env_parse::<u32>("LINKMARK_MAX_CONSECUTIVE_FAILURES") {
            config.batch.max_consecutive_failures = v;
        }
        if let Ok(v) = std::env::var("LINKMARK_LOG_LEVEL") {
            config.logging.level = v;
        }
        if let Ok(v) = std::env::var("LINKMARK_LOG_FORMAT") {
            config.logging.format = v;
        }

        config.load_secrets();
        Ok(config)
    }

    /// Load configuration from a TOML file, then overlay secrets from the
    /// environment
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        config.load_secrets();
        Ok(config)
    }

    /// Pull secrets from the process environment
    fn load_secrets(&mut self) {
        self.session.username = std::env::var("LINKEDIN_USERNAME").ok();
        self.session.password = std::env::var("LINKEDIN_PASSWORD").ok();
        self.captcha.api_key = std::env::var("CAPTCHA_API_KEY").ok();
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.fetch.max_retries == 0 {
            anyhow::bail!("max_retries must be greater than 0");
        }

        if self.fetch.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if self.fetch.base_delay_secs == 0 {
            anyhow::bail!("base_delay_secs must be greater than 0");
        }

        if self.fetch.blocked_backoff_min_secs > self.fetch.blocked_backoff_max_secs {
            anyhow::bail!("blocked_backoff_min_secs must not exceed blocked_backoff_max_secs");
        }

        if self.batch.max_consecutive_failures == 0 {
            anyhow::bail!("max_consecutive_failures must be greater than 0");
        }

        if self.captcha.poll_interval_secs == 0 || self.captcha.max_polls == 0 {
            anyhow::bail!("captcha poll settings must be greater than 0");
        }

        for proxy in &self.fetch.proxies {
            if proxy.rsplit_once(':').and_then(|(host, port)| {
                (!host.is_empty()).then(|| port.parse::<u16>().ok()).flatten()
            }).is_none()
            {
                anyhow::bail!("invalid proxy endpoint (expected host:port): {proxy}");
            }
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.request_timeout_secs)
    }

    /// Get session TTL as Duration
    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session.ttl_secs)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_retries_rejected() {
        let mut config = Config::default();
        config.fetch.max_retries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_proxy_rejected() {
        let mut config = Config::default();
        config.fetch.proxies = vec![String::from("not-a-proxy")];
        assert!(config.validate().is_err());

        config.fetch.proxies = vec![String::from("10.0.0.1:8080")];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_request_timeout_conversion() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(25));
        assert_eq!(config.session_ttl(), Duration::from_secs(3600));
    }
}
