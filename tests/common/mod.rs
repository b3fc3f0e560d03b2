//! Common test utilities

use std::sync::Arc;

use linkmark::captcha::CaptchaResolver;
use linkmark::config::{FetchConfig, SessionConfig};
use linkmark::fetch::FetchExecutor;
use linkmark::proxy::ProxyPool;
use linkmark::session::{driver::ChromiumLoginDriver, SessionStore};

/// Fetch configuration with short delays suitable for mock servers
#[allow(dead_code)]
pub fn fetch_config(max_retries: u32) -> FetchConfig {
    FetchConfig {
        request_timeout_secs: 5,
        base_delay_secs: 1,
        max_retries,
        base_backoff_secs: 1,
        blocked_backoff_min_secs: 1,
        blocked_backoff_max_secs: 1,
        proxies: Vec::new(),
    }
}

/// Executor wired for direct connections and no credentials, so requests go
/// out cookie-less and no browser is ever launched
#[allow(dead_code)]
pub fn executor(config: &FetchConfig, captcha: Option<Arc<CaptchaResolver>>) -> FetchExecutor {
    let session_config = SessionConfig {
        ttl_secs: 3600,
        login_timeout_secs: 1,
        headless: true,
        username: None,
        password: None,
    };

    let proxies = Arc::new(ProxyPool::new(&config.proxies));
    let driver = Arc::new(ChromiumLoginDriver::new(true));
    let session = Arc::new(SessionStore::new(driver, &session_config));

    FetchExecutor::new(config, proxies, session, captcha)
}
