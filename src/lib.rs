//! linkmark - Resilient LinkedIn profile bookmarker
//!
//! Fetches LinkedIn profile pages despite rate limiting, soft blocks and
//! CAPTCHA challenges, extracts structured person records from them, and
//! writes the result as an importable Netscape bookmark file.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`url`] - Profile URL extraction, validation and normalization
//! - [`proxy`] - Proxy pool with health tracking
//! - [`session`] - Session/cookie lifecycle and browser-automation login
//! - [`fetch`] - The paced, classifying, retrying fetch executor
//! - [`captcha`] - External CAPTCHA solving client
//! - [`extract`] - Multi-strategy profile page extraction
//! - [`runner`] - Serial batch processing with a failure breaker
//! - [`bookmark`] - Netscape bookmark file output
//!
//! # Example
//!
//! ```no_run
//! use linkmark::config::Config;
//! use linkmark::fetch::FetchExecutor;
//! use linkmark::proxy::ProxyPool;
//! use linkmark::session::{driver::ChromiumLoginDriver, SessionStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let proxies = Arc::new(ProxyPool::new(&config.fetch.proxies));
//!     let driver = Arc::new(ChromiumLoginDriver::new(config.session.headless));
//!     let session = Arc::new(SessionStore::new(driver, &config.session));
//!     let executor = FetchExecutor::new(&config.fetch, proxies, session, None);
//!     let body = executor.fetch("https://www.linkedin.com/in/someone").await?;
//!     println!("{} bytes", body.len());
//!     Ok(())
//! }
//! ```

pub mod bookmark;
pub mod captcha;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod proxy;
pub mod runner;
pub mod session;
pub mod url;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::captcha::CaptchaResolver;
    pub use crate::config::Config;
    pub use crate::error::{FailureKind, FetchError};
    pub use crate::extract::ProfileExtractor;
    pub use crate::fetch::FetchExecutor;
    pub use crate::models::ProfileRecord;
    pub use crate::proxy::ProxyPool;
    pub use crate::runner::{BatchReport, BatchRunner};
    pub use crate::session::SessionStore;
    pub use crate::url::UrlExtractor;
}
