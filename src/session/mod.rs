//! Session and cookie lifecycle
//!
//! [`SessionStore`] owns the authenticated cookie jar and refreshes it
//! through a [`LoginDriver`] when it is absent or older than its TTL. An
//! expired session is replaced wholesale, never mutated. Refresh failures
//! propagate to the caller; the store never retries a login on its own.

pub mod driver;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::config::SessionConfig;
use crate::error::AuthError;

/// Login credentials sourced from the environment
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Build from configuration; `None` when either secret is missing
    pub fn from_config(config: &SessionConfig) -> Option<Self> {
        match (&config.username, &config.password) {
            (Some(username), Some(password)) => Some(Self {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}

/// Ordered cookie set with unique names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<(String, String)>,
}

impl CookieJar {
    /// Insert a cookie, replacing any existing value for the same name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.cookies.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.cookies.push((name, value));
        }
    }

    /// Look up a cookie value by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Render as a `Cookie:` request header value
    #[must_use]
    pub fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|(n, v)| format!("{n}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Narrow capability interface: authenticate and harvest cookies
///
/// Keeps the browser-automation technology swappable and the store testable
/// without a real browser. Implementations must release any driver resources
/// (browser processes) on every exit path.
#[async_trait]
pub trait LoginDriver: Send + Sync {
    async fn login(
        &self,
        credentials: &Credentials,
        step_timeout: Duration,
    ) -> Result<CookieJar, AuthError>;
}

/// One authenticated session
struct Session {
    jar: CookieJar,
    created: Instant,
}

/// Owner of the current session, refreshing it on expiry
pub struct SessionStore {
    driver: Arc<dyn LoginDriver>,
    credentials: Option<Credentials>,
    ttl: Duration,
    step_timeout: Duration,
    current: Mutex<Option<Session>>,
}

impl SessionStore {
    pub fn new(driver: Arc<dyn LoginDriver>, config: &SessionConfig) -> Self {
        Self {
            driver,
            credentials: Credentials::from_config(config),
            ttl: Duration::from_secs(config.ttl_secs),
            step_timeout: Duration::from_secs(config.login_timeout_secs),
            current: Mutex::new(None),
        }
    }

    /// True when login credentials are configured
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Current cookie jar, refreshing via the login driver when the session
    /// is absent or expired
    ///
    /// # Errors
    ///
    /// [`AuthError::Unavailable`] when no credentials are configured;
    /// [`AuthError::LoginFailed`] when the login flow does not complete.
    pub async fn cookies(&self) -> Result<CookieJar, AuthError> {
        let mut current = self.current.lock().await;

        if let Some(session) = current.as_ref() {
            if session.created.elapsed() < self.ttl {
                return Ok(session.jar.clone());
            }
            tracing::info!(
                age_secs = session.created.elapsed().as_secs(),
                "Session expired, refreshing"
            );
        }

        let credentials = self.credentials.as_ref().ok_or(AuthError::Unavailable)?;

        let jar = self.driver.login(credentials, self.step_timeout).await?;
        tracing::info!(cookies = jar.len(), "Session refreshed");

        *current = Some(Session {
            jar: jar.clone(),
            created: Instant::now(),
        });

        Ok(jar)
    }
}
