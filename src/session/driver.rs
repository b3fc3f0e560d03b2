//! Headless-browser login driver
//!
//! Drives a Chromium instance through the scripted login flow: navigate to
//! the login page, fill the credential fields, submit, wait for the
//! post-login page marker, then harvest every cookie from the browser.
//! The browser process is released on every exit path.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::time::Duration;
use tokio::time::timeout;

use super::{CookieJar, Credentials, LoginDriver};
use crate::error::AuthError;

const LOGIN_URL: &str = "https://www.linkedin.com/login";
const USERNAME_SELECTOR: &str = "#username";
const PASSWORD_SELECTOR: &str = "#password";
const SUBMIT_SELECTOR: &str = "button[type='submit']";

/// Element present only once the authenticated shell has rendered
const POST_LOGIN_MARKER: &str = "#global-nav";

/// Poll interval while waiting for the post-login marker
const MARKER_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Chromium-backed implementation of [`LoginDriver`]
pub struct ChromiumLoginDriver {
    headless: bool,
}

impl ChromiumLoginDriver {
    #[must_use]
    pub fn new(headless: bool) -> Self {
        Self { headless }
    }
}

#[async_trait]
impl LoginDriver for ChromiumLoginDriver {
    async fn login(
        &self,
        credentials: &Credentials,
        step_timeout: Duration,
    ) -> Result<CookieJar, AuthError> {
        let mut builder = BrowserConfig::builder();
        if !self.headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(AuthError::LoginFailed)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AuthError::LoginFailed(format!("browser launch: {e}")))?;

        // The handler loop must run for the CDP connection to make progress
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let result = run_login_flow(&browser, credentials, step_timeout).await;

        // Release the browser process regardless of how the flow ended
        if let Err(e) = browser.close().await {
            tracing::warn!(error = %e, "Failed to close login browser");
        }
        let _ = browser.wait().await;
        handler_task.abort();

        result
    }
}

/// The scripted login steps, separated so the driver can release the
/// browser on both the success and failure paths
async fn run_login_flow(
    browser: &Browser,
    credentials: &Credentials,
    step_timeout: Duration,
) -> Result<CookieJar, AuthError> {
    let page = bounded(step_timeout, "open login page", browser.new_page(LOGIN_URL)).await?;

    let username_field = bounded(
        step_timeout,
        "locate username field",
        page.find_element(USERNAME_SELECTOR),
    )
    .await?;
    bounded(
        step_timeout,
        "fill username",
        async {
            username_field.click().await?;
            username_field.type_str(&credentials.username).await
        },
    )
    .await?;

    let password_field = bounded(
        step_timeout,
        "locate password field",
        page.find_element(PASSWORD_SELECTOR),
    )
    .await?;
    bounded(
        step_timeout,
        "fill password",
        async {
            password_field.click().await?;
            password_field.type_str(&credentials.password).await
        },
    )
    .await?;

    let submit = bounded(
        step_timeout,
        "locate submit button",
        page.find_element(SUBMIT_SELECTOR),
    )
    .await?;
    bounded(step_timeout, "submit login form", submit.click()).await?;

    // The marker appears only after the authenticated redirect completes
    wait_for_marker(&page, step_timeout).await?;

    let cookies = page
        .get_cookies()
        .await
        .map_err(|e| AuthError::LoginFailed(format!("cookie harvest: {e}")))?;

    let mut jar = CookieJar::default();
    for cookie in cookies {
        jar.insert(cookie.name, cookie.value);
    }

    if jar.is_empty() {
        return Err(AuthError::LoginFailed(String::from(
            "login completed but no cookies were set",
        )));
    }

    Ok(jar)
}

/// Poll for the post-login marker until it appears or the bound elapses
async fn wait_for_marker(
    page: &chromiumoxide::Page,
    step_timeout: Duration,
) -> Result<(), AuthError> {
    let deadline = tokio::time::Instant::now() + step_timeout;

    loop {
        if page.find_element(POST_LOGIN_MARKER).await.is_ok() {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(AuthError::LoginFailed(String::from(
                "timed out waiting for post-login page",
            )));
        }
        tokio::time::sleep(MARKER_POLL_INTERVAL).await;
    }
}

/// Run one login step under a timeout, labelling failures with the step name
async fn bounded<T, E, F>(limit: Duration, step: &str, fut: F) -> Result<T, AuthError>
where
    E: std::fmt::Display,
    F: std::future::Future<Output = Result<T, E>>,
{
    match timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(AuthError::LoginFailed(format!("{step}: {e}"))),
        Err(_) => Err(AuthError::LoginFailed(format!("{step}: timed out"))),
    }
}
