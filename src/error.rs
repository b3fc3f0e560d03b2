//! Error types for the linkmark fetch subsystem
//!
//! Each concern gets its own enum; [`FetchError`] is the umbrella the
//! executor surfaces to callers, carrying the kind of the last failed
//! attempt so batch code can pattern-match instead of string-parsing.

use thiserror::Error;

/// Errors raised by the proxy pool
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// Every configured endpoint has been blacklisted
    #[error("all proxy endpoints are blacklisted")]
    Exhausted,
}

/// Errors raised while obtaining or refreshing a session
#[derive(Error, Debug)]
pub enum AuthError {
    /// No credentials configured in the environment
    #[error("no login credentials configured")]
    Unavailable,

    /// The automated login flow did not complete
    #[error("login failed: {0}")]
    LoginFailed(String),
}

/// Errors raised by the external CAPTCHA solving service
#[derive(Error, Debug)]
pub enum SolveError {
    /// No solver API key configured
    #[error("no CAPTCHA solver API key configured")]
    NoApiKey,

    /// Challenge submission was rejected or unreachable
    #[error("challenge submission failed: {0}")]
    SubmissionFailed(String),

    /// Poll ceiling reached without a token
    #[error("CAPTCHA solve timed out")]
    SolveTimeout,

    /// The service returned a terminal non-success result
    #[error("CAPTCHA solve rejected: {0}")]
    SolveRejected(String),

    /// Transport failure talking to the solving service
    #[error("solver request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors raised during profile extraction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// No strategy produced a non-empty name
    #[error("no parsable profile data in page")]
    NoProfileData,
}

/// Classification of the last failed attempt, carried by
/// [`FetchError::RetriesExhausted`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    RateLimited,
    Blocked,
    Captcha,
    Http(u16),
    Auth,
    Solve,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport => write!(f, "transport error"),
            Self::RateLimited => write!(f, "rate limited"),
            Self::Blocked => write!(f, "blocked"),
            Self::Captcha => write!(f, "captcha required"),
            Self::Http(status) => write!(f, "http status {status}"),
            Self::Auth => write!(f, "authentication failure"),
            Self::Solve => write!(f, "captcha solve failure"),
        }
    }
}

/// Errors surfaced by a fetch operation
#[derive(Error, Debug)]
pub enum FetchError {
    /// Non-retryable HTTP status
    #[error("permanent HTTP error: {0}")]
    Http(u16),

    /// Retry budget consumed without a successful response
    #[error("retries exhausted after {attempts} attempts, last failure: {last}")]
    RetriesExhausted { attempts: u32, last: FailureKind },

    /// Proxy pool failure
    #[error(transparent)]
    Proxy(#[from] ProxyError),

    /// Session refresh failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// CAPTCHA solving failure
    #[error(transparent)]
    Solve(#[from] SolveError),

    /// Page fetched but no extractable profile data
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Target URL failed validation
    #[error("invalid profile URL: {0}")]
    InvalidUrl(String),

    /// HTTP client construction failure
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl FetchError {
    /// True when the failure is worth retrying from the batch level
    /// (new session, fresh proxies); permanent statuses and invalid
    /// input are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Http(_) | Self::InvalidUrl(_) | Self::Extract(_))
    }
}
