//! Serial batch processing with a consecutive-failure breaker
//!
//! URLs are processed strictly one at a time so the pacing and backoff
//! behaviour of the executor stays meaningful. A run stops early when the
//! first failure occurs (default mode) or when too many URLs fail in a row
//! (always, even in skip-errors mode): a long unbroken failure streak means
//! the account or egress path is burned and continuing only digs deeper.

use std::sync::Arc;

use crate::config::BatchConfig;
use crate::error::FetchError;
use crate::fetch::FetchExecutor;
use crate::models::ProfileRecord;
use crate::url::UrlExtractor;

/// Why a batch stopped before its last URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Abort {
    /// First failure in fail-fast mode
    FirstFailure,

    /// The consecutive-failure ceiling was reached
    ConsecutiveFailures(u32),
}

impl std::fmt::Display for Abort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstFailure => write!(f, "aborted on first failure"),
            Self::ConsecutiveFailures(n) => {
                write!(f, "aborted after {n} consecutive failures")
            }
        }
    }
}

/// One failed URL with a human-readable reason
#[derive(Debug, Clone)]
pub struct Failure {
    pub url: String,
    pub reason: String,
}

/// Result of one batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Successfully built records, in input order
    pub records: Vec<ProfileRecord>,

    /// Per-URL failures, in input order
    pub failures: Vec<Failure>,

    /// URLs never attempted because the run stopped early
    pub skipped: Vec<String>,

    /// Set when the run stopped before its last URL
    pub aborted: Option<Abort>,
}

impl BatchReport {
    /// True when every input URL produced a record
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.aborted.is_none()
    }
}

/// Serial driver for a list of profile URLs
pub struct BatchRunner {
    executor: Arc<FetchExecutor>,
    urls: UrlExtractor,
    max_consecutive_failures: u32,
    skip_errors: bool,
}

impl BatchRunner {
    pub fn new(config: &BatchConfig, executor: Arc<FetchExecutor>) -> Self {
        Self {
            executor,
            urls: UrlExtractor::new(),
            max_consecutive_failures: config.max_consecutive_failures.max(1),
            skip_errors: config.skip_errors,
        }
    }

    /// Process the given URLs in order and collect a report
    ///
    /// Never returns an error: failures are part of the report, and an early
    /// stop is recorded as [`BatchReport::aborted`] with the untouched URLs
    /// in [`BatchReport::skipped`].
    pub async fn run(&self, inputs: &[String]) -> BatchReport {
        let mut report = BatchReport::default();
        let mut consecutive = 0u32;

        for (idx, raw) in inputs.iter().enumerate() {
            tracing::info!(
                current = idx + 1,
                total = inputs.len(),
                url = %raw,
                "Processing profile"
            );

            let normalized = match self.urls.normalize(raw) {
                Ok(url) => url,
                Err(e) => {
                    if self.note_failure(raw, &e, &mut consecutive, &mut report) {
                        report.skipped = inputs[idx + 1..].to_vec();
                        break;
                    }
                    continue;
                }
            };

            match self.executor.fetch_profile(&normalized).await {
                Ok(record) => {
                    consecutive = 0;
                    tracing::info!(url = %normalized, name = %record.name, "Profile captured");
                    report.records.push(record);
                }
                Err(e) => {
                    // Last resort in skip-errors mode: a record built from the
                    // URL slug still makes a usable bookmark
                    if self.skip_errors {
                        if let Some(record) = self.slug_fallback(&normalized) {
                            tracing::info!(
                                url = %normalized,
                                name = %record.name,
                                "Using slug-derived fallback record"
                            );
                            report.records.push(record);
                        }
                    }

                    if self.note_failure(&normalized, &e, &mut consecutive, &mut report) {
                        report.skipped = inputs[idx + 1..].to_vec();
                        break;
                    }
                }
            }
        }

        tracing::info!(
            records = report.records.len(),
            failures = report.failures.len(),
            skipped = report.skipped.len(),
            aborted = ?report.aborted,
            "Batch finished"
        );

        report
    }

    /// Record a failure and decide whether the run must stop.
    ///
    /// The consecutive-failure breaker is checked first; it applies even in
    /// skip-errors mode.
    fn note_failure(
        &self,
        url: &str,
        error: &FetchError,
        consecutive: &mut u32,
        report: &mut BatchReport,
    ) -> bool {
        *consecutive += 1;
        tracing::warn!(
            url = %url,
            error = %error,
            consecutive = *consecutive,
            "Profile fetch failed"
        );
        report.failures.push(Failure {
            url: url.to_string(),
            reason: error.to_string(),
        });

        if *consecutive >= self.max_consecutive_failures {
            report.aborted = Some(Abort::ConsecutiveFailures(*consecutive));
            return true;
        }
        if !self.skip_errors {
            report.aborted = Some(Abort::FirstFailure);
            return true;
        }
        false
    }

    fn slug_fallback(&self, url: &str) -> Option<ProfileRecord> {
        let name = self.urls.name_from_slug(url)?;
        Some(ProfileRecord {
            url: url.to_string(),
            name,
            title: None,
            company: None,
        })
    }
}
