//! Page fetching with bounded retries and browser-like request headers.
//!
//! The fetcher retrieves a URL's markup for content extraction. It uses
//! a realistic browser fingerprint (rotating User-Agent, accept headers,
//! search-engine referrer) to reduce block-by-fingerprint failures, and
//! retries transient failures with a fixed backoff. Exhausted fetches
//! are reported as data, not errors — a candidate whose page cannot be
//! fetched is still cited via its snippet downstream.

use std::time::Duration;

use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};

/// Realistic browser User-Agent strings, rotated per client.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS.choose(&mut rng).copied().unwrap_or(USER_AGENTS[0])
}

/// Outcome of a page fetch after the retry policy has run its course.
///
/// Expressed as an explicit type so call sites decide behaviour without
/// intercepting errors: an exhausted fetch is a normal, expected state.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The page body, decoded with its declared charset (lossy UTF-8
    /// replacement when the charset is unknown or decoding fails).
    Fetched(String),
    /// All attempts failed. Carries the last status code or transport
    /// error description for diagnostics.
    Exhausted {
        /// How many attempts were made.
        attempts: u32,
        /// Last HTTP status or transport error seen.
        reason: String,
    },
}

impl FetchOutcome {
    /// Returns `true` for [`FetchOutcome::Fetched`].
    pub fn is_fetched(&self) -> bool {
        matches!(self, Self::Fetched(_))
    }
}

/// A pluggable page fetcher.
///
/// The enrichment stage is generic over this trait so tests can run the
/// pipeline without network access. All implementations must be
/// `Send + Sync` for concurrent enrichment tasks.
pub trait Fetcher: Send + Sync {
    /// Retrieve the raw markup at `url`, applying the implementation's
    /// own retry policy. Never panics and never returns an error; all
    /// failure modes collapse into [`FetchOutcome::Exhausted`].
    fn fetch(&self, url: &str) -> impl std::future::Future<Output = FetchOutcome> + Send;
}

/// HTTP page fetcher with bounded retries and fixed backoff.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_attempts: u32,
    backoff: Duration,
}

impl HttpFetcher {
    /// Build a fetcher from the pipeline configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Http`] if the HTTP client cannot be
    /// constructed.
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let ua = match config.user_agent {
            Some(ref custom) => custom.clone(),
            None => random_user_agent().to_owned(),
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );
        headers.insert(REFERER, HeaderValue::from_static("https://www.google.com/"));

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.fetch_timeout_seconds))
            .user_agent(ua)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| PipelineError::Http(format!("failed to build fetch client: {e}")))?;

        Ok(Self {
            client,
            max_attempts: config.fetch_attempts,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let mut last_reason = String::new();

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.backoff).await;
            }

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    // 4xx and 5xx are both retried: transient blocks from
                    // scraped sites frequently masquerade as client errors.
                    if status.is_client_error() || status.is_server_error() {
                        tracing::debug!(url, %status, attempt, "fetch returned error status");
                        last_reason = format!("HTTP status {status}");
                        continue;
                    }
                    // text() decodes with the declared charset and
                    // substitutes invalid sequences instead of failing.
                    match response.text().await {
                        Ok(body) => return FetchOutcome::Fetched(body),
                        Err(err) => {
                            tracing::debug!(url, error = %err, attempt, "fetch body read failed");
                            last_reason = err.to_string();
                            continue;
                        }
                    }
                }
                Err(err) => {
                    tracing::debug!(url, error = %err, attempt, "fetch request failed");
                    last_reason = err.to_string();
                    continue;
                }
            }
        }

        tracing::warn!(url, attempts = self.max_attempts, reason = %last_reason, "fetch exhausted");
        FetchOutcome::Exhausted {
            attempts: self.max_attempts,
            reason: last_reason,
        }
    }
}
