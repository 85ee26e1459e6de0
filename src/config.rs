//! Pipeline configuration with sensible defaults.
//!
//! [`PipelineConfig`] controls provider endpoints and credentials, retry
//! behaviour, the enrichment bound, truncation limits, and the token
//! budget for report synthesis. The defaults are tuned for polite
//! scraping and modest provider usage.

use crate::error::PipelineError;

/// Configuration for the search-enrich-report pipeline.
///
/// Use [`Default::default()`] plus field overrides, or
/// [`PipelineConfig::from_env()`] to pick up provider credentials from
/// the environment.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Search provider endpoint (Google Custom Search JSON API).
    pub search_endpoint: String,
    /// Search provider API key.
    pub search_api_key: String,
    /// Search provider engine (cx) identifier.
    pub search_cx: String,
    /// Completion provider chat endpoint.
    pub completion_endpoint: String,
    /// Completion provider API key.
    pub completion_api_key: String,
    /// Completion model identifier.
    pub completion_model: String,
    /// External URL shortening endpoint. Receives `?url=<long>` and
    /// responds with the short URL as plain text.
    pub shorten_endpoint: String,
    /// Timeout for a single external shortening call, in seconds.
    pub shorten_timeout_seconds: u64,
    /// Domain under which locally derived short URLs are rendered when
    /// the external shortener is unavailable.
    pub short_domain: String,
    /// Per-request timeout for page fetches, in seconds.
    pub fetch_timeout_seconds: u64,
    /// Total fetch attempts per page (first try plus retries).
    pub fetch_attempts: u32,
    /// Fixed sleep between fetch attempts, in milliseconds.
    pub retry_backoff_ms: u64,
    /// How many leading candidates are fetched and extracted. Candidates
    /// beyond this bound pass through with only their snippet. This is
    /// the primary defense against overloading scraped sites.
    pub enrich_limit: usize,
    /// Maximum characters kept from an extracted page.
    pub max_content_chars: usize,
    /// Characters of full content quoted per candidate in the synthesis
    /// context block.
    pub context_excerpt_chars: usize,
    /// Token budget for the report completion call.
    pub report_max_tokens: u32,
    /// Result count used when intent resolution falls back to the raw query.
    pub default_result_count: u8,
    /// Minimum snippet length for [`crate::search::filter_candidates`].
    pub min_snippet_chars: usize,
    /// Timezone name used when the caller supplies none.
    pub default_timezone: String,
    /// Custom User-Agent for page fetching. If `None`, rotates through a
    /// built-in list of realistic browser User-Agents.
    pub user_agent: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            search_endpoint: "https://www.googleapis.com/customsearch/v1".into(),
            search_api_key: String::new(),
            search_cx: String::new(),
            completion_endpoint: "https://api.openai.com/v1/chat/completions".into(),
            completion_api_key: String::new(),
            completion_model: "gpt-4o-mini".into(),
            shorten_endpoint: "https://tinyurl.com/api-create.php".into(),
            shorten_timeout_seconds: 5,
            short_domain: "https://short.url".into(),
            fetch_timeout_seconds: 15,
            fetch_attempts: 3,
            retry_backoff_ms: 1000,
            enrich_limit: 5,
            max_content_chars: 10_000,
            context_excerpt_chars: 1000,
            report_max_tokens: 2500,
            default_result_count: 5,
            min_snippet_chars: 50,
            default_timezone: "Asia/Taipei".into(),
            user_agent: None,
        }
    }
}

impl PipelineConfig {
    /// Build a configuration from environment variables.
    ///
    /// Reads `GOOGLE_API_KEY`, `GOOGLE_CSE_ID`, and `OPENAI_API_KEY`;
    /// everything else keeps its default.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if any credential is missing.
    pub fn from_env() -> Result<Self, PipelineError> {
        let require = |name: &str| {
            std::env::var(name)
                .map_err(|_| PipelineError::Config(format!("{name} is not set")))
        };
        Ok(Self {
            search_api_key: require("GOOGLE_API_KEY")?,
            search_cx: require("GOOGLE_CSE_ID")?,
            completion_api_key: require("OPENAI_API_KEY")?,
            ..Default::default()
        })
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `fetch_attempts` must be greater than 0
    /// - `fetch_timeout_seconds` and `shorten_timeout_seconds` must be greater than 0
    /// - `enrich_limit` must be in `[1, 10]`
    /// - `default_result_count` must be in `[1, 10]`
    /// - `max_content_chars` and `report_max_tokens` must be greater than 0
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.fetch_attempts == 0 {
            return Err(PipelineError::Config(
                "fetch_attempts must be greater than 0".into(),
            ));
        }
        if self.fetch_timeout_seconds == 0 {
            return Err(PipelineError::Config(
                "fetch_timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.shorten_timeout_seconds == 0 {
            return Err(PipelineError::Config(
                "shorten_timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.enrich_limit == 0 || self.enrich_limit > 10 {
            return Err(PipelineError::Config(
                "enrich_limit must be between 1 and 10".into(),
            ));
        }
        if self.default_result_count == 0 || self.default_result_count > 10 {
            return Err(PipelineError::Config(
                "default_result_count must be between 1 and 10".into(),
            ));
        }
        if self.max_content_chars == 0 {
            return Err(PipelineError::Config(
                "max_content_chars must be greater than 0".into(),
            ));
        }
        if self.report_max_tokens == 0 {
            return Err(PipelineError::Config(
                "report_max_tokens must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
