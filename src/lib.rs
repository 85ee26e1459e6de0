//! # searchlight
//!
//! Search-enrich-report pipeline: turns a natural-language query into a
//! cited research report.
//!
//! The pipeline resolves the query into a search directive, retrieves
//! candidate web pages from a search index, enriches a bounded subset of
//! them with scraped full-text content, and synthesizes a multi-section
//! narrative that cites every source by its canonical short URL.
//!
//! ## Design
//!
//! - One shared URL identity cache memoizes a canonical short form for
//!   every long URL, with a deterministic local fallback when the
//!   external shortener is unavailable
//! - Page fetching uses browser-like headers, bounded retries with fixed
//!   backoff, and permissive charset recovery
//! - Content extraction is a pure heuristic over parsed HTML that never
//!   fails — unusable pages yield a sentinel string
//! - A post-hoc consistency pass rewrites any URL leaking into the
//!   generated narrative to its short form, enforcing the citation
//!   invariant mechanically
//! - Every stage recovers from provider failure with a documented
//!   fallback; "no results" is a terminal outcome, not an error
//!
//! ## Security
//!
//! - No network listeners — this is a library, not a server
//! - Queries are logged only at trace level
//! - Provider credentials never appear in error messages

pub mod config;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod intent;
pub mod llm;
pub mod pipeline;
pub mod report;
pub mod search;
pub mod shortener;
pub mod types;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use fetch::{FetchOutcome, Fetcher};
pub use llm::{CompletionBackend, CompletionRequest};
pub use pipeline::ResearchPipeline;
pub use search::SearchBackend;
pub use shortener::UrlShortener;
pub use types::{QueryDirective, QueryResponse, Report, ResponseKind, SearchCandidate};

/// Process a natural-language query with a freshly built pipeline.
///
/// Convenience wrapper that constructs [`ResearchPipeline`] with
/// HTTP-backed collaborators. Callers processing many queries should
/// build one pipeline and reuse it so the identity cache persists
/// across queries.
///
/// # Errors
///
/// Returns [`PipelineError::Config`] for an invalid configuration or
/// [`PipelineError::Http`] if a client cannot be constructed.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> searchlight::Result<()> {
/// let config = searchlight::PipelineConfig::from_env()?;
/// let response = searchlight::process_query("what changed in battery tech this week?", &config).await?;
/// println!("{}: {}", response.kind, response.answer);
/// # Ok(())
/// # }
/// ```
pub async fn process_query(query: &str, config: &PipelineConfig) -> Result<QueryResponse> {
    let pipeline = ResearchPipeline::new(config.clone())?;
    pipeline.process_query(query, None, None).await
}

/// Run a raw web search, returning sanitised candidates with resolved
/// short URLs and no enrichment.
///
/// # Errors
///
/// Returns [`PipelineError::Config`] or [`PipelineError::Http`] if the
/// search client cannot be constructed. Provider failures yield an
/// empty sequence, not an error.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> searchlight::Result<()> {
/// let config = searchlight::PipelineConfig::from_env()?;
/// let results = searchlight::search("rust async runtimes", &config).await?;
/// for candidate in &results {
///     println!("{}: {}", candidate.title, candidate.short_url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search(query: &str, config: &PipelineConfig) -> Result<Vec<SearchCandidate>> {
    use crate::search::{SearchBackend as _, SearchClient};
    use std::sync::Arc;

    config.validate()?;
    let shortener = Arc::new(UrlShortener::new(config));
    let client = SearchClient::new(config, shortener)?;
    let candidates = client
        .search(query, config.default_result_count, true)
        .await;
    Ok(search::filter_candidates(candidates, config.min_snippet_chars))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn process_query_validates_config() {
        let config = PipelineConfig {
            fetch_attempts: 0,
            ..Default::default()
        };
        let result = process_query("test", &config).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("fetch_attempts"));
    }

    #[tokio::test]
    async fn search_validates_config() {
        let config = PipelineConfig {
            default_result_count: 0,
            ..Default::default()
        };
        let result = search("test", &config).await;
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("default_result_count"));
    }
}
