//! Pipeline orchestration: intent → search → enrichment → synthesis.
//!
//! Per query the pipeline walks a fixed sequence of stages:
//! `ResolvingIntent → Searching → (NoResults | Enriching) → Synthesizing
//! → Done`. `NoResults` is a valid terminal outcome carrying the
//! resolved search string; every other stage failure is recovered inside
//! its stage, so a constructed pipeline practically always produces a
//! structured answer.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::PipelineConfig;
use crate::enrich::enrich;
use crate::error::Result;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::intent::resolve_intent;
use crate::llm::{CompletionBackend, HttpCompletionClient};
use crate::report::synthesize;
use crate::search::{SearchBackend, SearchClient};
use crate::shortener::UrlShortener;
use crate::types::{QueryResponse, ResponseKind};

/// The search-enrich-report pipeline, generic over its three external
/// collaborators so tests can run it entirely over mocks.
#[derive(Debug)]
pub struct ResearchPipeline<S, C, F> {
    config: PipelineConfig,
    shortener: Arc<UrlShortener>,
    search: S,
    completion: C,
    fetcher: F,
}

impl ResearchPipeline<SearchClient, HttpCompletionClient, HttpFetcher> {
    /// Build a pipeline with HTTP-backed collaborators from the given
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::PipelineError::Config`] for an invalid
    /// configuration and [`crate::error::PipelineError::Http`] if a
    /// client cannot be constructed.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let shortener = Arc::new(UrlShortener::new(&config));
        let search = SearchClient::new(&config, Arc::clone(&shortener))?;
        let completion = HttpCompletionClient::new(&config)?;
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self {
            config,
            shortener,
            search,
            completion,
            fetcher,
        })
    }
}

impl<S, C, F> ResearchPipeline<S, C, F>
where
    S: SearchBackend,
    C: CompletionBackend,
    F: Fetcher,
{
    /// Build a pipeline over explicit collaborators and an explicit
    /// identity cache. The cache may be pre-seeded; the search backend
    /// is expected to share it so candidate short URLs and the
    /// consistency pass agree.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::PipelineError::Config`] for an invalid
    /// configuration.
    pub fn with_backends(
        config: PipelineConfig,
        shortener: Arc<UrlShortener>,
        search: S,
        completion: C,
        fetcher: F,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            shortener,
            search,
            completion,
            fetcher,
        })
    }

    /// Shared identity cache, for callers that want to reuse it across
    /// pipelines or inspect it in tests.
    pub fn shortener(&self) -> &Arc<UrlShortener> {
        &self.shortener
    }

    /// Process one natural-language query into a structured answer.
    ///
    /// A missing `timestamp` defaults to now; a missing `timezone`
    /// defaults to the configured one.
    ///
    /// # Errors
    ///
    /// Practically never after construction: all stage failures recover
    /// with documented fallbacks. The `Result` exists for symmetry with
    /// construction and future orchestration-level failures.
    pub async fn process_query(
        &self,
        query: &str,
        timestamp: Option<DateTime<Utc>>,
        timezone: Option<&str>,
    ) -> Result<QueryResponse> {
        let timestamp = timestamp.unwrap_or_else(Utc::now);
        let timezone = timezone.unwrap_or(&self.config.default_timezone);
        let formatted_time = timestamp.format("%Y-%m-%d %H:%M:%S").to_string();

        // ResolvingIntent
        tracing::debug!(query, "resolving intent");
        let directive = resolve_intent(
            &self.completion,
            query,
            &formatted_time,
            timezone,
            self.config.default_result_count,
        )
        .await;

        // Searching
        tracing::debug!(search_query = %directive.search_query, "searching");
        let candidates = self
            .search
            .search(&directive.search_query, directive.result_count, true)
            .await;

        // NoResults is terminal, not exceptional.
        if candidates.is_empty() {
            tracing::debug!(search_query = %directive.search_query, "no results");
            return Ok(QueryResponse {
                query: query.to_owned(),
                answer: format!(
                    "Sorry, no relevant information was found for \"{}\". \
                     Try different keywords or a more specific description.",
                    directive.search_query
                ),
                kind: ResponseKind::NoResults,
                search_query: Some(directive.search_query),
                used_tools: vec!["search".into()],
                raw_results: None,
            });
        }

        // Enriching
        tracing::debug!(count = candidates.len(), "enriching candidates");
        let enriched = enrich(
            candidates,
            &self.fetcher,
            self.config.enrich_limit,
            self.config.max_content_chars,
        )
        .await;

        // Synthesizing
        tracing::debug!("synthesizing report");
        let report = synthesize(
            &self.completion,
            &self.shortener,
            query,
            &directive,
            &enriched,
            &formatted_time,
            self.config.context_excerpt_chars,
            self.config.report_max_tokens,
        )
        .await;

        // Done
        Ok(QueryResponse {
            query: query.to_owned(),
            answer: report.text,
            kind: ResponseKind::SearchAndReport,
            search_query: Some(directive.search_query),
            used_tools: vec!["search".into(), "analyze".into()],
            raw_results: Some(report.sources),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    #[test]
    fn new_rejects_invalid_config() {
        let config = PipelineConfig {
            enrich_limit: 0,
            ..Default::default()
        };
        let result = ResearchPipeline::new(config);
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn new_accepts_default_config() {
        assert!(ResearchPipeline::new(PipelineConfig::default()).is_ok());
    }
}
