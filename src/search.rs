//! Search client for the Google Custom Search JSON API.
//!
//! Issues one query with a result cap (provider limit: 10) and an
//! optional recency sort, sanitises snippets, and resolves every
//! result's long URL through the shared identity cache immediately, so
//! a candidate always carries a usable short form even before
//! enrichment. Provider errors and empty result sets both yield an
//! empty sequence — "no results" is a valid terminal state for the
//! orchestrator, not an exceptional one.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::shortener::UrlShortener;
use crate::types::SearchCandidate;

/// Provider-side cap on results per query.
pub const PROVIDER_MAX_RESULTS: u8 = 10;

/// A pluggable search backend.
///
/// The orchestrator is generic over this trait so tests can drive the
/// pipeline with canned result sets.
pub trait SearchBackend: Send + Sync {
    /// Run a search and return candidates in provider order. Failures
    /// are absorbed into an empty sequence.
    fn search(
        &self,
        query: &str,
        result_count: u8,
        sort_by_date: bool,
    ) -> impl std::future::Future<Output = Vec<SearchCandidate>> + Send;
}

/// HTTP search client backed by the Google Custom Search JSON API.
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    cx: String,
    shortener: Arc<UrlShortener>,
}

impl SearchClient {
    /// Build a search client sharing the given identity cache.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Http`] if the HTTP client cannot be
    /// constructed.
    pub fn new(config: &PipelineConfig, shortener: Arc<UrlShortener>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_seconds))
            .build()
            .map_err(|e| PipelineError::Http(format!("failed to build search client: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.search_endpoint.clone(),
            api_key: config.search_api_key.clone(),
            cx: config.search_cx.clone(),
            shortener,
        })
    }
}

impl SearchBackend for SearchClient {
    async fn search(&self, query: &str, result_count: u8, sort_by_date: bool) -> Vec<SearchCandidate> {
        tracing::trace!(query, result_count, sort_by_date, "search request");

        let num = result_count.min(PROVIDER_MAX_RESULTS).to_string();
        let mut params = vec![
            ("key", self.api_key.as_str()),
            ("cx", self.cx.as_str()),
            ("q", query),
            ("num", num.as_str()),
        ];
        if sort_by_date {
            params.push(("sort", "date"));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await;

        let body = match response {
            Ok(response) => match response.error_for_status() {
                Ok(response) => match response.text().await {
                    Ok(body) => body,
                    Err(err) => {
                        tracing::warn!(error = %err, "search response read failed");
                        return Vec::new();
                    }
                },
                Err(err) => {
                    tracing::warn!(error = %err, "search provider returned error status");
                    return Vec::new();
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "search request failed");
                return Vec::new();
            }
        };

        let items = parse_search_items(&body);
        tracing::debug!(count = items.len(), "search items parsed");

        let mut candidates = Vec::with_capacity(items.len());
        for item in items {
            if item.link.is_empty() {
                continue;
            }
            let short_url = self.shortener.resolve(&item.link).await;
            let published_date = item.published_date();
            candidates.push(SearchCandidate {
                title: item.title,
                long_url: item.link,
                short_url,
                snippet: sanitize_snippet(&item.snippet),
                source: "google".into(),
                published_date,
                full_content: None,
            });
        }
        candidates
    }
}

/// One raw item from the provider response.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pagemap: Option<serde_json::Value>,
}

impl SearchItem {
    /// Publication date from `pagemap.metatags[0]["article:published_time"]`,
    /// when present and non-empty.
    fn published_date(&self) -> Option<String> {
        let date = self
            .pagemap
            .as_ref()?
            .get("metatags")?
            .get(0)?
            .get("article:published_time")?
            .as_str()?
            .trim();
        if date.is_empty() {
            None
        } else {
            Some(date.to_owned())
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponseBody {
    #[serde(default)]
    items: Vec<SearchItem>,
}

/// Parse the provider's JSON body into raw items.
///
/// Extracted as a separate function for testability with canned payloads.
/// An unparsable body or a body without `items` yields an empty vec.
pub(crate) fn parse_search_items(body: &str) -> Vec<SearchItem> {
    match serde_json::from_str::<SearchResponseBody>(body) {
        Ok(parsed) => parsed.items,
        Err(err) => {
            tracing::warn!(error = %err, "search response parse failed");
            Vec::new()
        }
    }
}

fn tag_regex() -> &'static Regex {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    TAG_RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("tag regex is valid"))
}

/// Sanitise a provider snippet: strip markup tags, collapse whitespace
/// runs, and trim.
pub fn sanitize_snippet(snippet: &str) -> String {
    let stripped = tag_regex().replace_all(snippet, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop candidates whose snippet is shorter than `min_snippet_chars`.
///
/// Useful for callers of the raw search operation that want to discard
/// results too thin to be meaningful.
pub fn filter_candidates(
    candidates: Vec<SearchCandidate>,
    min_snippet_chars: usize,
) -> Vec<SearchCandidate> {
    candidates
        .into_iter()
        .filter(|c| c.snippet.len() >= min_snippet_chars)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROVIDER_BODY: &str = r#"{
        "items": [
            {
                "title": "Solid-state batteries near production",
                "link": "https://example.com/batteries/solid-state",
                "snippet": "Solid-state &nbsp; cells <b>promise</b>   higher density...",
                "pagemap": {
                    "metatags": [
                        { "article:published_time": "2025-03-12T09:00:00Z" }
                    ]
                }
            },
            {
                "title": "Battery news roundup",
                "link": "https://example.org/news",
                "snippet": "Weekly roundup of storage industry news."
            }
        ]
    }"#;

    #[test]
    fn parse_items_from_provider_body() {
        let items = parse_search_items(PROVIDER_BODY);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Solid-state batteries near production");
        assert_eq!(items[0].link, "https://example.com/batteries/solid-state");
        assert_eq!(
            items[0].published_date().as_deref(),
            Some("2025-03-12T09:00:00Z")
        );
        assert!(items[1].published_date().is_none());
    }

    #[test]
    fn parse_body_without_items_yields_empty() {
        let items = parse_search_items(r#"{"searchInformation": {"totalResults": "0"}}"#);
        assert!(items.is_empty());
    }

    #[test]
    fn parse_garbage_body_yields_empty() {
        assert!(parse_search_items("not json at all").is_empty());
        assert!(parse_search_items("").is_empty());
    }

    #[test]
    fn sanitize_strips_tags_and_collapses_whitespace() {
        let cleaned = sanitize_snippet("Solid-state cells <b>promise</b>   higher\n density");
        assert_eq!(cleaned, "Solid-state cells promise higher density");
    }

    #[test]
    fn sanitize_plain_text_unchanged() {
        assert_eq!(sanitize_snippet("plain snippet"), "plain snippet");
    }

    fn candidate_with_snippet(snippet: &str) -> SearchCandidate {
        SearchCandidate {
            title: "T".into(),
            long_url: "https://example.com".into(),
            short_url: "https://short.url/1".into(),
            snippet: snippet.into(),
            source: "google".into(),
            published_date: None,
            full_content: None,
        }
    }

    #[test]
    fn filter_drops_thin_snippets() {
        let candidates = vec![
            candidate_with_snippet("too short"),
            candidate_with_snippet(
                "a snippet that is comfortably longer than the fifty character minimum",
            ),
        ];
        let kept = filter_candidates(candidates, 50);
        assert_eq!(kept.len(), 1);
        assert!(kept[0].snippet.contains("comfortably longer"));
    }

    #[test]
    fn build_client_with_default_config() {
        let shortener = Arc::new(UrlShortener::local_only("https://short.url"));
        let config = PipelineConfig::default();
        assert!(SearchClient::new(&config, shortener).is_ok());
    }

    #[tokio::test]
    async fn provider_error_yields_empty_not_failure() {
        let shortener = Arc::new(UrlShortener::local_only("https://short.url"));
        let config = PipelineConfig {
            // Reserved TEST-NET-1 address; request fails fast.
            search_endpoint: "http://192.0.2.1/customsearch/v1".into(),
            fetch_timeout_seconds: 1,
            ..Default::default()
        };
        let client = SearchClient::new(&config, shortener).expect("client should build");
        let results = client.search("anything", 5, true).await;
        assert!(results.is_empty());
    }
}
