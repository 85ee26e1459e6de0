//! Core types moving through the search-enrich-report pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PipelineError;

fn default_source() -> String {
    "google".to_owned()
}

/// A single search result under consideration for citation in a report.
///
/// Created by the search client with `short_url` already resolved;
/// `full_content` is populated only by the enrichment stage. Candidates
/// are treated as immutable once handed to the report synthesizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCandidate {
    /// The title of the result page.
    pub title: String,
    /// The original (long) URL returned by the search provider.
    #[serde(rename = "link")]
    pub long_url: String,
    /// The canonical short URL. Never empty once the candidate leaves the
    /// search client — a local hash form is used if external shortening fails.
    #[serde(rename = "short_link")]
    pub short_url: String,
    /// Provider-supplied text snippet, sanitised of markup.
    pub snippet: String,
    /// Which search provider returned this result.
    #[serde(default = "default_source")]
    pub source: String,
    /// Publication date, when the provider exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    /// Extracted full page text, when enrichment succeeded for this candidate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_content: Option<String>,
}

/// Structured search directive derived once per incoming query by the
/// intent resolver. Not mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDirective {
    /// The search string to send to the search provider.
    pub search_query: String,
    /// Desired number of results, always within `[1, 10]`.
    pub result_count: u8,
}

/// A synthesized research report: narrative text plus the ordered
/// candidates used to build it. Immutable once returned.
#[derive(Debug, Clone)]
pub struct Report {
    /// The narrative text, already URL-consistent (short forms only).
    pub text: String,
    /// The candidates the report was built from, in their original order.
    pub sources: Vec<SearchCandidate>,
}

/// Terminal outcome classification for a processed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    /// A search ran and a report was synthesized.
    SearchAndReport,
    /// The search provider returned no usable results. Not an error.
    NoResults,
    /// An unexpected orchestration failure.
    Error,
}

impl ResponseKind {
    /// Returns the wire name of this outcome.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SearchAndReport => "search_and_report",
            Self::NoResults => "no_results",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Structured answer for one processed natural-language query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The original user query.
    pub query: String,
    /// Report text, or an explanatory message for non-report outcomes.
    pub answer: String,
    /// Outcome classification.
    #[serde(rename = "type")]
    pub kind: ResponseKind,
    /// The resolved search string, so callers can explain what was
    /// searched for even when there is no report body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    /// Names of the pipeline tools exercised for this query.
    pub used_tools: Vec<String>,
    /// The enriched candidates behind the report, absent for `no_results`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_results: Option<Vec<SearchCandidate>>,
}

impl QueryResponse {
    /// Wrap an orchestration failure in the wire shape.
    ///
    /// For transport layers that render failures as structured responses
    /// instead of propagating the error. `PipelineError` messages carry
    /// no credentials, so the text is safe to return to callers.
    pub fn from_error(query: &str, error: &PipelineError) -> Self {
        Self {
            query: query.to_owned(),
            answer: format!("An error occurred while processing the query: {error}"),
            kind: ResponseKind::Error,
            search_query: None,
            used_tools: Vec::new(),
            raw_results: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_candidate() -> SearchCandidate {
        SearchCandidate {
            title: "Example".into(),
            long_url: "https://example.com/very/long/path".into(),
            short_url: "https://short.url/abcd1234".into(),
            snippet: "An example page".into(),
            source: "google".into(),
            published_date: None,
            full_content: None,
        }
    }

    #[test]
    fn candidate_serialises_original_field_names() {
        let json = serde_json::to_value(make_candidate()).expect("serialize");
        assert_eq!(json["link"], "https://example.com/very/long/path");
        assert_eq!(json["short_link"], "https://short.url/abcd1234");
        assert!(json.get("full_content").is_none());
        assert!(json.get("published_date").is_none());
    }

    #[test]
    fn candidate_serde_round_trip() {
        let mut candidate = make_candidate();
        candidate.full_content = Some("body text".into());
        let json = serde_json::to_string(&candidate).expect("serialize");
        let decoded: SearchCandidate = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded.long_url, candidate.long_url);
        assert_eq!(decoded.full_content.as_deref(), Some("body text"));
    }

    #[test]
    fn candidate_source_defaults_to_google() {
        let json = r#"{"title":"T","link":"https://a.com","short_link":"https://s.url/1","snippet":"s"}"#;
        let decoded: SearchCandidate = serde_json::from_str(json).expect("deserialize");
        assert_eq!(decoded.source, "google");
    }

    #[test]
    fn response_kind_snake_case_wire_names() {
        assert_eq!(
            serde_json::to_string(&ResponseKind::SearchAndReport).expect("serialize"),
            "\"search_and_report\""
        );
        assert_eq!(
            serde_json::to_string(&ResponseKind::NoResults).expect("serialize"),
            "\"no_results\""
        );
        assert_eq!(
            serde_json::to_string(&ResponseKind::Error).expect("serialize"),
            "\"error\""
        );
    }

    #[test]
    fn response_kind_display() {
        assert_eq!(ResponseKind::SearchAndReport.to_string(), "search_and_report");
        assert_eq!(ResponseKind::NoResults.to_string(), "no_results");
        assert_eq!(ResponseKind::Error.to_string(), "error");
    }

    #[test]
    fn query_response_type_field_rename() {
        let response = QueryResponse {
            query: "test".into(),
            answer: "nothing found".into(),
            kind: ResponseKind::NoResults,
            search_query: Some("test".into()),
            used_tools: vec!["search".into()],
            raw_results: None,
        };
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["type"], "no_results");
        assert!(json.get("raw_results").is_none());
    }

    #[test]
    fn from_error_produces_error_wire_shape() {
        let err = PipelineError::Config("enrich_limit must be between 1 and 10".into());
        let response = QueryResponse::from_error("broken run", &err);
        assert_eq!(response.kind, ResponseKind::Error);
        assert_eq!(response.query, "broken run");
        assert!(response.answer.contains("enrich_limit"));
        assert!(response.used_tools.is_empty());

        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["type"], "error");
        assert!(json.get("raw_results").is_none());
        assert!(json.get("search_query").is_none());
    }

    #[test]
    fn directive_equality() {
        let a = QueryDirective {
            search_query: "rust async".into(),
            result_count: 5,
        };
        let b = a.clone();
        assert_eq!(a, b);
    }
}
