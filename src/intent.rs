//! Intent resolution: free-form query → structured search directive.
//!
//! One JSON-constrained completion call extracts the best search string,
//! topical keywords, a time-relevance flag, and a suggested result
//! count. Relative time phrases ("yesterday", "this week") are
//! normalised against the caller-supplied reference timestamp and
//! timezone embedded in the prompt. Resolution never fails: any
//! provider or parse error falls back to the raw query with the default
//! result count.

use serde::Deserialize;

use crate::llm::{CompletionBackend, CompletionRequest};
use crate::search::PROVIDER_MAX_RESULTS;
use crate::types::QueryDirective;

const SYSTEM_PROMPT: &str = "You are a search keyword analyst. You extract \
the best possible web search keywords from natural-language questions.";

/// Fixed-shape payload the provider is instructed to return.
#[derive(Debug, Deserialize)]
struct IntentPayload {
    search_query: String,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    time_relevant: bool,
    #[serde(default)]
    time_reference: Option<String>,
    #[serde(default)]
    max_results: Option<u8>,
}

/// Resolve a user query into a [`QueryDirective`].
///
/// `formatted_time` is the reference timestamp already rendered for the
/// prompt (e.g. `2025-03-12 09:30:00`); `timezone` is the user's
/// timezone name. `default_count` is used whenever the provider gives
/// no usable suggestion.
pub async fn resolve_intent<C: CompletionBackend>(
    backend: &C,
    user_query: &str,
    formatted_time: &str,
    timezone: &str,
    default_count: u8,
) -> QueryDirective {
    let prompt = build_prompt(user_query, formatted_time, timezone);
    let request = CompletionRequest {
        system: SYSTEM_PROMPT.to_owned(),
        user: prompt,
        temperature: 0.3,
        max_tokens: None,
        json_mode: true,
    };

    let fallback = || QueryDirective {
        search_query: user_query.to_owned(),
        result_count: default_count,
    };

    let content = match backend.complete(request).await {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!(error = %err, "intent resolution failed, using raw query");
            return fallback();
        }
    };

    match serde_json::from_str::<IntentPayload>(&content) {
        Ok(payload) => {
            tracing::debug!(
                search_query = %payload.search_query,
                topics = ?payload.topics,
                time_relevant = payload.time_relevant,
                time_reference = ?payload.time_reference,
                "intent resolved"
            );
            let search_query = payload.search_query.trim().to_owned();
            if search_query.is_empty() {
                return fallback();
            }
            QueryDirective {
                search_query,
                result_count: clamp_result_count(payload.max_results, default_count),
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "intent payload unparsable, using raw query");
            fallback()
        }
    }
}

/// Clamp a suggested result count to `[1, 10]`, substituting the
/// default when absent or zero.
fn clamp_result_count(suggested: Option<u8>, default_count: u8) -> u8 {
    match suggested {
        Some(0) | None => default_count,
        Some(n) => n.min(PROVIDER_MAX_RESULTS),
    }
}

fn build_prompt(user_query: &str, formatted_time: &str, timezone: &str) -> String {
    format!(
        r#"Extract the best web search keywords from the user's question.

User query: {user_query}
Query time: {formatted_time} ({timezone})

Pay close attention to time references in the query. Relative phrases
such as "yesterday" or "last week" must be resolved against the query
time above into concrete dates.

Consider:
1. Identify the core topic and concepts of the query.
2. Drop filler words that do not help the search ("please", "look up").
3. Add synonyms or related terms that may surface more relevant pages.
4. Keep any explicit time range in the search keywords.
5. Preserve important entities: dates, places, people.

Answer with a JSON object of this exact shape:
{{
    "search_query": "the best search keywords",
    "topics": ["core topic 1", "core topic 2"],
    "time_relevant": true,
    "time_reference": "time mentioned in the query, if any",
    "max_results": 5
}}

"max_results" must be between 1 and 10. Return only the JSON object."#
    )
}
