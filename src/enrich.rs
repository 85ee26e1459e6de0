//! Enrichment stage: bounded, concurrent fetch-and-extract.
//!
//! Only the first K candidates are fetched, concurrently; the bound
//! caps total request volume against scraped sites. Each task runs the
//! fetcher's own sequential retry loop without blocking its siblings.
//! A candidate whose fetch is exhausted keeps `full_content` absent but
//! stays in the sequence at its original position, so the report still
//! cites it via its snippet. Candidates beyond K pass through unchanged.

use crate::extract::extract_content_with_limit;
use crate::fetch::{FetchOutcome, Fetcher};
use crate::types::SearchCandidate;

/// Fetch and extract full text for the first `limit` candidates.
///
/// The output sequence has the same length and order as the input.
pub async fn enrich<F: Fetcher>(
    candidates: Vec<SearchCandidate>,
    fetcher: &F,
    limit: usize,
    max_content_chars: usize,
) -> Vec<SearchCandidate> {
    let split = limit.min(candidates.len());
    let mut candidates = candidates;
    let rest = candidates.split_off(split);
    let head = candidates;

    let tasks = head.into_iter().map(|mut candidate| async move {
        match fetcher.fetch(&candidate.long_url).await {
            FetchOutcome::Fetched(html) => {
                let content = extract_content_with_limit(&html, max_content_chars);
                tracing::debug!(
                    url = %candidate.long_url,
                    chars = content.len(),
                    "candidate enriched"
                );
                candidate.full_content = Some(content);
            }
            FetchOutcome::Exhausted { attempts, reason } => {
                tracing::warn!(
                    url = %candidate.long_url,
                    attempts,
                    reason = %reason,
                    "candidate fetch exhausted, keeping snippet only"
                );
            }
        }
        candidate
    });

    let mut enriched = futures::future::join_all(tasks).await;
    enriched.extend(rest);
    enriched
}
