//! Report synthesis with a post-hoc URL consistency pass.
//!
//! Builds a per-candidate source context, requests a multi-section
//! narrative from the completion provider, then mechanically rewrites
//! any URL leaking into the narrative to its canonical short form. The
//! provider is instructed to cite short URLs only, but that instruction
//! is not guaranteed to be honoured — the consistency pass enforces the
//! invariant instead of trusting the generation step. Synthesis failure
//! falls back to a bullet list of the top candidates, so the answer is
//! always non-empty and URL-consistent.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::llm::{CompletionBackend, CompletionRequest};
use crate::shortener::UrlShortener;
use crate::types::{QueryDirective, Report, SearchCandidate};

const SYSTEM_PROMPT: &str = "You are a professional research analyst. You \
integrate information from multiple sources into comprehensive, detailed \
research reports.";

/// How many candidates the fallback bullet list cites.
const FALLBACK_SOURCES: usize = 3;

/// Synthesize a research report from enriched candidates.
///
/// Never fails: provider errors produce the minimal bullet-list
/// fallback. The returned report's text contains no long URL for which
/// the identity cache holds a short form.
pub async fn synthesize<C: CompletionBackend>(
    backend: &C,
    shortener: &UrlShortener,
    user_query: &str,
    directive: &QueryDirective,
    candidates: &[SearchCandidate],
    formatted_time: &str,
    excerpt_chars: usize,
    max_tokens: u32,
) -> Report {
    let context = build_context(candidates, excerpt_chars);
    let prompt = build_prompt(user_query, &directive.search_query, &context, formatted_time);
    let request = CompletionRequest {
        system: SYSTEM_PROMPT.to_owned(),
        user: prompt,
        temperature: 0.4,
        max_tokens: Some(max_tokens),
        json_mode: false,
    };

    let text = match backend.complete(request).await {
        Ok(narrative) => rewrite_urls(&narrative, shortener).await,
        Err(err) => {
            tracing::warn!(error = %err, "report synthesis failed, using fallback listing");
            fallback_report(candidates)
        }
    };

    Report {
        text,
        sources: candidates.to_vec(),
    }
}

/// Build the textual source context block handed to the provider.
///
/// Each candidate contributes its title, canonical short URL, long URL
/// (provenance only), and either an excerpt of its extracted full
/// content or its snippet.
pub fn build_context(candidates: &[SearchCandidate], excerpt_chars: usize) -> String {
    let mut context = String::new();
    for (i, candidate) in candidates.iter().enumerate() {
        context.push_str(&format!("Source {}:\n", i + 1));
        context.push_str(&format!("Title: {}\n", candidate.title));
        context.push_str(&format!("URL: {}\n", candidate.short_url));
        context.push_str(&format!("Original URL: {}\n", candidate.long_url));
        if let Some(date) = &candidate.published_date {
            context.push_str(&format!("Published: {date}\n"));
        }
        match &candidate.full_content {
            Some(content) => {
                context.push_str(&format!("Content: {}\n\n", excerpt(content, excerpt_chars)));
            }
            None => {
                context.push_str(&format!("Snippet: {}\n\n", candidate.snippet));
            }
        }
    }
    context
}

/// First `max_chars` characters, with an ellipsis when shortened.
fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_owned(),
    }
}

fn build_prompt(
    user_query: &str,
    search_query: &str,
    context: &str,
    formatted_time: &str,
) -> String {
    format!(
        r#"User query: {user_query}
Query time: {formatted_time}
Search keywords: {search_query}

Source material from a web search:

{context}

Write a comprehensive, detailed research report based on the sources
above. The report must contain:

1. Overview: background and why the topic matters
2. Key findings: 3-5 important findings or facts
3. Detailed analysis: an in-depth discussion citing the different sources
4. Trends and implications: where the topic is heading
5. Conclusion: the main takeaways
6. Sources: every source used

Important:
- Cite sources using the short URLs given in the source material (the
  "URL" lines), never the original long URLs.
- The Sources section must list every cited source with its short URL.
- If the query is time-sensitive, make sure time references are accurate
  relative to the query time ({formatted_time}).
- Stay factual and objective; integrate information across sources.
- If sources contradict each other, point it out and discuss why.

Write in clear, professional language, avoiding unnecessary jargon."#
    )
}

/// Minimal fallback: a bullet list of the top candidates with their
/// already-known short URLs.
fn fallback_report(candidates: &[SearchCandidate]) -> String {
    let bullets: Vec<String> = candidates
        .iter()
        .take(FALLBACK_SOURCES)
        .map(|c| format!("- {}: {}", c.title, c.short_url))
        .collect();
    format!(
        "The report could not be generated due to a technical problem. \
         Here is the basic information that was found:\n\n{}",
        bullets.join("\n\n")
    )
}

fn url_regex() -> &'static Regex {
    static URL_RE: OnceLock<Regex> = OnceLock::new();
    URL_RE.get_or_init(|| {
        Regex::new(r#"https?://[^\s)\]"']+"#).expect("url regex is valid")
    })
}

/// Consistency pass: rewrite every URL-shaped substring to its
/// canonical short form.
///
/// URLs that are already cached short forms are left alone. A cached
/// long URL is replaced with its cached short value; any other URL is
/// shortened through the identity cache and replaced in place, so even
/// provider-invented URLs come out canonical.
pub async fn rewrite_urls(text: &str, shortener: &UrlShortener) -> String {
    let mut found: Vec<String> = url_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_owned())
        .collect();
    found.sort();
    found.dedup();
    // Longest first, so a URL that prefixes another is never replaced
    // inside the longer one's occurrence.
    found.sort_by_key(|url| std::cmp::Reverse(url.len()));

    let mut rewritten = text.to_owned();
    for url in found {
        // A fragment that prefixes a short form (e.g. the bare short
        // domain) must not be substituted: replacement is textual, and
        // would mangle every full short form containing it.
        if Url::parse(&url).is_err()
            || shortener.is_short(&url)
            || shortener.is_short_prefix(&url)
        {
            continue;
        }
        let short = shortener.resolve(&url).await;
        if short != url {
            rewritten = rewritten.replace(&url, &short);
        }
    }
    rewritten
}
