//! URL identity cache: memoizes one canonical short URL per long URL.
//!
//! [`UrlShortener::resolve`] never fails. A cache hit returns the stored
//! value with no I/O; a miss tries the external shortening endpoint with
//! a short timeout and falls back to a deterministic local hash form on
//! any failure. Entries are never evicted — a short URL is a pure
//! function of its long URL for the lifetime of the cache, and cheap to
//! keep.
//!
//! The cache is held behind an `Arc` and passed to the stages that need
//! it (search client, report synthesizer) rather than living in a
//! process global, so tests can inject a fresh or pre-seeded instance.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use dashmap::{DashMap, DashSet};

use crate::config::PipelineConfig;

/// Thread-safe long-URL → canonical-short-URL cache with an optional
/// external shortening backend.
#[derive(Debug)]
pub struct UrlShortener {
    entries: DashMap<String, String>,
    /// Every short value ever stored, so the consistency pass can tell
    /// short forms apart from unknown URLs without scanning the map.
    shorts: DashSet<String>,
    short_domain: String,
    remote: Option<RemoteShortener>,
}

#[derive(Debug)]
struct RemoteShortener {
    client: reqwest::Client,
    endpoint: String,
}

impl UrlShortener {
    /// Build a shortener that uses the configured external endpoint,
    /// falling back to local hashing when it is unavailable.
    pub fn new(config: &PipelineConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.shorten_timeout_seconds))
            .build()
            .ok();
        let remote = client.map(|client| RemoteShortener {
            client,
            endpoint: config.shorten_endpoint.clone(),
        });
        Self {
            entries: DashMap::new(),
            shorts: DashSet::new(),
            short_domain: config.short_domain.clone(),
            remote,
        }
    }

    /// Build a shortener that only ever uses the deterministic local
    /// hash form. Useful for tests and offline operation.
    pub fn local_only(short_domain: &str) -> Self {
        Self {
            entries: DashMap::new(),
            shorts: DashSet::new(),
            short_domain: short_domain.trim_end_matches('/').to_owned(),
            remote: None,
        }
    }

    /// Resolve a long URL to its canonical short form.
    ///
    /// Infallible: on a cache miss the external call is attempted once,
    /// and any failure (timeout, non-2xx, transport error) falls back to
    /// the local hash form. Either way the result is stored and repeated
    /// calls return the same value without further I/O.
    pub async fn resolve(&self, long_url: &str) -> String {
        if let Some(hit) = self.entries.get(long_url) {
            return hit.clone();
        }

        let short = match &self.remote {
            Some(remote) => match shorten_remote(remote, long_url).await {
                Some(short) => short,
                None => self.shorten_locally(long_url),
            },
            None => self.shorten_locally(long_url),
        };

        // Insert-if-absent: a concurrent resolve of the same URL may have
        // won the race; the stored value is canonical either way.
        let stored = self
            .entries
            .entry(long_url.to_owned())
            .or_insert(short)
            .clone();
        self.shorts.insert(stored.clone());
        stored
    }

    /// Read-only probe: the cached short form for `long_url`, if any.
    pub fn lookup(&self, long_url: &str) -> Option<String> {
        self.entries.get(long_url).map(|entry| entry.clone())
    }

    /// Returns `true` if `url` is one of the short forms this cache has
    /// handed out.
    pub fn is_short(&self, url: &str) -> bool {
        self.shorts.contains(url)
    }

    /// Returns `true` if `url` is a proper prefix of a handed-out short
    /// form, or of the short domain itself. Rewriting such a fragment
    /// in place would corrupt the full short form around it.
    pub fn is_short_prefix(&self, url: &str) -> bool {
        self.short_domain.starts_with(url)
            || self.shorts.iter().any(|short| short.starts_with(url))
    }

    /// Number of cached long URLs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no URLs have been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pre-populate an entry. Intended for tests and for callers that
    /// already know a canonical mapping.
    pub fn seed(&self, long_url: &str, short_url: &str) {
        self.entries
            .insert(long_url.to_owned(), short_url.to_owned());
        self.shorts.insert(short_url.to_owned());
    }

    /// Deterministic local short form: an 8-hex-digit hash of the long
    /// URL rendered under the configured short domain.
    fn shorten_locally(&self, long_url: &str) -> String {
        let mut hasher = DefaultHasher::new();
        long_url.hash(&mut hasher);
        let code = format!("{:016x}", hasher.finish());
        format!("{}/{}", self.short_domain, &code[..8])
    }
}

/// One attempt against the external shortening endpoint.
///
/// Returns `None` on any failure so the caller falls back locally.
async fn shorten_remote(remote: &RemoteShortener, long_url: &str) -> Option<String> {
    let response = remote
        .client
        .get(&remote.endpoint)
        .query(&[("url", long_url)])
        .send()
        .await;

    let response = match response {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!(error = %err, "external shortening request failed");
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!(status = %response.status(), "external shortener returned non-success");
        return None;
    }

    let body = response.text().await.ok()?;
    let short = body.trim();
    if short.starts_with("http://") || short.starts_with("https://") {
        Some(short.to_owned())
    } else {
        None
    }
}
