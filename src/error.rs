//! Error types for the searchlight crate.
//!
//! All errors use stable string messages suitable for display to callers.
//! No API keys or sensitive data appear in error messages.
//!
//! Most stage-level failures never reach this type: the shortener, the
//! intent resolver and the report synthesizer all recover with documented
//! fallbacks, and exhausted page fetches are expressed as
//! [`crate::fetch::FetchOutcome::Exhausted`]. `PipelineError` covers
//! configuration mistakes, client construction failures, and completion
//! provider errors that the calling stage turns into a fallback.

/// Errors that can occur while building or running the research pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The completion provider was unreachable or returned an error.
    #[error("completion provider error: {0}")]
    Provider(String),

    /// An HTTP client could not be constructed or a request failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A provider response could not be parsed into the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid pipeline configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for searchlight results.
pub type Result<T> = std::result::Result<T, PipelineError>;
