//! The listing source abstraction.
//!
//! Every source, scraped website or language model, implements
//! [`ListingAdapter`] and produces [`RawListing`]s for a resolved location.
//! The pipeline depends only on this contract, never on concrete adapter
//! types, so new sources plug in without touching the orchestration.

use std::fmt;

use async_trait::async_trait;

use crate::locations::LocationDescriptor;
use crate::model::{RawListing, SourceKind};

/// Failure modes an adapter may surface to the pipeline.
///
/// Per-item extraction problems are NOT errors: a malformed item is dropped
/// and counted inside the adapter. These variants describe whole-source
/// conditions only.
//
// `Display`/`Error` are implemented by hand rather than via `thiserror` because
// the spec names the string field `source`, which `#[derive(Error)]` reserves
// for an `Error`-typed cause. The impls below reproduce the exact message
// strings the derive would have generated.
#[derive(Debug)]
pub enum AdapterError {
    /// The source cannot be reached or returned no usable structure.
    /// Triggers fallback to the next source.
    SourceUnavailable { source: String, reason: String },

    /// The source throttled the request. Retryable with backoff.
    RateLimited {
        source: String,
        retry_after_secs: u64,
    },

    /// The language-model collaborator is unreachable or out of quota.
    /// Same class as [`AdapterError::SourceUnavailable`] for fallback
    /// purposes.
    GenerationUnavailable { reason: String },
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterError::SourceUnavailable { source, reason } => {
                write!(f, "source {source} unavailable: {reason}")
            }
            AdapterError::RateLimited {
                source,
                retry_after_secs,
            } => write!(
                f,
                "rate limited by {source} (retry after {retry_after_secs}s)"
            ),
            AdapterError::GenerationUnavailable { reason } => {
                write!(f, "generation unavailable: {reason}")
            }
        }
    }
}

impl std::error::Error for AdapterError {}

impl AdapterError {
    /// `true` for errors worth retrying against the same adapter after a
    /// backoff delay; everything else triggers fallback instead.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdapterError::RateLimited { .. })
    }
}

/// A source of candidate listings for a canonical location.
#[async_trait]
pub trait ListingAdapter: Send + Sync {
    /// Stable source name used in logs and failure reports.
    fn name(&self) -> &'static str;

    /// Provenance recorded on auctions normalized from this adapter's
    /// output.
    fn kind(&self) -> SourceKind;

    /// Produces raw candidate listings for `location`.
    ///
    /// Within one invocation the returned listings preserve the source's
    /// emission order. Partial items (missing fields) are returned as-is;
    /// only whole-source failures are errors.
    ///
    /// # Errors
    ///
    /// See [`AdapterError`].
    async fn fetch(
        &self,
        location: &LocationDescriptor,
        query: &str,
    ) -> Result<Vec<RawListing>, AdapterError>;
}
