use thiserror::Error;

/// Failure modes of the page-retrieval capability.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 429 from the source. Not retried here — the pipeline owns the
    /// rate-limit backoff policy.
    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    /// Any other non-2xx status. 5xx is treated as transient and retried
    /// before this surfaces.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The page was reachable but its content did not have the expected
    /// structure.
    #[error("malformed content from {url}: {reason}")]
    MalformedContent { url: String, reason: String },
}
