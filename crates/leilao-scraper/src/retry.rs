//! Bounded exponential-backoff retry for transient fetch errors.
//!
//! Network-level failures and 5xx statuses are retried; everything else —
//! including 429, which the pipeline handles with its own backoff policy —
//! is propagated immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

/// Returns `true` if `err` represents a transient condition that should be
/// retried after a backoff delay.
///
/// Retriable:
/// - [`FetchError::Http`] — network-level failure (connection reset, timeout).
/// - [`FetchError::UnexpectedStatus`] with a 5xx status — transient server
///   error.
///
/// Not retriable (propagated immediately):
/// - [`FetchError::RateLimited`] — surfaced to the pipeline, which owns the
///   rate-limit backoff and fallback policy.
/// - [`FetchError::UnexpectedStatus`] with a 4xx status — retrying returns
///   the same result.
/// - [`FetchError::MalformedContent`] — data shape issue; retrying won't fix
///   it.
fn is_retriable(err: &FetchError) -> bool {
    match err {
        FetchError::Http(_) => true,
        FetchError::UnexpectedStatus { status, .. } => (500..600).contains(status),
        FetchError::RateLimited { .. } | FetchError::MalformedContent { .. } => false,
    }
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// On a retriable error the function sleeps for
/// `backoff_base_secs * 2^attempt` seconds and tries again, up to
/// `max_retries` additional attempts after the first try. If all retries are
/// exhausted the last error is returned. Non-retriable errors are returned
/// immediately without sleeping.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_secs,
                    error = %err,
                    "transient fetch error — retrying after backoff"
                );
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                attempt += 1;
            }
        }
    }
}
