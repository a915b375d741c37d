//! Pipeline orchestration: resolution → fetch → normalize → dedup → output.
//!
//! The run walks `Idle → Resolving → Fetching → Normalizing → Deduplicating
//! → Done`; `Errored` is terminal and reached only when every configured
//! source and the fallback are exhausted. Adapter failures inside a run are
//! recorded, never silently swallowed.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

use leilao_core::{
    AdapterError, Auction, Catalog, ListingAdapter, LocationDescriptor, RawListing, SourceKind,
};

use crate::dedup::{merge, DedupConfig};
use crate::normalize::normalize_batch;

/// Stages of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Resolving,
    Fetching,
    Normalizing,
    Deduplicating,
    Done,
    Errored,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::Resolving => "resolving",
            RunState::Fetching => "fetching",
            RunState::Normalizing => "normalizing",
            RunState::Deduplicating => "deduplicating",
            RunState::Done => "done",
            RunState::Errored => "errored",
        };
        write!(f, "{s}")
    }
}

/// One source that failed during a run, with its reason.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub reason: String,
}

/// Observability counters for a run. Dropped and merged items are counted,
/// never silently discarded.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    /// Raw listings collected across all sources before normalization.
    pub raw_count: usize,
    /// Listings dropped during normalization for lacking a usable title.
    pub dropped_empty_title: usize,
    /// Auctions absorbed into representatives during deduplication.
    pub merged_duplicates: usize,
    pub source_failures: Vec<SourceFailure>,
}

/// Final result of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub query: String,
    pub location: LocationDescriptor,
    pub state: RunState,
    pub auctions: Vec<Auction>,
    pub stats: RunStats,
}

/// Terminal failure: every configured source and its fallback exhausted.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("all sources exhausted: {}", format_failures(failures))]
    Exhausted { failures: Vec<SourceFailure> },
}

fn format_failures(failures: &[SourceFailure]) -> String {
    if failures.is_empty() {
        return "no sources configured".to_owned();
    }
    failures
        .iter()
        .map(|f| format!("{}: {}", f.source, f.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Orchestration policy knobs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Additional attempts against the same adapter when it reports rate
    /// limiting, before treating it as unavailable.
    pub rate_limit_retries: u32,
    pub rate_limit_backoff_ms: u64,
    /// Run-level deadline. In-flight adapter calls past it are abandoned
    /// and the run proceeds with whatever completed.
    pub deadline: Option<Duration>,
    /// Use the generated source as the primary instead of a fallback.
    pub generated_primary: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            rate_limit_retries: 2,
            rate_limit_backoff_ms: 1000,
            deadline: None,
            generated_primary: false,
        }
    }
}

/// The auction pipeline.
///
/// Holds the immutable location catalog, the web adapters in priority
/// order, and the optional generated fallback. Depends only on the
/// [`ListingAdapter`] contract.
pub struct Pipeline {
    catalog: Arc<Catalog>,
    web_adapters: Vec<Arc<dyn ListingAdapter>>,
    fallback: Option<Arc<dyn ListingAdapter>>,
    dedup: DedupConfig,
    options: RunOptions,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        catalog: Arc<Catalog>,
        web_adapters: Vec<Arc<dyn ListingAdapter>>,
        fallback: Option<Arc<dyn ListingAdapter>>,
        dedup: DedupConfig,
        options: RunOptions,
    ) -> Self {
        Self {
            catalog,
            web_adapters,
            fallback,
            dedup,
            options,
        }
    }

    /// Runs the full pipeline for one query.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Exhausted`] only when every source (and the
    /// fallback, when configured) failed; an empty result from a reachable
    /// source is a valid, empty run.
    pub async fn run(&self, query: &str) -> Result<RunReport, RunError> {
        let run_id = Uuid::new_v4();
        let deadline = self.options.deadline.map(|d| Instant::now() + d);

        tracing::info!(%run_id, query, state = %RunState::Resolving, "resolving location");
        let location = self.catalog.resolve(query);
        tracing::info!(
            %run_id,
            location = %location.name,
            known = location.is_known(),
            "location resolved"
        );

        tracing::info!(%run_id, state = %RunState::Fetching, "fetching from sources");
        let (raw, any_source_ok, failures) = self.fetch_all(&location, query, deadline).await;

        if !any_source_ok {
            tracing::error!(
                %run_id,
                state = %RunState::Errored,
                failures = failures.len(),
                "every source exhausted"
            );
            return Err(RunError::Exhausted { failures });
        }

        tracing::info!(%run_id, state = %RunState::Normalizing, raw = raw.len(), "normalizing");
        let extracted_at = Utc::now();
        let mut normalized = Vec::new();
        let mut dropped_empty_title = 0usize;
        let raw_count: usize = raw.iter().map(|(_, listings)| listings.len()).sum();
        for (kind, listings) in raw {
            let (mut auctions, dropped) =
                normalize_batch(listings, &location, kind, extracted_at);
            normalized.append(&mut auctions);
            dropped_empty_title += dropped;
        }

        tracing::info!(
            %run_id,
            state = %RunState::Deduplicating,
            normalized = normalized.len(),
            "deduplicating"
        );
        let before_merge = normalized.len();
        let auctions = merge(normalized, &self.dedup);
        let merged_duplicates = before_merge - auctions.len();

        tracing::info!(
            %run_id,
            state = %RunState::Done,
            auctions = auctions.len(),
            dropped_empty_title,
            merged_duplicates,
            "run complete"
        );

        Ok(RunReport {
            run_id,
            query: query.to_owned(),
            location,
            state: RunState::Done,
            auctions,
            stats: RunStats {
                raw_count,
                dropped_empty_title,
                merged_duplicates,
                source_failures: failures,
            },
        })
    }

    /// Fetches from the primary tier concurrently, then from the fallback
    /// when every primary failed. Returns the per-adapter raw batches (with
    /// their provenance), whether any source succeeded, and the recorded
    /// failures.
    async fn fetch_all(
        &self,
        location: &LocationDescriptor,
        query: &str,
        deadline: Option<Instant>,
    ) -> (Vec<(SourceKind, Vec<RawListing>)>, bool, Vec<SourceFailure>) {
        let mut raw = Vec::new();
        let mut failures = Vec::new();
        let mut any_source_ok = false;

        let primaries: Vec<Arc<dyn ListingAdapter>> = if self.options.generated_primary {
            self.fallback.iter().cloned().collect()
        } else {
            self.web_adapters.clone()
        };

        let results = join_all(
            primaries
                .iter()
                .map(|adapter| self.fetch_one(adapter.as_ref(), location, query, deadline)),
        )
        .await;

        for (adapter, result) in primaries.iter().zip(results) {
            match result {
                Ok(listings) => {
                    any_source_ok = true;
                    raw.push((adapter.kind(), listings));
                }
                Err(e) => {
                    tracing::warn!(source = adapter.name(), error = %e, "source failed");
                    failures.push(SourceFailure {
                        source: adapter.name().to_owned(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        // Fallback tier: only when every primary failed and the generated
        // source was not already the primary.
        if !any_source_ok && !self.options.generated_primary {
            if let Some(fallback) = &self.fallback {
                tracing::info!(
                    source = fallback.name(),
                    "all web sources failed; falling back to generated listings"
                );
                match self
                    .fetch_one(fallback.as_ref(), location, query, deadline)
                    .await
                {
                    Ok(listings) => {
                        any_source_ok = true;
                        raw.push((fallback.kind(), listings));
                    }
                    Err(e) => {
                        tracing::warn!(source = fallback.name(), error = %e, "fallback failed");
                        failures.push(SourceFailure {
                            source: fallback.name().to_owned(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        (raw, any_source_ok, failures)
    }

    /// Invokes one adapter under the run deadline, retrying on rate
    /// limiting up to the configured count before treating the source as
    /// unavailable.
    async fn fetch_one(
        &self,
        adapter: &dyn ListingAdapter,
        location: &LocationDescriptor,
        query: &str,
        deadline: Option<Instant>,
    ) -> Result<Vec<RawListing>, AdapterError> {
        let mut attempt = 0u32;
        loop {
            let result = match deadline {
                Some(at) => match tokio::time::timeout_at(at, adapter.fetch(location, query)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(AdapterError::SourceUnavailable {
                        source: adapter.name().to_owned(),
                        reason: "run deadline exceeded; adapter call abandoned".to_owned(),
                    }),
                },
                None => adapter.fetch(location, query).await,
            };

            match result {
                Err(AdapterError::RateLimited {
                    source,
                    retry_after_secs,
                }) => {
                    if attempt >= self.options.rate_limit_retries {
                        return Err(AdapterError::SourceUnavailable {
                            source,
                            reason: format!(
                                "still rate limited after {attempt} retries (retry after {retry_after_secs}s)"
                            ),
                        });
                    }
                    attempt += 1;
                    let backoff = self
                        .options
                        .rate_limit_backoff_ms
                        .saturating_mul(1u64 << (attempt - 1).min(10));
                    let delay_ms = backoff.max(retry_after_secs.saturating_mul(1000));
                    tracing::warn!(
                        source,
                        attempt,
                        delay_ms,
                        "source rate limited — retrying after backoff"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
