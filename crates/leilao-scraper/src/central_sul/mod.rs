//! Adapter for the Central Sul Leilões website.
//!
//! Search goes through the site's public lot-search API (`POST
//! /api/v2/web/search/lot`); results are filtered for relevance against the
//! resolved location's name and aliases, then optionally enriched with the
//! full description from each lot's detail page. A single malformed lot is
//! dropped and counted, never failing the batch.

mod detail;
pub mod types;

use async_trait::async_trait;

use leilao_core::resolver::normalize_term;
use leilao_core::{AdapterError, ListingAdapter, LocationDescriptor, RawListing, SourceKind};

use crate::error::FetchError;
use crate::fetcher::PageFetcher;
use types::{Lot, LotSearchResponse};

const SOURCE: &str = "central_sul";
const DEFAULT_BASE_URL: &str = "https://www.centralsuldeleiloes.com.br";

/// [`ListingAdapter`] for Central Sul Leilões.
pub struct CentralSulAdapter<F> {
    fetcher: F,
    base_url: String,
    fetch_descriptions: bool,
}

impl<F: PageFetcher> CentralSulAdapter<F> {
    /// Creates an adapter pointed at the production site.
    pub fn new(fetcher: F, fetch_descriptions: bool) -> Self {
        Self::with_base_url(fetcher, fetch_descriptions, DEFAULT_BASE_URL)
    }

    /// Creates an adapter with a custom base URL (for testing with wiremock).
    pub fn with_base_url(
        fetcher: F,
        fetch_descriptions: bool,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            fetcher,
            base_url,
            fetch_descriptions,
        }
    }

    fn search_url(&self) -> String {
        format!("{}/api/v2/web/search/lot", self.base_url)
    }

    /// Runs the lot search and converts each element individually so one
    /// malformed lot never aborts the rest.
    async fn search_lots(&self, query: &str) -> Result<Vec<RawListing>, FetchError> {
        let payload = serde_json::json!({
            "query": query,
            "city_slug": null,
            "category_slug": null,
        });
        let url = self.search_url();
        let body = self.fetcher.post_json(&url, &payload).await?;

        let response: LotSearchResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::MalformedContent {
                url: url.clone(),
                reason: format!("search response is not the expected JSON envelope: {e}"),
            })?;

        let total = response.data.len();
        let mut listings = Vec::with_capacity(total);
        let mut dropped = 0usize;
        for value in response.data {
            match serde_json::from_value::<Lot>(value) {
                Ok(lot) => listings.push(lot.into_raw(&self.base_url)),
                Err(e) => {
                    dropped += 1;
                    tracing::debug!(error = %e, "skipping malformed lot");
                }
            }
        }
        if dropped > 0 {
            tracing::warn!(dropped, total, "dropped malformed lots from search response");
        }

        Ok(listings)
    }

    /// Replaces each listing's short summary with the full description from
    /// its detail page. Per-lot failures are logged and skipped.
    async fn enrich_descriptions(&self, listings: &mut [RawListing]) {
        for listing in listings.iter_mut() {
            let Some(url) = listing.source_url.as_deref() else {
                continue;
            };
            match self.fetcher.get(url).await {
                Ok(html) => {
                    if let Some(description) = detail::extract_description(&html) {
                        listing.description = Some(description);
                    }
                }
                Err(e) => {
                    tracing::debug!(url, error = %e, "detail page fetch failed; keeping summary");
                }
            }
        }
    }

    /// Scrapes the location's configured reference lot when the search came
    /// back empty. Best-effort: any failure yields no listings.
    async fn fetch_fallback_lot(&self, location: &LocationDescriptor) -> Vec<RawListing> {
        let Some(url) = location.fallback_url.as_deref() else {
            return Vec::new();
        };
        tracing::info!(location = %location.name, url, "search empty; fetching reference lot");
        match self.fetcher.get(url).await {
            Ok(html) => {
                let title = detail::extract_title(&html);
                let description = detail::extract_description(&html);
                if title.is_none() && description.is_none() {
                    return Vec::new();
                }
                vec![RawListing {
                    title,
                    description,
                    source_url: Some(url.to_owned()),
                    ..RawListing::default()
                }]
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "reference lot fetch failed");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl<F: PageFetcher> ListingAdapter for CentralSulAdapter<F> {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Scraped
    }

    async fn fetch(
        &self,
        location: &LocationDescriptor,
        query: &str,
    ) -> Result<Vec<RawListing>, AdapterError> {
        let mut listings = self.search_lots(query).await.map_err(map_fetch_error)?;

        let variations = query_variations(location, query);
        let found = listings.len();
        listings.retain(|listing| is_relevant(listing, &variations));
        tracing::debug!(
            query,
            found,
            kept = listings.len(),
            "filtered lots for location relevance"
        );

        if listings.is_empty() {
            listings = self.fetch_fallback_lot(location).await;
        }

        if self.fetch_descriptions {
            self.enrich_descriptions(&mut listings).await;
        }

        Ok(listings)
    }
}

fn map_fetch_error(err: FetchError) -> AdapterError {
    match err {
        FetchError::RateLimited {
            retry_after_secs, ..
        } => AdapterError::RateLimited {
            source: SOURCE.to_owned(),
            retry_after_secs,
        },
        other => AdapterError::SourceUnavailable {
            source: SOURCE.to_owned(),
            reason: other.to_string(),
        },
    }
}

/// Builds the normalized terms whose presence marks a listing as relevant to
/// the resolved location: the query itself, the canonical name, every alias,
/// and the `name state` form.
fn query_variations(location: &LocationDescriptor, query: &str) -> Vec<String> {
    let mut variations = vec![normalize_term(query), normalize_term(&location.name)];
    variations.extend(location.aliases.iter().map(|a| normalize_term(a)));
    if let Some(state) = location.state.as_deref() {
        variations.push(normalize_term(&format!("{} {state}", location.name)));
    }
    variations.retain(|v| !v.is_empty());
    variations.sort();
    variations.dedup();
    variations
}

/// A listing is relevant when any variation occurs in its combined title,
/// description, and auction title, compared case- and diacritic-insensitively.
fn is_relevant(listing: &RawListing, variations: &[String]) -> bool {
    let text = normalize_term(&format!(
        "{} {} {}",
        listing.title.as_deref().unwrap_or_default(),
        listing.description.as_deref().unwrap_or_default(),
        listing.auction_title.as_deref().unwrap_or_default(),
    ));
    variations.iter().any(|v| text.contains(v.as_str()))
}

#[cfg(test)]
#[path = "central_sul_test.rs"]
mod tests;
