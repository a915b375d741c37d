//! Similarity-based deduplication of normalized auctions.
//!
//! Sources disagree on capitalization, accents, and price formatting for
//! the same real-world lot. The dedup key folds those differences away;
//! each key group collapses to one representative whose fields are the most
//! complete values seen across the group.

use std::collections::HashMap;

use rust_decimal::Decimal;

use leilao_core::resolver::normalize_term;
use leilao_core::{Auction, SourceKind};

use crate::money::bucket_price;

/// Deduplication policy knobs.
///
/// Bucket width and stop words are policy choices, not constants: both are
/// exposed here (and through the environment) rather than hard-coded.
#[derive(Debug, Clone)]
pub struct DedupConfig {
    /// Prices within the same bucket of this width count as equal.
    pub price_bucket: Decimal,
    /// Words removed from titles before comparison.
    pub stop_words: Vec<String>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            price_bucket: Decimal::from(1000),
            stop_words: [
                "a", "o", "as", "os", "um", "uma", "de", "da", "do", "das", "dos", "em", "no",
                "na", "nos", "nas", "com", "para", "por", "e",
            ]
            .iter()
            .map(|w| (*w).to_string())
            .collect(),
        }
    }
}

/// Computes the similarity signature used to cluster auctions that likely
/// describe the same property: normalized title (stop words removed),
/// canonical location, and bucketed price.
#[must_use]
pub fn dedup_key(auction: &Auction, config: &DedupConfig) -> String {
    let title: String = normalize_term(&auction.title)
        .split_whitespace()
        .filter(|word| !config.stop_words.iter().any(|s| s == word))
        .collect::<Vec<_>>()
        .join(" ");

    let price = auction.price.map_or_else(
        || "none".to_owned(),
        |p| bucket_price(p, config.price_bucket).normalize().to_string(),
    );

    format!("{title}|{}|{price}", normalize_term(&auction.location))
}

/// Collapses near-identical auctions into unique representatives.
///
/// Deterministic for equal input multisets regardless of order. Output is
/// sorted by descending completeness, tie-broken by identifier. Every
/// output identifier comes from its group's representative (never freshly
/// invented) and no two outputs share a dedup key, so the operation is
/// idempotent.
#[must_use]
pub fn merge(auctions: Vec<Auction>, config: &DedupConfig) -> Vec<Auction> {
    let mut groups: HashMap<String, Vec<Auction>> = HashMap::new();
    for auction in auctions {
        groups
            .entry(dedup_key(&auction, config))
            .or_default()
            .push(auction);
    }

    let mut merged: Vec<Auction> = groups.into_values().filter_map(collapse_group).collect();

    merged.sort_by(|a, b| {
        completeness(b)
            .cmp(&completeness(a))
            .then_with(|| a.id.cmp(&b.id))
    });
    merged
}

/// Collapses one key group to a single auction.
///
/// The representative is chosen by preferring scraped provenance (live data
/// is higher fidelity than generated), then completeness, then identifier
/// for determinism. Missing fields on the representative are filled from
/// the rest of the group: first non-null price, longest description, first
/// non-empty image set and status.
fn collapse_group(mut group: Vec<Auction>) -> Option<Auction> {
    group.sort_by(|a, b| {
        kind_rank(a.source_kind)
            .cmp(&kind_rank(b.source_kind))
            .then_with(|| completeness(b).cmp(&completeness(a)))
            .then_with(|| b.description.len().cmp(&a.description.len()))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut iter = group.into_iter();
    let mut representative = iter.next()?;

    for other in iter {
        if representative.price.is_none() {
            representative.price = other.price;
        }
        if other.description.len() > representative.description.len() {
            representative.description = other.description;
        }
        if representative.status.is_none() {
            representative.status = other.status;
        }
        if representative.auction_title.is_none() {
            representative.auction_title = other.auction_title;
        }
        if representative.images.is_empty() {
            representative.images = other.images;
        }
    }

    Some(representative)
}

fn kind_rank(kind: SourceKind) -> u8 {
    match kind {
        SourceKind::Scraped => 0,
        SourceKind::Generated => 1,
    }
}

/// Field-population score used for representative choice and output order.
fn completeness(auction: &Auction) -> u32 {
    u32::from(auction.price.is_some())
        + u32::from(!auction.description.is_empty())
        + u32::from(auction.status.is_some())
        + u32::from(auction.auction_title.is_some())
        + u32::from(!auction.images.is_empty())
}

#[cfg(test)]
#[path = "dedup_test.rs"]
mod tests;
