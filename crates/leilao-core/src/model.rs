//! Canonical data model shared by every pipeline stage.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Provenance of an [`Auction`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Extracted from a live auction website.
    Scraped,
    /// Synthesized by a language model when no live data was obtainable.
    Generated,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Scraped => write!(f, "scraped"),
            SourceKind::Generated => write!(f, "generated"),
        }
    }
}

/// A loosely-structured candidate listing as produced by a single adapter
/// invocation, before normalization.
///
/// Every field is optional: adapters emit whatever they managed to extract,
/// and the normalizer decides what is usable. A listing missing its title is
/// dropped there, not here; adapters never abort a batch over one bad item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawListing {
    /// Property title as shown by the source. May be absent on partial
    /// extractions.
    #[serde(default)]
    pub title: Option<String>,

    /// Price text exactly as the source printed it, e.g. `"R$ 350.000,00"`
    /// or `"preço a consultar"`. Parsed (or not) during normalization.
    #[serde(default)]
    pub price_text: Option<String>,

    /// Free-form description. Detail-page enrichment may replace a short
    /// summary with the full lot description.
    #[serde(default)]
    pub description: Option<String>,

    /// Canonical URL of the lot, or a generation marker for synthetic items.
    #[serde(default)]
    pub source_url: Option<String>,

    /// Raw timestamp text from the source (e.g. the closing date). Kept
    /// verbatim; the pipeline never interprets it.
    #[serde(default)]
    pub captured_at: Option<String>,

    /// Auction status as printed, e.g. `"Aberto"`, `"Encerrado"`.
    #[serde(default)]
    pub status: Option<String>,

    /// Title of the auction event this lot belongs to.
    #[serde(default)]
    pub auction_title: Option<String>,

    /// Image URLs for the lot.
    #[serde(default)]
    pub images: Vec<String>,
}

/// A normalized auction record.
///
/// Created only by the normalizer; after that the deduplicator's merge step
/// is the single place allowed to combine field values across duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auction {
    /// Deterministic identifier: SHA-256 over title, source reference, and
    /// canonical location name. Stable across runs for the same raw input.
    pub id: String,
    /// Non-empty after trimming; listings that fail this are dropped during
    /// normalization.
    pub title: String,
    /// Parsed price in BRL. `None` when the source's price text was not a
    /// number (the raw text is preserved in `description`).
    pub price: Option<Decimal>,
    pub description: String,
    /// Canonical location name this listing was resolved against.
    pub location: String,
    /// State code of the location, when known.
    pub state: Option<String>,
    pub source_kind: SourceKind,
    /// Source URL for scraped listings, generation marker for synthetic ones.
    pub source_ref: String,
    pub status: Option<String>,
    pub auction_title: Option<String>,
    pub images: Vec<String>,
    pub extracted_at: DateTime<Utc>,
}
