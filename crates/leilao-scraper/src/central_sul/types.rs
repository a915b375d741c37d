//! Central Sul Leilões search API response types.
//!
//! Observed shape of `POST /api/v2/web/search/lot`: a JSON envelope with a
//! `data` array of lot objects. Lot fields are pre-formatted strings
//! (`evaluation_formated`, `minimum_bid_formated`) in Brazilian money
//! notation; parsing them into numbers happens downstream during
//! normalization, never here. Every field is modeled as optional — partial
//! lots must still produce partial raw listings.

use serde::Deserialize;

use leilao_core::RawListing;

/// Envelope of the lot search endpoint.
#[derive(Debug, Deserialize)]
pub struct LotSearchResponse {
    /// Lots kept as raw JSON values so one malformed element never fails
    /// the whole batch; each is converted individually.
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

/// A single lot from the search API.
#[derive(Debug, Deserialize)]
pub struct Lot {
    #[serde(default)]
    pub title: Option<String>,

    /// URL slug; the lot page is `{base}/lote/{slug}`.
    #[serde(default)]
    pub slug: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Evaluation price as printed, e.g. `"R$ 350.000,00"`.
    #[serde(default)]
    pub evaluation_formated: Option<String>,

    /// Minimum bid as printed. Used as the price text when no evaluation
    /// is present.
    #[serde(default)]
    pub minimum_bid_formated: Option<String>,

    /// Current bid as printed.
    #[serde(default)]
    pub bid_formated: Option<String>,

    /// Raw closing timestamp text.
    #[serde(default)]
    pub closing_at: Option<String>,

    /// Lot status as printed, e.g. `"Aberto"`.
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub auction: Option<LotAuction>,

    #[serde(default)]
    pub images: Vec<LotImage>,
}

/// The auction event a lot belongs to.
#[derive(Debug, Deserialize)]
pub struct LotAuction {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LotImage {
    #[serde(default)]
    pub url: Option<String>,
}

impl Lot {
    /// Converts the lot into the adapter-neutral raw listing shape.
    ///
    /// Price text preference: evaluation, then minimum bid, then current
    /// bid — the evaluation is the closest thing the site prints to a
    /// market price.
    pub fn into_raw(self, base_url: &str) -> RawListing {
        let source_url = self
            .slug
            .as_deref()
            .map(|slug| format!("{}/lote/{slug}", base_url.trim_end_matches('/')));

        let price_text = self
            .evaluation_formated
            .or(self.minimum_bid_formated)
            .or(self.bid_formated);

        RawListing {
            title: self.title,
            price_text,
            description: self.description,
            source_url,
            captured_at: self.closing_at,
            status: self.status,
            auction_title: self.auction.and_then(|a| a.title),
            images: self.images.into_iter().filter_map(|i| i.url).collect(),
        }
    }
}
