//! Normalization from raw listings to canonical [`Auction`] records.
//!
//! The contract is total: every raw listing either becomes an auction or is
//! dropped (`None`); missing fields never raise. A dropped listing is one
//! with no usable identity (blank title); everything else degrades field by
//! field.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use leilao_core::locations::slug;
use leilao_core::{Auction, LocationDescriptor, RawListing, SourceKind};

use crate::money::parse_brl;

/// Normalizes one raw listing.
///
/// Returns `None` when the listing's title is empty after trimming — it
/// carries no usable identity and is dropped, not surfaced as an error.
/// An unparseable price yields a `None` price with the raw text appended to
/// the description for auditability.
#[must_use]
pub fn normalize(
    raw: RawListing,
    location: &LocationDescriptor,
    source_kind: SourceKind,
    extracted_at: DateTime<Utc>,
) -> Option<Auction> {
    let title = raw.title.as_deref().unwrap_or_default().trim().to_owned();
    if title.is_empty() {
        return None;
    }

    let source_ref = raw
        .source_url
        .clone()
        .unwrap_or_else(|| format!("unlisted://{}", slug(&title)));

    let price = raw.price_text.as_deref().and_then(parse_brl);

    let mut description = raw
        .description
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_owned();
    if price.is_none() {
        // Keep the original price text auditable when it did not parse.
        if let Some(price_text) = raw.price_text.as_deref().map(str::trim) {
            if !price_text.is_empty() {
                if description.is_empty() {
                    description = format!("Preço anunciado: {price_text}");
                } else {
                    description = format!("{description}\n\nPreço anunciado: {price_text}");
                }
            }
        }
    }

    Some(Auction {
        id: auction_id(&title, &source_ref, &location.name),
        title,
        price,
        description,
        location: location.name.clone(),
        state: location.state.clone(),
        source_kind,
        source_ref,
        status: raw.status,
        auction_title: raw.auction_title,
        images: raw.images,
        extracted_at,
    })
}

/// Normalizes a batch, returning the surviving auctions and the count of
/// dropped listings.
#[must_use]
pub fn normalize_batch(
    raws: Vec<RawListing>,
    location: &LocationDescriptor,
    source_kind: SourceKind,
    extracted_at: DateTime<Utc>,
) -> (Vec<Auction>, usize) {
    let total = raws.len();
    let auctions: Vec<Auction> = raws
        .into_iter()
        .filter_map(|raw| normalize(raw, location, source_kind, extracted_at))
        .collect();
    let dropped = total - auctions.len();
    if dropped > 0 {
        tracing::debug!(dropped, total, "dropped listings with no usable title");
    }
    (auctions, dropped)
}

/// Deterministic identifier: SHA-256 over the case-folded title, source
/// reference, and canonical location name. The same raw input produces the
/// same identifier across runs.
#[must_use]
pub fn auction_id(title: &str, source_ref: &str, location_name: &str) -> String {
    let input = format!(
        "{}|{}|{}",
        title.to_lowercase(),
        source_ref.to_lowercase(),
        location_name.to_lowercase()
    );
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn itapiruba() -> LocationDescriptor {
        LocationDescriptor {
            key: "itapiruba".to_string(),
            name: "Itapiruba".to_string(),
            state: Some("SC".to_string()),
            aliases: vec![],
            fallback_url: None,
        }
    }

    fn raw(title: &str, price_text: Option<&str>) -> RawListing {
        RawListing {
            title: Some(title.to_string()),
            price_text: price_text.map(str::to_owned),
            description: Some("Casa de alvenaria".to_string()),
            source_url: Some("https://example.com/lote/1".to_string()),
            ..RawListing::default()
        }
    }

    #[test]
    fn normalizes_price_text_to_decimal() {
        let auction = normalize(
            raw("Casa na Praia", Some("R$ 350.000,00")),
            &itapiruba(),
            SourceKind::Scraped,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(auction.price, Some(Decimal::from_str("350000.00").unwrap()));
        assert_eq!(auction.description, "Casa de alvenaria");
    }

    #[test]
    fn unparseable_price_is_retained_in_description() {
        let auction = normalize(
            raw("Casa na Praia", Some("preço a consultar")),
            &itapiruba(),
            SourceKind::Scraped,
            Utc::now(),
        )
        .unwrap();
        assert!(auction.price.is_none());
        assert!(auction.description.contains("preço a consultar"));
    }

    #[test]
    fn blank_title_is_dropped() {
        let listing = RawListing {
            title: Some("   ".to_string()),
            ..RawListing::default()
        };
        assert!(normalize(listing, &itapiruba(), SourceKind::Scraped, Utc::now()).is_none());

        let listing = RawListing::default();
        assert!(normalize(listing, &itapiruba(), SourceKind::Scraped, Utc::now()).is_none());
    }

    #[test]
    fn title_is_trimmed() {
        let auction = normalize(
            raw("  Casa na Praia  ", None),
            &itapiruba(),
            SourceKind::Scraped,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(auction.title, "Casa na Praia");
    }

    #[test]
    fn identifier_is_stable_across_runs() {
        let a = normalize(
            raw("Casa na Praia", Some("R$ 100.000,00")),
            &itapiruba(),
            SourceKind::Scraped,
            Utc::now(),
        )
        .unwrap();
        let b = normalize(
            raw("Casa na Praia", Some("R$ 100.000,00")),
            &itapiruba(),
            SourceKind::Scraped,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.len(), 64, "SHA-256 hex is 64 chars");
    }

    #[test]
    fn identifier_depends_on_location() {
        let other = LocationDescriptor {
            key: "florianopolis".to_string(),
            name: "Florianópolis".to_string(),
            state: Some("SC".to_string()),
            aliases: vec![],
            fallback_url: None,
        };
        let a = normalize(raw("Casa", None), &itapiruba(), SourceKind::Scraped, Utc::now())
            .unwrap();
        let b = normalize(raw("Casa", None), &other, SourceKind::Scraped, Utc::now()).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn missing_source_url_gets_stable_marker() {
        let listing = RawListing {
            title: Some("Casa na Praia".to_string()),
            ..RawListing::default()
        };
        let auction = normalize(listing, &itapiruba(), SourceKind::Scraped, Utc::now()).unwrap();
        assert_eq!(auction.source_ref, "unlisted://casa-na-praia");
    }

    #[test]
    fn normalize_batch_counts_drops() {
        let raws = vec![
            raw("Casa A", None),
            RawListing::default(),
            raw("Casa B", None),
            RawListing {
                title: Some("  ".to_string()),
                ..RawListing::default()
            },
        ];
        let (auctions, dropped) =
            normalize_batch(raws, &itapiruba(), SourceKind::Scraped, Utc::now());
        assert_eq!(auctions.len(), 2);
        assert_eq!(dropped, 2);
    }

    #[test]
    fn records_source_kind_and_location() {
        let auction = normalize(
            raw("Casa", None),
            &itapiruba(),
            SourceKind::Generated,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(auction.source_kind, SourceKind::Generated);
        assert_eq!(auction.location, "Itapiruba");
        assert_eq!(auction.state.as_deref(), Some("SC"));
    }
}
