//! LLM-backed listing source.
//!
//! [`GeneratedAdapter`] asks the completion client for a bounded number of
//! synthetic listings and validates every element of the answer: items that
//! do not parse into the raw-listing shape are discarded and counted, never
//! propagated. The adapter refuses to fabricate data for locations it knows
//! nothing about.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;

use leilao_core::{AdapterError, ListingAdapter, LocationDescriptor, RawListing, SourceKind};

use crate::client::CompletionClient;
use crate::prompt::generation_prompt;

const SOURCE: &str = "generated";

/// Placeholder shown for generated lots, matching the generic image the
/// live site uses for lots without photos.
const PLACEHOLDER_IMAGE: &str =
    "https://centralsuldeleiloes.blob.core.windows.net/imagens/FOTOS_DIVERSAS/GENERICAS/generica-imovel.jpg";

/// [`ListingAdapter`] that synthesizes listings through a language model.
pub struct GeneratedAdapter<C> {
    client: C,
    max_items: usize,
}

impl<C: CompletionClient> GeneratedAdapter<C> {
    pub fn new(client: C, max_items: usize) -> Self {
        Self { client, max_items }
    }
}

/// One element of the model's `auctions` array. Only the title is required;
/// an element without a usable title fails validation and is discarded.
#[derive(Debug, Deserialize)]
struct GeneratedListing {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    evaluation: Option<String>,
    #[serde(default)]
    minimum_bid: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    auction_title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    images: Vec<String>,
}

#[async_trait]
impl<C: CompletionClient> ListingAdapter for GeneratedAdapter<C> {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Generated
    }

    async fn fetch(
        &self,
        location: &LocationDescriptor,
        query: &str,
    ) -> Result<Vec<RawListing>, AdapterError> {
        // A synthetic descriptor has no state and no reference lot; there is
        // nothing to ground generated data on.
        if !location.is_known() {
            return Err(AdapterError::GenerationUnavailable {
                reason: format!(
                    "location '{}' has unknown state and no reference lot; refusing to fabricate listings",
                    location.name
                ),
            });
        }

        let (system, user) = generation_prompt(location, query, self.max_items);
        let text = self.client.complete(&system, &user).await.map_err(|e| {
            AdapterError::GenerationUnavailable {
                reason: e.to_string(),
            }
        })?;

        let (mut listings, discarded) = parse_generated(&text, location)?;
        if discarded > 0 {
            tracing::warn!(
                discarded,
                location = %location.name,
                "discarded generated items that did not parse"
            );
        }
        listings.truncate(self.max_items);

        tracing::info!(
            count = listings.len(),
            location = %location.name,
            query,
            "generated auction listings"
        );
        Ok(listings)
    }
}

/// Parses the model's text into raw listings.
///
/// Accepts a bare JSON array or an object wrapping one (the JSON-object
/// response mode forces a wrapper; `auctions` is the requested key but
/// common synonyms are tolerated). Markdown code fences around the JSON are
/// stripped. Returns the listings plus the count of discarded elements.
///
/// # Errors
///
/// Returns [`AdapterError::GenerationUnavailable`] when the text as a whole
/// has no usable structure — not valid JSON, or no array anywhere in it.
fn parse_generated(
    text: &str,
    location: &LocationDescriptor,
) -> Result<(Vec<RawListing>, usize), AdapterError> {
    let stripped = strip_code_fences(text);
    let value: serde_json::Value =
        serde_json::from_str(stripped).map_err(|e| AdapterError::GenerationUnavailable {
            reason: format!("model output is not valid JSON: {e}"),
        })?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => {
            let array = ["auctions", "listings", "items", "data"]
                .iter()
                .find_map(|key| map.get(*key).and_then(|v| v.as_array()).cloned());
            array.ok_or_else(|| AdapterError::GenerationUnavailable {
                reason: "model output contains no listing array".to_owned(),
            })?
        }
        _ => {
            return Err(AdapterError::GenerationUnavailable {
                reason: "model output is neither an array nor an object".to_owned(),
            })
        }
    };

    let mut listings = Vec::with_capacity(items.len());
    let mut discarded = 0usize;

    for item in items {
        match serde_json::from_value::<GeneratedListing>(item) {
            Ok(generated) => match into_raw(generated, location) {
                Some(raw) => listings.push(raw),
                None => discarded += 1,
            },
            Err(e) => {
                discarded += 1;
                tracing::debug!(error = %e, "generated item does not match the listing shape");
            }
        }
    }

    Ok((listings, discarded))
}

/// Validates one generated element into the raw-listing shape. `None` means
/// the element carries no usable identity and is discarded.
fn into_raw(generated: GeneratedListing, location: &LocationDescriptor) -> Option<RawListing> {
    let title = generated.title.filter(|t| !t.trim().is_empty())?;

    let source_url = generated
        .url
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| generation_marker(location, &title));

    let images = if generated.images.is_empty() {
        vec![PLACEHOLDER_IMAGE.to_owned()]
    } else {
        generated.images
    };

    Some(RawListing {
        title: Some(title),
        price_text: generated.evaluation.or(generated.minimum_bid),
        description: generated.description,
        source_url: Some(source_url),
        captured_at: None,
        status: generated.status,
        auction_title: generated.auction_title,
        images,
    })
}

/// Builds a stable marker URI for a generated listing that the model did not
/// give a URL. Title-derived, so the same generated item keeps the same
/// identity across runs.
fn generation_marker(location: &LocationDescriptor, title: &str) -> String {
    let encoded = utf8_percent_encode(&title.to_lowercase(), NON_ALPHANUMERIC).to_string();
    format!("generated://{}/{encoded}", location.key)
}

/// Removes a surrounding markdown code fence (```json ... ```), which chat
/// models add even when asked for raw JSON.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string ("json") on the opening fence line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.rsplit_once("```").map_or(rest, |(body, _)| body).trim()
}
