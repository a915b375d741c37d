//! Prompt construction for the generated-listings path.
//!
//! The prompts ask for output that mirrors what the scraper would have
//! extracted from the live site, so the rest of the pipeline cannot tell
//! the two apart except through the provenance field.

use leilao_core::LocationDescriptor;

/// Builds the (system, user) prompt pair for generating auction listings.
#[must_use]
pub fn generation_prompt(
    location: &LocationDescriptor,
    query: &str,
    max_items: usize,
) -> (String, String) {
    let state = location.state.as_deref().unwrap_or("Brasil");

    let mut system = format!(
        "You are an expert in Brazilian real estate auctions, especially properties \
         in {name}, {state}. You know the kind of lots Central Sul Leilões publishes \
         and can provide current auction listings. Provide realistic and accurate data \
         about properties that would be available in auctions; your results should look \
         exactly like what the actual website would return.",
        name = location.name,
    );
    if let Some(url) = location.fallback_url.as_deref() {
        system.push_str(&format!(
            " Use this reference lot as grounding context for the area: {url}"
        ));
    }

    let user = format!(
        "Generate up to {max_items} realistic auction listings for properties in \
         \"{query}\", focused on {name}, {state}. Include realistic details:\n\
         - property titles and descriptions in Portuguese\n\
         - evaluation prices around R$ 100.000,00 to R$ 5.000.000,00\n\
         - minimum bids at 40-60% of the evaluation\n\
         - auction status (e.g. \"Aberto\", \"Encerrado\") and realistic dates\n\n\
         Return a JSON object with an \"auctions\" array. Each element must have \
         these fields:\n\
         - title: property title\n\
         - description: detailed description\n\
         - evaluation: evaluation price formatted as \"R$ XXX.XXX,XX\"\n\
         - minimum_bid: minimum bid formatted the same way\n\
         - status: auction status\n\
         - auction_title: title of the auction event\n\
         - url: link to the auction (may be a placeholder)\n\
         - images: array of image URLs (may be placeholders)",
        name = location.name,
    );

    (system, user)
}
