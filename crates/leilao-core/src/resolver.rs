//! Query-to-location resolution.
//!
//! Matching is total: a query that hits nothing in the catalog resolves to a
//! synthetic descriptor built from the raw input, never to an error.

use std::path::Path;

use crate::error::ConfigError;
use crate::locations::{load_locations, validate_locations, LocationDescriptor};

/// Immutable catalog of known locations, loaded once at startup and shared
/// read-only across concurrent adapter calls.
#[derive(Debug, Clone)]
pub struct Catalog {
    locations: Vec<LocationDescriptor>,
}

impl Catalog {
    /// Loads the catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = load_locations(path)?;
        Ok(Self {
            locations: file.locations,
        })
    }

    /// Builds a catalog from descriptors already in memory, applying the
    /// same validation as [`Catalog::load`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` on duplicate names or alias
    /// collisions.
    pub fn from_descriptors(locations: Vec<LocationDescriptor>) -> Result<Self, ConfigError> {
        validate_locations(&locations)?;
        Ok(Self { locations })
    }

    /// The static catalog, in configuration order.
    #[must_use]
    pub fn list_known(&self) -> &[LocationDescriptor] {
        &self.locations
    }

    /// Resolves a free-form query to a location descriptor.
    ///
    /// Match order: exact canonical name or key, exact alias, then partial
    /// (substring) match against aliases and canonical names with ties
    /// broken by shortest matched term, then configuration order. A query
    /// matching nothing yields a synthetic descriptor whose canonical name
    /// is the trimmed input.
    #[must_use]
    pub fn resolve(&self, query: &str) -> LocationDescriptor {
        let q = normalize_term(query);
        if q.is_empty() {
            return LocationDescriptor::synthetic(query);
        }

        // Exact: canonical name or key.
        for location in &self.locations {
            if normalize_term(&location.name) == q || normalize_term(&location.key) == q {
                return location.clone();
            }
        }

        // Exact: alias.
        for location in &self.locations {
            if location.aliases.iter().any(|a| normalize_term(a) == q) {
                return location.clone();
            }
        }

        // Partial: substring either way against aliases and names.
        // Tie-break: shortest matched term, then configuration order.
        let mut best: Option<(usize, usize, &LocationDescriptor)> = None;
        for (index, location) in self.locations.iter().enumerate() {
            let mut terms: Vec<String> = location
                .aliases
                .iter()
                .map(|a| normalize_term(a))
                .collect();
            terms.push(normalize_term(&location.name));

            for term in terms {
                if term.is_empty() || (!q.contains(&term) && !term.contains(&q)) {
                    continue;
                }
                let candidate = (term.len(), index);
                if best.is_none_or(|(len, idx, _)| candidate < (len, idx)) {
                    best = Some((term.len(), index, location));
                }
            }
        }

        if let Some((_, _, location)) = best {
            tracing::debug!(query, location = %location.name, "partial location match");
            return location.clone();
        }

        tracing::debug!(query, "no location match, building synthetic descriptor");
        LocationDescriptor::synthetic(query)
    }
}

/// Normalizes a term for matching: case-folded, diacritics stripped,
/// punctuation replaced by spaces, whitespace collapsed.
#[must_use]
pub fn normalize_term(s: &str) -> String {
    let folded: String = s
        .to_lowercase()
        .chars()
        .map(fold_diacritic)
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else {
                ' '
            }
        })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Maps accented characters common in Brazilian place names to their ASCII
/// base letter. Characters outside the table pass through unchanged.
fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}
