//! Location catalog: load and validate the YAML file mapping location keys
//! to canonical descriptors.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::resolver::normalize_term;

/// Canonical description of a supported location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationDescriptor {
    /// URL-safe key, e.g. `"balneario-camboriu"`.
    pub key: String,
    /// Canonical display name, e.g. `"Balneário Camboriú"`.
    pub name: String,
    /// Two-letter state code. `None` for synthetic descriptors built from
    /// unresolved queries.
    pub state: Option<String>,
    /// Alias strings matched case- and diacritic-insensitively.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Reference lot URL used to ground generated listings when no live
    /// data is obtainable for this location.
    #[serde(default)]
    pub fallback_url: Option<String>,
}

impl LocationDescriptor {
    /// Builds a degraded-but-valid descriptor for a query that matched
    /// nothing in the catalog. Unresolved locations are not an error.
    #[must_use]
    pub fn synthetic(query: &str) -> Self {
        let trimmed = query.trim();
        Self {
            key: slug(trimmed),
            name: trimmed.to_string(),
            state: None,
            aliases: vec![trimmed.to_string()],
            fallback_url: None,
        }
    }

    /// `true` when this descriptor came from the catalog rather than from
    /// an unresolved query. Generated listings are refused for unknown
    /// locations because there is nothing to ground them on.
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.state.is_some() || self.fallback_url.is_some()
    }
}

/// Generate a URL-safe slug from a location name.
#[must_use]
pub fn slug(name: &str) -> String {
    normalize_term(name)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Debug, Deserialize)]
pub struct LocationsFile {
    pub locations: Vec<LocationDescriptor>,
}

/// Load and validate the location catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation (empty names, duplicate canonical names, alias collisions
/// across locations).
pub fn load_locations(path: &Path) -> Result<LocationsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LocationsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let locations_file: LocationsFile = serde_yaml::from_str(&content)?;

    validate_locations(&locations_file.locations)?;

    Ok(locations_file)
}

/// Catalog invariants: canonical names unique after normalization; alias
/// sets pairwise disjoint across locations (an alias may repeat within one
/// location — accent variants often normalize to the same term).
pub(crate) fn validate_locations(locations: &[LocationDescriptor]) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();
    // normalized alias -> key of the location that claimed it
    let mut alias_owner: HashMap<String, String> = HashMap::new();

    for location in locations {
        if location.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "location name must be non-empty".to_string(),
            ));
        }

        let norm_name = normalize_term(&location.name);
        if !seen_names.insert(norm_name.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate location name: '{}'",
                location.name
            )));
        }

        for alias in &location.aliases {
            let norm_alias = normalize_term(alias);
            if norm_alias.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "location '{}' has an alias that normalizes to nothing",
                    location.name
                )));
            }
            if let Some(owner) = alias_owner.get(&norm_alias) {
                if owner != &location.key {
                    return Err(ConfigError::Validation(format!(
                        "alias '{alias}' of location '{}' collides with location '{owner}'",
                        location.name
                    )));
                }
            } else {
                alias_owner.insert(norm_alias, location.key.clone());
            }
        }
    }

    // An alias must not shadow another location's canonical name either.
    for location in locations {
        let norm_name = normalize_term(&location.name);
        if let Some(owner) = alias_owner.get(&norm_name) {
            if owner != &location.key {
                return Err(ConfigError::Validation(format!(
                    "canonical name '{}' is shadowed by an alias of location '{owner}'",
                    location.name
                )));
            }
        }
    }

    Ok(())
}
