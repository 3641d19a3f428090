//! Country facet patch.
//!
//! Replaces the allowed values of the schema's `country` facet with every
//! extant country in the GOV.UK country register, sorted by name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, instrument};

use super::error::PatchError;
use super::schema::{default_schema_location, facet_mut, load_schema, save_schema};

/// Key of the facet this patch rewrites.
pub const COUNTRY_FACET: &str = "country";

/// One record from the country register.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CountryRecord {
    pub name: String,
    /// Set once a country has ceased to exist.
    #[serde(rename = "end-date", default)]
    pub end_date: Option<String>,
}

/// Country register records keyed by ISO code.
pub type CountryRegister = BTreeMap<String, CountryRecord>;

/// A facet option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllowedValue {
    pub label: String,
    pub value: String,
}

/// Extant countries as facet options, sorted by label.
#[must_use]
pub fn country_allowed_values(register: &CountryRegister) -> Vec<AllowedValue> {
    let mut values: Vec<AllowedValue> = register
        .iter()
        .filter(|(_, record)| record.end_date.as_deref().is_none_or(str::is_empty))
        .map(|(code, record)| AllowedValue {
            label: record.name.clone(),
            value: code.clone(),
        })
        .collect();
    values.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.value.cmp(&b.value)));
    values
}

/// Rewrites `facets[key=country].allowed_values` in `schema`.
///
/// Returns the number of countries written.
///
/// # Errors
///
/// Returns [`PatchError::MissingFacet`] if the schema has no country facet.
#[instrument(skip_all)]
pub fn patch_country_facet(
    schema: &mut Value,
    register: &CountryRegister,
) -> Result<usize, PatchError> {
    let facet = facet_mut(schema, COUNTRY_FACET)?;
    let values = country_allowed_values(register);
    let count = values.len();
    facet["allowed_values"] = values
        .into_iter()
        .map(|value| json!({ "label": value.label, "value": value.value }))
        .collect();
    Ok(count)
}

/// Reads a country register export (`{code: {name, end-date?}}`).
///
/// # Errors
///
/// Returns [`PatchError::Io`] or [`PatchError::Json`].
pub fn load_register(path: &Path) -> Result<CountryRegister, PatchError> {
    let content = std::fs::read_to_string(path).map_err(|source| PatchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| PatchError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Patches the country facet of a schema file in place.
#[derive(Debug, Clone)]
pub struct SchemaPatch {
    location: PathBuf,
}

impl SchemaPatch {
    /// Targets `location`, or the default schema location relative to the
    /// working directory.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::Io`] if no location is given and the working
    /// directory cannot be read.
    pub fn new(location: Option<PathBuf>) -> Result<Self, PatchError> {
        let location = match location {
            Some(location) => location,
            None => {
                let cwd = std::env::current_dir().map_err(|source| PatchError::Io {
                    path: PathBuf::from("."),
                    source,
                })?;
                default_schema_location(&cwd)
            }
        };
        Ok(Self { location })
    }

    #[must_use]
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Loads the schema, patches it from `register`, and writes it back.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::SchemaNotFound`] if the schema file is absent,
    /// [`PatchError::MissingFacet`] if it has no country facet, or an IO/JSON
    /// error. The file is left untouched on error.
    pub fn run(&self, register: &CountryRegister) -> Result<usize, PatchError> {
        let mut schema = load_schema(&self.location)?;
        let count = patch_country_facet(&mut schema, register)?;
        save_schema(&self.location, &schema)?;
        info!(path = %self.location.display(), countries = count, "patched country facet");
        Ok(count)
    }
}
