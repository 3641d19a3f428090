//! Loading, saving, and navigating publishing schema files.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use super::error::PatchError;

/// Schema location relative to the working directory, assuming
/// specialist-publisher-rebuild is checked out alongside this repository.
pub const DEFAULT_SCHEMA_RELATIVE_PATH: &str =
    "../specialist-publisher-rebuild/lib/documents/schemas/dfid_research_outputs.json";

/// Resolves [`DEFAULT_SCHEMA_RELATIVE_PATH`] against `cwd`, folding `..`.
#[must_use]
pub fn default_schema_location(cwd: &Path) -> PathBuf {
    let mut location = cwd.to_path_buf();
    for component in Path::new(DEFAULT_SCHEMA_RELATIVE_PATH).components() {
        match component {
            std::path::Component::ParentDir => {
                location.pop();
            }
            std::path::Component::CurDir => {}
            other => location.push(other),
        }
    }
    location
}

/// Reads and parses the schema at `path`.
///
/// # Errors
///
/// Returns [`PatchError::SchemaNotFound`] if the file does not exist,
/// [`PatchError::Io`] for other read failures, and [`PatchError::Json`] if
/// it does not parse.
pub fn load_schema(path: &Path) -> Result<Value, PatchError> {
    if !path.exists() {
        return Err(PatchError::SchemaNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|source| PatchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| PatchError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `schema` back to `path` as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`PatchError::Io`] if the write fails.
pub fn save_schema(path: &Path, schema: &Value) -> Result<(), PatchError> {
    let mut content = serde_json::to_string_pretty(schema).map_err(|source| PatchError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    content.push('\n');
    std::fs::write(path, content).map_err(|source| PatchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "schema written");
    Ok(())
}

/// Finds the facet whose `key` is `key` in the schema's `facets` array.
///
/// # Errors
///
/// Returns [`PatchError::MissingFacet`] if there is no such facet.
pub fn facet_mut<'a>(schema: &'a mut Value, key: &str) -> Result<&'a mut Value, PatchError> {
    schema
        .get_mut("facets")
        .and_then(Value::as_array_mut)
        .and_then(|facets| {
            facets
                .iter_mut()
                .find(|facet| facet.get("key").and_then(Value::as_str) == Some(key))
        })
        .ok_or_else(|| PatchError::missing_facet(key))
}
