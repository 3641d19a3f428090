//! Error types for schema patching.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while patching a publishing schema.
#[derive(Debug, Error)]
pub enum PatchError {
    /// The schema file to patch does not exist.
    #[error("schema not found at {}\n  Suggestion: pass --schema or check out specialist-publisher-rebuild next to this repository", path.display())]
    SchemaNotFound {
        /// Where the schema was expected.
        path: PathBuf,
    },

    /// The schema has no facet with the given key.
    #[error("No {facet} facet found")]
    MissingFacet {
        /// Key of the missing facet.
        facet: String,
    },

    /// File system error reading or writing a file.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A schema or register file is not valid JSON of the expected shape.
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        /// The offending file.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

impl PatchError {
    /// Creates a `MissingFacet` error.
    #[must_use]
    pub fn missing_facet(facet: &str) -> Self {
        Self::MissingFacet {
            facet: facet.to_string(),
        }
    }
}
