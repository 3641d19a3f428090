//! DFID research output migration library
//!
//! Moves DFID research outputs (R4D) out of the linked-development RDF
//! triple-store and into specialist publisher documents.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`transform`] - Markup normalization, link rewriting, attachment
//!   classification, and document assembly
//! - [`fetch`] - Background attachment downloads
//! - [`assets`] - Destination asset storage
//! - [`patch`] - Schema facet patches (country list)
//! - [`config`] - Hosts, routes, and config file loading

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod assets;
pub mod config;
pub mod fetch;
pub mod patch;
pub mod transform;

// Re-export commonly used types
pub use assets::{AssetError, AssetResponse, AssetStore, DirectoryAssetStore};
pub use config::{MigrationConfig, load_config};
pub use fetch::{AttachmentFetcher, DownloadError, FetchTask, HttpFetcher};
pub use patch::{CountryRegister, PatchError, SchemaPatch, patch_country_facet};
pub use transform::{
    Attachment, AttachmentError, Document, DocumentError, FieldSource, FieldValue, normalize,
};
