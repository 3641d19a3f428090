//! Patches for the specialist publisher's document schemas.

mod countries;
mod error;
mod schema;

pub use countries::{
    AllowedValue, COUNTRY_FACET, CountryRecord, CountryRegister, SchemaPatch,
    country_allowed_values, load_register, patch_country_facet,
};
pub use error::PatchError;
pub use schema::{DEFAULT_SCHEMA_RELATIVE_PATH, default_schema_location, facet_mut, load_schema, save_schema};
