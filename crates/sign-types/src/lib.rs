//! Data shapes shared by the sign-sync crates
//!
//! Three JSON shapes flow through the system:
//!
//! - [`CatalogEntry`] - one entry of the external dictionary catalog, fetched page by page
//! - [`CurrentSign`] - the "new schema" served by the current API (integer identifiers)
//! - [`LegacySign`] - the "old schema" consumed by legacy clients (string identifiers)
//!
//! Catalog entries are normalized into [`NormalizedSign`] before they are written
//! to the relational store. [`LegacyIndexes`] reconciles identifiers between the
//! legacy and the current numbering.

mod catalog;
mod index;
mod normalize;
pub mod serde_util;
mod sign;

pub use catalog::{CatalogCategory, CatalogEntry, CatalogPhrase};
pub use index::{LegacyIndexes, SignIndex, TagIndex};
pub use normalize::{
    normalize, parse_catalog_id, parse_update_date, slugify, split_words, CategoryRef,
    NormalizationError, NormalizedPhrase, NormalizedSign, WORD_SEPARATOR,
};
pub use sign::{
    CurrentExample, CurrentSign, CurrentTag, CurrentWord, LegacyExample, LegacySign, LegacyTag,
    LegacyWord,
};

/// Display name of the category every uncategorized sign is linked to
pub const DEFAULT_CATEGORY_NAME: &str = "Odefinierade";

/// Slug of the category every uncategorized sign is linked to
pub const DEFAULT_CATEGORY_SLUG: &str = "odefinierade";
