//! External catalog entry shape

use serde::Deserialize;

use crate::serde_util::null_as_default;

/// A single entry as published by the external dictionary catalog.
///
/// Every textual field is optional on the wire; missing or `null` values decode
/// as empty strings so that normalization decides what is meaningful.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogEntry {
    /// Legacy-formatted identifier, e.g. `"00004"`
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub word: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    /// Date of the last change, `YYYY-MM-DD`
    #[serde(deserialize_with = "null_as_default")]
    pub last_update: String,
    #[serde(deserialize_with = "null_as_default")]
    pub category: String,
    /// Canonical form (gloss)
    #[serde(deserialize_with = "null_as_default")]
    pub glosa: String,
    pub frequency: Option<String>,
    /// Media path relative to the catalog host
    #[serde(deserialize_with = "null_as_default")]
    pub movie: String,
    #[serde(deserialize_with = "null_as_default")]
    pub transcription: String,
    /// Alias words joined with `", "`
    #[serde(deserialize_with = "null_as_default")]
    pub also_means: String,
    /// Search-only alias words joined with `", "`
    #[serde(deserialize_with = "null_as_default")]
    pub hidden_also_means: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phrases: Vec<CatalogPhrase>,
    #[serde(deserialize_with = "null_as_default")]
    pub categories: Vec<CatalogCategory>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogPhrase {
    #[serde(deserialize_with = "null_as_default")]
    pub phrase: String,
    #[serde(deserialize_with = "null_as_default")]
    pub movie: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogCategory {
    #[serde(deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
}
