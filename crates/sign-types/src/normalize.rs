//! Normalization of catalog entries into relational records

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use thiserror::Error;

use crate::CatalogEntry;

/// Separator used by the catalog to join alias words
pub const WORD_SEPARATOR: &str = ", ";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("invalid sign id {value:?}: {reason}")]
    InvalidId { value: String, reason: String },

    #[error("invalid update date {value:?}: {reason}")]
    InvalidDate { value: String, reason: String },
}

/// A catalog entry reduced to what the relational store keeps.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSign {
    pub id: i32,
    pub updated_at: DateTime<Utc>,
    pub video_url: String,
    pub description: String,
    pub unusual: bool,
    pub frequency: Option<String>,
    pub transcription: Option<String>,
    pub vocable: Option<String>,
    pub words: Vec<String>,
    pub hidden_words: Vec<String>,
    pub categories: Vec<CategoryRef>,
    pub phrases: Vec<NormalizedPhrase>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRef {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPhrase {
    pub video_url: String,
    pub phrase: String,
}

/// Normalize one catalog entry.
///
/// `media_base` is the catalog's own `scheme://host/` and is prefixed to every
/// relative media path.
pub fn normalize(entry: &CatalogEntry, media_base: &str) -> Result<NormalizedSign, NormalizationError> {
    let id = parse_catalog_id(&entry.id)?;
    let updated_at = parse_update_date(&entry.last_update)?;

    let frequency = non_empty(entry.frequency.as_deref().unwrap_or_default());

    Ok(NormalizedSign {
        id,
        updated_at,
        video_url: format!("{media_base}{}", entry.movie),
        description: entry.description.clone(),
        unusual: frequency.is_some(),
        frequency,
        transcription: non_empty(&entry.transcription),
        vocable: non_empty(&entry.glosa),
        words: split_words(&entry.also_means),
        hidden_words: split_words(&entry.hidden_also_means),
        categories: entry
            .categories
            .iter()
            .map(|c| CategoryRef {
                name: c.name.clone(),
                slug: c.slug.clone(),
            })
            .collect(),
        phrases: entry
            .phrases
            .iter()
            .map(|p| NormalizedPhrase {
                video_url: format!("{media_base}{}", p.movie),
                phrase: p.phrase.clone(),
            })
            .collect(),
    })
}

/// Parse a legacy-formatted catalog id such as `"00004"`.
///
/// One leading `0` is stripped before parsing; the remaining digits parse as decimal.
pub fn parse_catalog_id(raw: &str) -> Result<i32, NormalizationError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('0').unwrap_or(trimmed);
    digits
        .parse::<i32>()
        .map_err(|e| NormalizationError::InvalidId {
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a `YYYY-MM-DD` date as local midnight.
pub fn parse_update_date(raw: &str) -> Result<DateTime<Utc>, NormalizationError> {
    let invalid = |reason: String| NormalizationError::InvalidDate {
        value: raw.to_string(),
        reason,
    };

    let date = NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| invalid(e.to_string()))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| invalid("midnight out of range".to_string()))?;

    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| invalid("local midnight does not exist".to_string()))
}

/// Split a `", "`-joined list into trimmed, non-empty words, keeping order.
pub fn split_words(joined: &str) -> Vec<String> {
    joined
        .split(WORD_SEPARATOR)
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Derive a URL-safe slug from a display name.
///
/// Letters and digits (including non-ASCII letters) are lowercased and kept;
/// every other run of characters becomes a single `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
