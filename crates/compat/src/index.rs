//! One-pass construction of the legacy index tables

use sign_types::{LegacyIndexes, LegacySign};
use std::io::Read;

use crate::Error;

/// Build the tag and sign index tables from a legacy JSON array.
///
/// Each record contributes `ref_id -> id` (records without a `ref_id` are
/// skipped) and one `lowercase(tag) -> tag id` entry per tag. The first
/// occurrence of a key wins.
pub fn build_indexes<R: Read>(reader: R) -> Result<LegacyIndexes, Error> {
    let mut indexes = LegacyIndexes::default();
    let mut position = 0usize;

    let records = json_stream::for_each_element(reader, |sign: LegacySign| -> Result<(), Error> {
        let parse = |field: &'static str, value: &str| {
            value
                .trim()
                .parse::<i32>()
                .map_err(|_| Error::InvalidLegacyId {
                    position,
                    record_id: sign.id.clone(),
                    field,
                    value: value.to_string(),
                })
        };

        let id = parse("id", &sign.id)?;
        if !sign.ref_id.is_empty() {
            indexes.signs.insert_first(parse("ref_id", &sign.ref_id)?, id);
        }
        for tag in &sign.tags {
            indexes.tags.insert_first(&tag.tag, parse("tag id", &tag.id)?);
        }

        position += 1;
        Ok(())
    })?;

    tracing::debug!(
        "Indexed {records} legacy records ({} tags, {} signs)",
        indexes.tags.len(),
        indexes.signs.len()
    );
    Ok(indexes)
}
