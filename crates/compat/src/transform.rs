//! Streaming new-schema to old-schema transform

use chrono::{SecondsFormat, Utc};
use json_stream::JsonArrayWriter;
use sign_types::{
    CurrentSign, LegacyExample, LegacyIndexes, LegacySign, LegacyTag, LegacyWord,
};
use std::io::{Read, Write};

use crate::Error;

/// Render one current sign in the legacy shape.
///
/// The sign id and tag ids are remapped through `indexes`; anything without a
/// mapping keeps its current value. `ref_id` falls back to the remapped id when
/// the current sign has none.
pub fn to_legacy(sign: CurrentSign, indexes: &LegacyIndexes, stamped_at: &str) -> LegacySign {
    let id = indexes.remap_sign(sign.id);

    LegacySign {
        id: id.to_string(),
        ref_id: sign.ref_id.unwrap_or(id).to_string(),
        deleted: sign.deleted,
        unusual: sign.unusual,
        video_url: sign.video_url,
        updated_at: stamped_at.to_string(),
        description: sign.description,
        frequency: sign.frequency,
        tags: sign
            .tags
            .into_iter()
            .map(|t| LegacyTag {
                id: indexes.remap_tag(&t.tag, t.id).to_string(),
                tag: t.tag,
            })
            .collect(),
        words: sign
            .words
            .into_iter()
            .map(|w| LegacyWord {
                id: w.id.to_string(),
                word: w.word,
            })
            .collect(),
        examples: sign
            .examples
            .into_iter()
            .map(|e| LegacyExample {
                id: e.id.to_string(),
                video_url: e.video_url,
                description: e.description,
            })
            .collect(),
    }
}

/// Transform a JSON array of current signs read from `reader` into a JSON
/// array of legacy signs written to `writer`, one record at a time.
///
/// Every record is stamped with the time the transform started. Returns the
/// number of records written. On error the output is a truncated array.
pub fn transform_stream<R, W>(reader: R, writer: W, indexes: &LegacyIndexes) -> Result<usize, Error>
where
    R: Read,
    W: Write,
{
    let stamped_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut out = JsonArrayWriter::begin(writer).map_err(Error::Encode)?;

    json_stream::for_each_element(reader, |sign: CurrentSign| -> Result<(), Error> {
        out.write_element(&to_legacy(sign, indexes, &stamped_at))
            .map_err(Error::Encode)
    })?;

    let written = out.written();
    out.finish().map_err(Error::Encode)?;
    Ok(written)
}
