//! Record to write-op expansion

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sign_store::{SignRow, WriteOp};
use sign_types::{slugify, LegacySign, NormalizationError, NormalizedSign, DEFAULT_CATEGORY_SLUG};

/// Write ops for one normalized catalog record, in dependency order.
///
/// Words and phrases get generated ids. A record without categories is linked
/// to the default category.
pub fn sign_ops(sign: NormalizedSign) -> Vec<WriteOp> {
    let id = sign.id;
    let mut ops = Vec::with_capacity(1 + sign.words.len() + 2 * sign.categories.len().max(1) + sign.phrases.len());

    ops.push(WriteOp::InsertSign(SignRow {
        id,
        ref_id: None,
        updated_at: sign.updated_at,
        video_url: sign.video_url,
        description: sign.description,
        deleted: false,
        unusual: sign.unusual,
        frequency: sign.frequency,
        transcription: sign.transcription,
        vocable: sign.vocable,
        hidden_words: (!sign.hidden_words.is_empty()).then_some(sign.hidden_words),
    }));

    ops.extend(sign.words.into_iter().map(|word| WriteOp::InsertWord {
        sign_id: id,
        id: None,
        word,
    }));

    let linked = push_category_links(
        &mut ops,
        id,
        sign.categories.into_iter().map(|c| (None, c.name, c.slug)),
    );
    if !linked {
        ops.push(default_category_link(id));
    }

    ops.extend(sign.phrases.into_iter().map(|p| WriteOp::InsertPhrase {
        sign_id: id,
        id: None,
        video_url: p.video_url,
        phrase: p.phrase,
    }));

    ops
}

/// Write ops for one legacy record with every identifier pinned.
///
/// Tags become categories whose slug is derived from the tag name, and
/// examples become phrases. A record without tags gets no category link here;
/// the loader links it with [`default_category_link`] once every pinned
/// category is written.
pub fn legacy_ops(sign: LegacySign) -> Result<Vec<WriteOp>, NormalizationError> {
    let id = parse_id(&sign.id)?;
    let ref_id = match sign.ref_id.trim() {
        "" => None,
        raw => Some(parse_id(raw)?),
    };

    let mut ops = vec![WriteOp::InsertSign(SignRow {
        id,
        ref_id,
        updated_at: parse_legacy_timestamp(&sign.updated_at)?,
        video_url: sign.video_url,
        description: sign.description,
        deleted: sign.deleted,
        unusual: sign.unusual,
        frequency: sign.frequency.filter(|f| !f.is_empty()),
        transcription: None,
        vocable: None,
        hidden_words: None,
    })];

    for word in sign.words {
        ops.push(WriteOp::InsertWord {
            sign_id: id,
            id: Some(parse_id(&word.id)?),
            word: word.word,
        });
    }

    let tags = sign
        .tags
        .into_iter()
        .map(|t| {
            let slug = slugify(&t.tag);
            Ok((Some(parse_id(&t.id)?), t.tag, slug))
        })
        .collect::<Result<Vec<_>, NormalizationError>>()?;
    push_category_links(&mut ops, id, tags);

    for example in sign.examples {
        ops.push(WriteOp::InsertPhrase {
            sign_id: id,
            id: Some(parse_id(&example.id)?),
            video_url: example.video_url,
            phrase: example.description,
        });
    }

    Ok(ops)
}

/// Link `sign_id` to the default category.
pub fn default_category_link(sign_id: i32) -> WriteOp {
    WriteOp::LinkCategory {
        sign_id,
        slug: DEFAULT_CATEGORY_SLUG.to_string(),
    }
}

fn push_category_links<I>(ops: &mut Vec<WriteOp>, sign_id: i32, categories: I) -> bool
where
    I: IntoIterator<Item = (Option<i32>, String, String)>,
{
    let mut linked = false;
    for (id, name, slug) in categories {
        ops.push(WriteOp::UpsertCategory {
            id,
            name,
            slug: slug.clone(),
        });
        ops.push(WriteOp::LinkCategory { sign_id, slug });
        linked = true;
    }
    linked
}

fn parse_id(raw: &str) -> Result<i32, NormalizationError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|e| NormalizationError::InvalidId {
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

/// Legacy timestamps come as RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or a bare
/// date. A missing timestamp means "now".
fn parse_legacy_timestamp(raw: &str) -> Result<DateTime<Utc>, NormalizationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Utc::now());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok() {
        return sign_types::parse_update_date(raw);
    }
    Err(NormalizationError::InvalidDate {
        value: raw.to_string(),
        reason: "expected RFC 3339, \"%Y-%m-%d %H:%M:%S\" or \"%Y-%m-%d\"".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sign_types::{CategoryRef, LegacyExample, LegacyTag, LegacyWord, NormalizedPhrase};

    fn normalized() -> NormalizedSign {
        NormalizedSign {
            id: 4,
            updated_at: Utc::now(),
            video_url: "http://media.test/4.mp4".into(),
            description: "d".into(),
            unusual: false,
            frequency: None,
            transcription: None,
            vocable: None,
            words: vec!["hej".into(), "hallå".into()],
            hidden_words: vec![],
            categories: vec![],
            phrases: vec![NormalizedPhrase {
                video_url: "http://media.test/p.mp4".into(),
                phrase: "hej på dig".into(),
            }],
        }
    }

    #[test]
    fn uncategorized_sign_links_default_category() {
        let ops = sign_ops(normalized());

        assert_eq!(ops.len(), 5);
        assert!(matches!(&ops[0], WriteOp::InsertSign(row) if row.id == 4 && row.hidden_words.is_none()));
        assert_eq!(
            ops[3],
            WriteOp::LinkCategory {
                sign_id: 4,
                slug: "odefinierade".into()
            }
        );
        assert!(!ops.iter().any(|op| matches!(op, WriteOp::UpsertCategory { .. })));
    }

    #[test]
    fn categories_are_upserted_before_linking() {
        let mut sign = normalized();
        sign.categories = vec![CategoryRef {
            name: "Djur".into(),
            slug: "djur".into(),
        }];
        sign.hidden_words = vec!["dold".into()];
        let ops = sign_ops(sign);

        assert!(matches!(&ops[0], WriteOp::InsertSign(row) if row.hidden_words == Some(vec!["dold".to_string()])));
        assert_eq!(
            ops[3],
            WriteOp::UpsertCategory {
                id: None,
                name: "Djur".into(),
                slug: "djur".into()
            }
        );
        assert_eq!(
            ops[4],
            WriteOp::LinkCategory {
                sign_id: 4,
                slug: "djur".into()
            }
        );
        assert!(!ops.iter().any(|op| matches!(op, WriteOp::LinkCategory { slug, .. } if slug == "odefinierade")));
    }

    #[test]
    fn legacy_record_pins_identifiers() {
        let sign = LegacySign {
            id: "12".into(),
            ref_id: "3".into(),
            updated_at: "2020-05-01T10:00:00+00:00".into(),
            tags: vec![LegacyTag {
                id: "7".into(),
                tag: "Mat & Dryck".into(),
            }],
            words: vec![LegacyWord {
                id: "30".into(),
                word: "äta".into(),
            }],
            examples: vec![LegacyExample {
                id: "90".into(),
                video_url: "http://media.test/e.mp4".into(),
                description: "jag äter".into(),
            }],
            ..Default::default()
        };
        let ops = legacy_ops(sign).unwrap();

        assert!(matches!(&ops[0], WriteOp::InsertSign(row) if row.id == 12 && row.ref_id == Some(3)));
        assert_eq!(
            ops[1],
            WriteOp::InsertWord {
                sign_id: 12,
                id: Some(30),
                word: "äta".into()
            }
        );
        assert_eq!(
            ops[2],
            WriteOp::UpsertCategory {
                id: Some(7),
                name: "Mat & Dryck".into(),
                slug: "mat-dryck".into()
            }
        );
        assert_eq!(
            ops[4],
            WriteOp::InsertPhrase {
                sign_id: 12,
                id: Some(90),
                video_url: "http://media.test/e.mp4".into(),
                phrase: "jag äter".into()
            }
        );
    }

    #[test]
    fn untagged_legacy_record_defers_default_link() {
        let sign = LegacySign {
            id: "13".into(),
            ..Default::default()
        };
        let ops = legacy_ops(sign).unwrap();

        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], WriteOp::InsertSign(row) if row.id == 13));
    }

    #[test]
    fn legacy_record_with_bad_id_is_rejected() {
        let sign = LegacySign {
            id: "twelve".into(),
            ..Default::default()
        };
        assert!(matches!(
            legacy_ops(sign),
            Err(NormalizationError::InvalidId { .. })
        ));
    }

    #[test]
    fn legacy_timestamp_formats() {
        assert_eq!(
            parse_legacy_timestamp("2020-05-01 10:00:00").unwrap().to_rfc3339(),
            "2020-05-01T10:00:00+00:00"
        );
        assert!(parse_legacy_timestamp("2020-05-01").is_ok());
        assert!(parse_legacy_timestamp("").is_ok());
        assert!(matches!(
            parse_legacy_timestamp("yesterday"),
            Err(NormalizationError::InvalidDate { .. })
        ));
    }
}
