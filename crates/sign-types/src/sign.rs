//! Current ("new schema") and legacy ("old schema") sign shapes
//!
//! Both share one field layout. The current API uses integer identifiers, while
//! legacy clients expect every identifier rendered as a string.

use serde::{Deserialize, Serialize};

use crate::serde_util::{id_text, null_as_default};

/// A sign as served by the current API.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CurrentSign {
    pub id: i32,
    pub ref_id: Option<i32>,
    pub deleted: bool,
    pub unusual: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub video_url: String,
    pub updated_at: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    pub frequency: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<CurrentTag>,
    #[serde(deserialize_with = "null_as_default")]
    pub words: Vec<CurrentWord>,
    #[serde(deserialize_with = "null_as_default")]
    pub examples: Vec<CurrentExample>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CurrentTag {
    pub id: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub tag: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CurrentWord {
    pub id: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub word: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CurrentExample {
    pub id: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub video_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
}

/// A sign in the shape legacy clients consume.
///
/// Identifiers are decoded from either strings or integers, but always encoded as strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LegacySign {
    #[serde(deserialize_with = "id_text")]
    pub id: String,
    #[serde(deserialize_with = "id_text")]
    pub ref_id: String,
    pub deleted: bool,
    pub unusual: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub video_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub updated_at: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    pub frequency: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<LegacyTag>,
    #[serde(deserialize_with = "null_as_default")]
    pub words: Vec<LegacyWord>,
    #[serde(deserialize_with = "null_as_default")]
    pub examples: Vec<LegacyExample>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LegacyTag {
    #[serde(deserialize_with = "id_text")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tag: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LegacyWord {
    #[serde(deserialize_with = "id_text")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub word: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LegacyExample {
    #[serde(deserialize_with = "id_text")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub video_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_sign_tolerates_null_aggregates() {
        let json = r#"{
            "id": 12, "deleted": false, "unusual": true, "ref_id": 10,
            "video_url": "https://example.org/v.mp4", "updated_at": "2021-01-01T00:00:00+00:00",
            "description": "d", "frequency": "ovanlig",
            "tags": null, "words": [{"id": 3, "word": "hej"}], "examples": null
        }"#;
        let sign: CurrentSign = serde_json::from_str(json).unwrap();
        assert_eq!(sign.id, 12);
        assert_eq!(sign.ref_id, Some(10));
        assert!(sign.tags.is_empty());
        assert!(sign.examples.is_empty());
        assert_eq!(sign.words[0].word, "hej");
    }

    #[test]
    fn legacy_sign_encodes_identifiers_as_strings() {
        let sign = LegacySign {
            id: "5".to_string(),
            ref_id: "4".to_string(),
            tags: vec![LegacyTag {
                id: "9".to_string(),
                tag: "Some Tag".to_string(),
            }],
            ..Default::default()
        };
        let value = serde_json::to_value(&sign).unwrap();
        assert_eq!(value["id"], "5");
        assert_eq!(value["ref_id"], "4");
        assert_eq!(value["tags"][0]["id"], "9");
    }

    #[test]
    fn legacy_sign_accepts_numeric_identifiers() {
        let sign: LegacySign =
            serde_json::from_str(r#"{"id": 4, "ref_id": "004", "tags": [{"id": 9, "tag": "x"}]}"#)
                .unwrap();
        assert_eq!(sign.id, "4");
        assert_eq!(sign.ref_id, "004");
        assert_eq!(sign.tags[0].id, "9");
    }
}
