//! Identifier reconciliation tables between the legacy and current numbering

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Case-folded tag name -> legacy tag id
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TagIndex(pub HashMap<String, i32>);

/// Legacy reference id -> legacy record id
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SignIndex(pub HashMap<i32, i32>);

impl TagIndex {
    /// Record `name -> id` unless the case-folded name was already seen.
    ///
    /// Returns `true` when the mapping was inserted.
    pub fn insert_first(&mut self, name: &str, id: i32) -> bool {
        let key = name.to_lowercase();
        if self.0.contains_key(&key) {
            return false;
        }
        self.0.insert(key, id);
        true
    }

    pub fn get(&self, name: &str) -> Option<i32> {
        self.0.get(&name.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl SignIndex {
    /// Record `ref_id -> id` unless `ref_id` was already seen.
    ///
    /// Returns `true` when the mapping was inserted.
    pub fn insert_first(&mut self, ref_id: i32, id: i32) -> bool {
        if self.0.contains_key(&ref_id) {
            return false;
        }
        self.0.insert(ref_id, id);
        true
    }

    pub fn get(&self, ref_id: i32) -> Option<i32> {
        self.0.get(&ref_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Both reconciliation tables, built together from one pass over legacy data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyIndexes {
    pub tags: TagIndex,
    pub signs: SignIndex,
}

impl LegacyIndexes {
    pub fn new(tags: TagIndex, signs: SignIndex) -> Self {
        Self { tags, signs }
    }

    /// Map a current sign id to its legacy id; unmapped ids pass through.
    pub fn remap_sign(&self, id: i32) -> i32 {
        self.signs.get(id).unwrap_or(id)
    }

    /// Map a tag to its legacy id by case-folded name; unmapped tags keep `id`.
    pub fn remap_tag(&self, name: &str, id: i32) -> i32 {
        self.tags.get(name).unwrap_or(id)
    }
}
