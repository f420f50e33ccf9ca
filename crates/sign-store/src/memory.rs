//! In-memory store with the same constraint semantics as the PostgreSQL schema.
//!
//! Used by tests across the workspace. Every batch is applied to a copy of the
//! state and committed only when all of its ops succeed.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use crate::{SignRow, SignStore, StoreError, WriteOp};

#[derive(Debug, Clone, PartialEq)]
pub struct WordRow {
    pub id: i32,
    pub sign_id: i32,
    pub word: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRow {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhraseRow {
    pub id: i32,
    pub sign_id: i32,
    pub video_url: String,
    pub phrase: String,
}

/// Table contents plus the next value of each identity column.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryState {
    pub signs: BTreeMap<i32, SignRow>,
    pub words: BTreeMap<i32, WordRow>,
    pub categories: BTreeMap<i32, CategoryRow>,
    pub phrases: BTreeMap<i32, PhraseRow>,
    /// `(sign_id, category_id)`
    pub links: BTreeSet<(i32, i32)>,
    next_word_id: i32,
    next_category_id: i32,
    next_phrase_id: i32,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            signs: BTreeMap::new(),
            words: BTreeMap::new(),
            categories: BTreeMap::new(),
            phrases: BTreeMap::new(),
            links: BTreeSet::new(),
            next_word_id: 1,
            next_category_id: 1,
            next_phrase_id: 1,
        }
    }
}

impl MemoryState {
    fn require_sign(&self, sign_id: i32, table: &str) -> Result<(), StoreError> {
        if self.signs.contains_key(&sign_id) {
            Ok(())
        } else {
            Err(StoreError::Write(format!(
                "insert into {table} violates foreign key: sign {sign_id} does not exist"
            )))
        }
    }

    fn category_by_slug(&self, slug: &str) -> Option<&CategoryRow> {
        self.categories.values().find(|c| c.slug == slug)
    }

    fn apply(&mut self, op: &WriteOp) -> Result<(), StoreError> {
        match op {
            WriteOp::InsertSign(row) => {
                if self.signs.contains_key(&row.id) {
                    return Err(StoreError::Write(format!(
                        "duplicate key value violates signs_pkey: {}",
                        row.id
                    )));
                }
                self.signs.insert(row.id, row.clone());
            }
            WriteOp::InsertWord { sign_id, id, word } => {
                self.require_sign(*sign_id, "words")?;
                let id = take_id(*id, &mut self.next_word_id);
                if self.words.contains_key(&id) {
                    return Err(duplicate("words", id));
                }
                self.words.insert(
                    id,
                    WordRow {
                        id,
                        sign_id: *sign_id,
                        word: word.clone(),
                    },
                );
            }
            WriteOp::UpsertCategory { id, name, slug } => {
                if self.category_by_slug(slug).is_some() {
                    return Ok(());
                }
                let id = take_id(*id, &mut self.next_category_id);
                if let Some(existing) = self.categories.get(&id) {
                    return Err(StoreError::Write(format!(
                        "duplicate key value violates categories_pkey: {id} is already {:?}, cannot insert {slug:?}",
                        existing.slug
                    )));
                }
                self.categories.insert(
                    id,
                    CategoryRow {
                        id,
                        name: name.clone(),
                        slug: slug.clone(),
                    },
                );
            }
            WriteOp::LinkCategory { sign_id, slug } => {
                let Some(category_id) = self.category_by_slug(slug).map(|c| c.id) else {
                    return Err(StoreError::Write(format!(
                        "null value in column category_id of signs_categories: no category with slug {slug:?}"
                    )));
                };
                self.require_sign(*sign_id, "signs_categories")?;
                self.links.insert((*sign_id, category_id));
            }
            WriteOp::InsertPhrase {
                sign_id,
                id,
                video_url,
                phrase,
            } => {
                self.require_sign(*sign_id, "phrases")?;
                let id = take_id(*id, &mut self.next_phrase_id);
                if self.phrases.contains_key(&id) {
                    return Err(duplicate("phrases", id));
                }
                self.phrases.insert(
                    id,
                    PhraseRow {
                        id,
                        sign_id: *sign_id,
                        video_url: video_url.clone(),
                        phrase: phrase.clone(),
                    },
                );
            }
        }
        Ok(())
    }
}

fn take_id(pinned: Option<i32>, next: &mut i32) -> i32 {
    match pinned {
        Some(id) => id,
        None => {
            let id = *next;
            *next += 1;
            id
        }
    }
}

fn duplicate(table: &str, id: i32) -> StoreError {
    StoreError::Write(format!("duplicate key value violates {table}_pkey: {id}"))
}

#[derive(Debug, Default)]
struct Inner {
    state: MemoryState,
    flushes: usize,
    fail_after: Option<usize>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means a test panicked mid-batch; the state is still readable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reject every batch once `n` batches have been committed.
    pub fn fail_after_flushes(&self, n: usize) {
        self.lock().fail_after = Some(n);
    }

    /// Number of committed batches
    pub fn flush_count(&self) -> usize {
        self.lock().flushes
    }

    pub fn snapshot(&self) -> MemoryState {
        self.lock().state.clone()
    }

    pub fn signs(&self) -> Vec<SignRow> {
        self.lock().state.signs.values().cloned().collect()
    }

    pub fn sign(&self, id: i32) -> Option<SignRow> {
        self.lock().state.signs.get(&id).cloned()
    }

    pub fn categories(&self) -> Vec<CategoryRow> {
        self.lock().state.categories.values().cloned().collect()
    }

    /// Words of `sign_id` in insertion order
    pub fn words_of(&self, sign_id: i32) -> Vec<String> {
        self.lock()
            .state
            .words
            .values()
            .filter(|w| w.sign_id == sign_id)
            .map(|w| w.word.clone())
            .collect()
    }

    pub fn phrases_of(&self, sign_id: i32) -> Vec<PhraseRow> {
        self.lock()
            .state
            .phrases
            .values()
            .filter(|p| p.sign_id == sign_id)
            .cloned()
            .collect()
    }

    /// Slugs of the categories linked to `sign_id`
    pub fn category_slugs_of(&self, sign_id: i32) -> Vec<String> {
        let inner = self.lock();
        inner
            .state
            .links
            .iter()
            .filter(|(s, _)| *s == sign_id)
            .filter_map(|(_, c)| inner.state.categories.get(c).map(|c| c.slug.clone()))
            .collect()
    }
}

#[async_trait]
impl SignStore for MemoryStore {
    async fn truncate(&self) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let state = &mut inner.state;
        state.signs.clear();
        state.words.clear();
        state.phrases.clear();
        state.links.clear();
        state.next_word_id = 1;
        state.next_phrase_id = 1;
        Ok(())
    }

    async fn execute_batch(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.fail_after.is_some_and(|n| inner.flushes >= n) {
            return Err(StoreError::Write("injected batch failure".to_string()));
        }

        let mut next = inner.state.clone();
        for op in ops {
            next.apply(op)?;
        }
        inner.state = next;
        inner.flushes += 1;
        Ok(())
    }

    async fn sign_count(&self) -> Result<i64, StoreError> {
        Ok(self.lock().state.signs.len() as i64)
    }

    async fn sync_identities(&self) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let state = &mut inner.state;
        state.next_word_id = state.words.keys().max().map_or(1, |m| m + 1);
        state.next_category_id = state.categories.keys().max().map_or(1, |m| m + 1);
        state.next_phrase_id = state.phrases.keys().max().map_or(1, |m| m + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sign(id: i32) -> WriteOp {
        WriteOp::InsertSign(SignRow {
            id,
            ref_id: None,
            updated_at: Utc::now(),
            video_url: format!("http://media.test/{id}.mp4"),
            description: String::new(),
            deleted: false,
            unusual: false,
            frequency: None,
            transcription: None,
            vocable: None,
            hidden_words: None,
        })
    }

    #[tokio::test]
    async fn batch_is_all_or_nothing() {
        let store = MemoryStore::new();
        let err = store
            .execute_batch(&[
                sign(1),
                WriteOp::InsertWord {
                    sign_id: 2,
                    id: None,
                    word: "hej".into(),
                },
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Write(_)));
        assert_eq!(store.sign_count().await.unwrap(), 0);
        assert_eq!(store.flush_count(), 0);
    }

    #[tokio::test]
    async fn truncate_cascades_but_keeps_categories() {
        let store = MemoryStore::new();
        store.ensure_default_category().await.unwrap();
        store
            .execute_batch(&[
                sign(1),
                WriteOp::InsertWord {
                    sign_id: 1,
                    id: None,
                    word: "hej".into(),
                },
                WriteOp::LinkCategory {
                    sign_id: 1,
                    slug: "odefinierade".into(),
                },
            ])
            .await
            .unwrap();

        store.truncate().await.unwrap();

        let state = store.snapshot();
        assert!(state.signs.is_empty());
        assert!(state.words.is_empty());
        assert!(state.links.is_empty());
        assert_eq!(state.categories.len(), 1);
    }

    #[tokio::test]
    async fn category_upsert_keeps_first_and_links_once() {
        let store = MemoryStore::new();
        let upsert = |name: &str| WriteOp::UpsertCategory {
            id: None,
            name: name.to_string(),
            slug: "djur".to_string(),
        };
        let link = WriteOp::LinkCategory {
            sign_id: 1,
            slug: "djur".into(),
        };
        store
            .execute_batch(&[sign(1), upsert("Djur"), link.clone(), upsert("Animals"), link])
            .await
            .unwrap();

        let categories = store.categories();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Djur");
        assert_eq!(store.category_slugs_of(1), vec!["djur"]);
    }

    #[tokio::test]
    async fn pinned_category_id_taken_by_other_slug_is_rejected() {
        let store = MemoryStore::new();
        store.ensure_default_category().await.unwrap();

        let err = store
            .execute_batch(&[
                sign(10),
                WriteOp::UpsertCategory {
                    id: Some(1),
                    name: "Djur".into(),
                    slug: "djur".into(),
                },
                WriteOp::LinkCategory {
                    sign_id: 10,
                    slug: "djur".into(),
                },
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Write(msg) if msg.contains("categories_pkey")));
        assert!(store.sign(10).is_none());
        assert_eq!(store.categories().len(), 1);
    }

    #[tokio::test]
    async fn pinned_category_with_existing_slug_is_reused() {
        let store = MemoryStore::new();
        store.ensure_default_category().await.unwrap();
        store
            .execute_batch(&[
                sign(10),
                WriteOp::UpsertCategory {
                    id: Some(5),
                    name: "Odefinierade".into(),
                    slug: "odefinierade".into(),
                },
                WriteOp::LinkCategory {
                    sign_id: 10,
                    slug: "odefinierade".into(),
                },
            ])
            .await
            .unwrap();

        assert_eq!(store.categories().len(), 1);
        assert_eq!(store.category_slugs_of(10), vec!["odefinierade"]);
    }

    #[tokio::test]
    async fn link_to_missing_category_fails() {
        let store = MemoryStore::new();
        let err = store
            .execute_batch(&[
                sign(1),
                WriteOp::LinkCategory {
                    sign_id: 1,
                    slug: "saknas".into(),
                },
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Write(_)));
        assert_eq!(store.sign_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn pinned_ids_then_sync_identities() {
        let store = MemoryStore::new();
        store
            .execute_batch(&[
                sign(1),
                WriteOp::InsertWord {
                    sign_id: 1,
                    id: Some(40),
                    word: "a".into(),
                },
            ])
            .await
            .unwrap();
        store.sync_identities().await.unwrap();
        store
            .execute_batch(&[WriteOp::InsertWord {
                sign_id: 1,
                id: None,
                word: "b".into(),
            }])
            .await
            .unwrap();

        let ids: Vec<i32> = store.snapshot().words.keys().copied().collect();
        assert_eq!(ids, vec![40, 41]);
    }
}
