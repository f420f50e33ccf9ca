//! Load-or-build policy over an [`IndexStore`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use sign_types::{LegacyIndexes, SignIndex, TagIndex};
use std::future::Future;

use crate::{CacheError, IndexStore};

/// A value persisted as one named JSON artifact.
pub trait CachedArtifact: Serialize + DeserializeOwned {
    /// Storage key; the filesystem backend appends `.json`.
    const KEY: &'static str;
}

impl CachedArtifact for TagIndex {
    const KEY: &'static str = "tag_index";
}

impl CachedArtifact for SignIndex {
    const KEY: &'static str = "sign_index";
}

/// Whether `load_or_build` served the tables from storage or rebuilt them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Built,
}

pub struct IndexCache<S: IndexStore> {
    store: S,
}

impl<S: IndexStore> IndexCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn load<A: CachedArtifact>(&self) -> Result<Option<A>, CacheError> {
        let Some(bytes) = self.store.load(A::KEY).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| CacheError::Serde {
                key: A::KEY.to_string(),
                source,
            })
    }

    pub async fn save<A: CachedArtifact>(&self, artifact: &A) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(artifact).map_err(|source| CacheError::Serde {
            key: A::KEY.to_string(),
            source,
        })?;
        self.store.store(A::KEY, &bytes).await
    }

    /// Both tables, or None unless both artifacts are present.
    pub async fn load_indexes(&self) -> Result<Option<LegacyIndexes>, CacheError> {
        let tags = self.load::<TagIndex>().await?;
        let signs = self.load::<SignIndex>().await?;
        Ok(match (tags, signs) {
            (Some(tags), Some(signs)) => Some(LegacyIndexes::new(tags, signs)),
            _ => None,
        })
    }

    pub async fn save_indexes(&self, indexes: &LegacyIndexes) -> Result<(), CacheError> {
        self.save(&indexes.tags).await?;
        self.save(&indexes.signs).await
    }

    /// Delete both artifacts so the next `load_or_build` rebuilds.
    pub async fn invalidate(&self) -> Result<(), CacheError> {
        self.store.invalidate(TagIndex::KEY).await?;
        self.store.invalidate(SignIndex::KEY).await?;
        tracing::info!("Invalidated cached index tables");
        Ok(())
    }

    /// Return the cached tables when both artifacts exist; otherwise run
    /// `build`, persist its result and return it.
    ///
    /// A failed build leaves the store untouched.
    pub async fn load_or_build<F, Fut, E>(
        &self,
        build: F,
    ) -> Result<(LegacyIndexes, CacheStatus), CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<LegacyIndexes, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        if let Some(indexes) = self.load_indexes().await? {
            tracing::debug!(
                "Loaded cached index tables ({} tags, {} signs)",
                indexes.tags.len(),
                indexes.signs.len()
            );
            return Ok((indexes, CacheStatus::Hit));
        }

        tracing::info!("Index tables not cached, building");
        let indexes = build().await.map_err(|e| CacheError::Build(Box::new(e)))?;
        self.save_indexes(&indexes).await?;
        tracing::info!(
            "Built index tables ({} tags, {} signs)",
            indexes.tags.len(),
            indexes.signs.len()
        );
        Ok((indexes, CacheStatus::Built))
    }
}
