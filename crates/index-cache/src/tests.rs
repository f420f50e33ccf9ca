//! Unit tests for the index-cache crate.

use sign_types::{LegacyIndexes, SignIndex, TagIndex};
use std::cell::Cell;
use tempfile::TempDir;

use crate::{CacheError, CacheStatus, FilesystemStore, IndexCache, IndexStore, MemoryStore};

fn sample_indexes() -> LegacyIndexes {
    let mut indexes = LegacyIndexes::default();
    indexes.tags.insert_first("some tag", 5);
    indexes.signs.insert_first(4, 5);
    indexes
}

#[derive(Debug, thiserror::Error)]
#[error("legacy source unavailable")]
struct BuildFailed;

// ============================================================================
// load_or_build Tests
// ============================================================================

#[tokio::test]
async fn test_builds_once_then_hits() {
    let cache = IndexCache::new(MemoryStore::new());
    let builds = Cell::new(0);

    let build = || async {
        builds.set(builds.get() + 1);
        Ok::<_, BuildFailed>(sample_indexes())
    };

    let (first, status) = cache.load_or_build(build).await.unwrap();
    assert_eq!(status, CacheStatus::Built);
    assert_eq!(first, sample_indexes());

    let (second, status) = cache
        .load_or_build(|| async {
            builds.set(builds.get() + 1);
            Ok::<_, BuildFailed>(LegacyIndexes::default())
        })
        .await
        .unwrap();
    assert_eq!(status, CacheStatus::Hit);
    assert_eq!(second, sample_indexes());
    assert_eq!(builds.get(), 1);
}

#[tokio::test]
async fn test_invalidate_forces_rebuild() {
    let cache = IndexCache::new(MemoryStore::new());
    cache
        .load_or_build(|| async { Ok::<_, BuildFailed>(sample_indexes()) })
        .await
        .unwrap();

    cache.invalidate().await.unwrap();
    assert!(!cache.store().contains("tag_index"));
    assert!(!cache.store().contains("sign_index"));

    let (rebuilt, status) = cache
        .load_or_build(|| async { Ok::<_, BuildFailed>(LegacyIndexes::default()) })
        .await
        .unwrap();
    assert_eq!(status, CacheStatus::Built);
    assert!(rebuilt.signs.is_empty());
}

#[tokio::test]
async fn test_one_missing_artifact_means_rebuild() {
    let cache = IndexCache::new(MemoryStore::new());
    cache.save(&sample_indexes().tags).await.unwrap();

    assert!(cache.load_indexes().await.unwrap().is_none());
    let (_, status) = cache
        .load_or_build(|| async { Ok::<_, BuildFailed>(sample_indexes()) })
        .await
        .unwrap();
    assert_eq!(status, CacheStatus::Built);
}

#[tokio::test]
async fn test_failed_build_persists_nothing() {
    let cache = IndexCache::new(MemoryStore::new());
    let result = cache
        .load_or_build(|| async { Err::<LegacyIndexes, _>(BuildFailed) })
        .await;

    assert!(matches!(result, Err(CacheError::Build(_))));
    assert!(!cache.store().contains("tag_index"));
}

// ============================================================================
// FilesystemStore Tests
// ============================================================================

#[tokio::test]
async fn test_filesystem_artifacts_are_key_to_integer_objects() {
    let tmp = TempDir::new().unwrap();
    let cache = IndexCache::new(FilesystemStore::new(tmp.path()));
    cache.save_indexes(&sample_indexes()).await.unwrap();

    let tags = std::fs::read_to_string(tmp.path().join("tag_index.json")).unwrap();
    let signs = std::fs::read_to_string(tmp.path().join("sign_index.json")).unwrap();
    assert_eq!(tags, r#"{"some tag":5}"#);
    assert_eq!(signs, r#"{"4":5}"#);
    assert!(!tmp.path().join("tag_index.json.tmp").exists());
}

#[tokio::test]
async fn test_filesystem_cache_survives_new_store() {
    let tmp = TempDir::new().unwrap();
    IndexCache::new(FilesystemStore::new(tmp.path()))
        .save_indexes(&sample_indexes())
        .await
        .unwrap();

    let reopened = IndexCache::new(FilesystemStore::new(tmp.path()));
    let loaded = reopened.load_indexes().await.unwrap();
    assert_eq!(loaded, Some(sample_indexes()));
}

#[tokio::test]
async fn test_filesystem_missing_dir_is_empty_cache() {
    let tmp = TempDir::new().unwrap();
    let store = FilesystemStore::new(tmp.path().join("not-created-yet"));
    assert!(store.load("tag_index").await.unwrap().is_none());
    store.invalidate("tag_index").await.unwrap();
}

#[tokio::test]
async fn test_corrupt_artifact_is_serde_error() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("sign_index.json"), b"{not json").unwrap();

    let cache = IndexCache::new(FilesystemStore::new(tmp.path()));
    match cache.load::<SignIndex>().await {
        Err(CacheError::Serde { key, .. }) => assert_eq!(key, "sign_index"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(cache.load::<TagIndex>().await.unwrap().is_none());
}
