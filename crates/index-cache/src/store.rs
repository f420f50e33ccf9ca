//! Index artifact storage trait

use async_trait::async_trait;

use crate::CacheError;

/// Byte storage for named index artifacts.
///
/// Implementations only move bytes; (de)serialization and the load-or-build
/// policy live in [`crate::IndexCache`].
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Read the artifact stored under `key`.
    ///
    /// Returns None if it doesn't exist.
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Replace the artifact stored under `key`.
    async fn store(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError>;

    /// Delete the artifact stored under `key`. Deleting a missing artifact is not an error.
    async fn invalidate(&self, key: &str) -> Result<(), CacheError>;
}
