//! Filesystem-based index storage implementation.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::store::IndexStore;
use crate::CacheError;

/// Filesystem implementation of IndexStore trait.
///
/// Stores each artifact as `{key}.json` in a directory. Writes go to a
/// temporary file first and are renamed into place, so a reader never sees a
/// half-written artifact.
pub struct FilesystemStore {
    dir: PathBuf,
}

impl FilesystemStore {
    /// Create a new FilesystemStore with the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Get the directory path.
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn io_error(key: &str) -> impl FnOnce(std::io::Error) -> CacheError + '_ {
    move |source| CacheError::Io {
        key: key.to_string(),
        source,
    }
}

#[async_trait]
impl IndexStore for FilesystemStore {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match tokio::fs::read(self.path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key)(e)),
        }
    }

    async fn store(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(io_error(key))?;

        let path = self.path(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        tokio::fs::write(&tmp, bytes).await.map_err(io_error(key))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(io_error(key))?;

        tracing::info!("Stored index artifact to {}", path.display());
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        match tokio::fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key)(e)),
        }
    }
}
