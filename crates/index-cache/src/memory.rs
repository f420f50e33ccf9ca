use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::store::IndexStore;
use crate::CacheError;

/// Process-local IndexStore. Contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    artifacts: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn artifacts(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.artifacts.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.artifacts().contains_key(key)
    }
}

#[async_trait]
impl IndexStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.artifacts().get(key).cloned())
    }

    async fn store(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        self.artifacts().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.artifacts().remove(key);
        Ok(())
    }
}
