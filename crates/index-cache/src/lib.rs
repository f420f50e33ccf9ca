//! Persisted index tables for the compatibility transform
//!
//! The legacy index tables are expensive to build (a full pass over the legacy
//! dataset) and never change once built, so they are cached as JSON artifacts
//! keyed by name. [`IndexCache`] owns the load-or-build policy; where the bytes
//! live is up to the [`IndexStore`] backend.
//!
//! ## Storage Backends
//!
//! - `FilesystemStore` - one `{key}.json` file per artifact in a directory
//! - `MemoryStore` - a process-local map, for tests and short-lived tools

mod cache;
mod error;
mod filesystem;
mod memory;
pub mod store;

#[cfg(test)]
mod tests;

pub use cache::{CacheStatus, CachedArtifact, IndexCache};
pub use error::CacheError;
pub use filesystem::FilesystemStore;
pub use memory::MemoryStore;
pub use store::IndexStore;
