//! Catalog synchronization into the sign store
//!
//! [`Synchronizer::sync`] replaces the store contents with the external
//! catalog: it truncates, then fetches the catalog page by page, normalizes
//! every entry and writes it through a [`sign_store::BatchWriter`].
//! [`Synchronizer::load_legacy`] bootstraps the store from a single legacy dump
//! instead, keeping the dump's identifiers.
//!
//! Both are full replaces with no rollback: a failed or cancelled run leaves a
//! partial store that the next successful run overwrites.

mod error;
mod legacy;
pub mod ops;
mod sync;

pub use error::Error;
pub use legacy::LoadSummary;
pub use sync::{media_base, page_url, SyncConfig, SyncSummary, Synchronizer, DEFAULT_MAX_PAGES};
