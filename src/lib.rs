//! sign-sync
//!
//! Keeps a relational copy of an external sign-language dictionary and
//! republishes it in the shape legacy clients expect.
//!
//! # Workspace Crates
//!
//! - `sign_types` - catalog, current and legacy sign shapes; normalization
//! - `json_stream` - element-at-a-time JSON array decoding and encoding
//! - `sign_store` - store trait, batch writer, PostgreSQL and in-memory stores
//! - `catalog_source` - paginated full-replace sync and legacy bulk load
//! - `index_cache` - persisted legacy index tables
//! - `compat` - legacy index builder and new-to-old stream transform
//!
//! # CLI Usage
//!
//! ```bash
//! # One-shot full sync
//! sign-sync sync --source-url https://catalog.example/api/signs.json --database-url postgres://...
//!
//! # Sync when empty, then every 24 hours
//! sign-sync run --source-url https://catalog.example/api/signs.json --interval 24h
//!
//! # Transform the current API output for legacy clients
//! sign-sync transform --new-url https://api.example/signs.json \
//!   --legacy-url https://old.example/signs.json --cache-dir ./index-cache
//! ```

use catalog_source::SyncConfig;
use clap::Parser;
use sign_store::PostgresStore;
use std::time::Duration;

pub mod config;
pub mod schedule;

use config::parse_duration;

#[derive(Parser, Clone, Debug)]
pub struct StoreOpts {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Create the tables if they do not exist
    #[arg(long)]
    pub ensure_schema: bool,
}

#[derive(Parser, Clone, Debug)]
pub struct SyncOpts {
    /// Write ops per batch flush
    #[arg(long, default_value = "1000")]
    pub batch_size: usize,

    /// Stop after this many pages even if the catalog has more
    #[arg(long, default_value = "1000")]
    pub max_pages: usize,

    /// Per-request timeout for catalog fetches (e.g. "60s", "2m")
    #[arg(long, default_value = "60s", value_parser = parse_duration)]
    pub fetch_timeout: Duration,
}

impl From<&SyncOpts> for SyncConfig {
    fn from(opts: &SyncOpts) -> Self {
        Self {
            batch_size: opts.batch_size,
            max_pages: opts.max_pages,
            fetch_timeout: opts.fetch_timeout,
            ..Default::default()
        }
    }
}

/// Connect to the store described by `opts`.
pub async fn connect_store(opts: &StoreOpts) -> anyhow::Result<PostgresStore> {
    Ok(PostgresStore::connect(&opts.database_url, opts.ensure_schema).await?)
}
