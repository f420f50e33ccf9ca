//! Store trait and the write operations it accepts.

use chrono::{DateTime, Utc};
use sign_types::{DEFAULT_CATEGORY_NAME, DEFAULT_CATEGORY_SLUG};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to connect to store: {0}")]
    Connect(String),

    /// A batch was rejected; nothing from that batch is committed.
    #[error("batch write failed: {0}")]
    Write(String),

    #[error("store query failed: {0}")]
    Query(String),
}

/// One row of the `signs` table.
#[derive(Debug, Clone, PartialEq)]
pub struct SignRow {
    pub id: i32,
    pub ref_id: Option<i32>,
    pub updated_at: DateTime<Utc>,
    pub video_url: String,
    pub description: String,
    pub deleted: bool,
    pub unusual: bool,
    pub frequency: Option<String>,
    pub transcription: Option<String>,
    pub vocable: Option<String>,
    pub hidden_words: Option<Vec<String>>,
}

/// A single statement queued in a batch.
///
/// `id: None` lets the store generate the identifier; `Some` pins it.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    InsertSign(SignRow),
    InsertWord {
        sign_id: i32,
        id: Option<i32>,
        word: String,
    },
    /// Insert a category unless one with the same slug exists.
    ///
    /// A pinned id already held by a category with another slug fails the batch.
    UpsertCategory {
        id: Option<i32>,
        name: String,
        slug: String,
    },
    /// Link a sign to the category with `slug`; an existing link is kept.
    ///
    /// Fails the batch when no category has `slug`.
    LinkCategory { sign_id: i32, slug: String },
    InsertPhrase {
        sign_id: i32,
        id: Option<i32>,
        video_url: String,
        phrase: String,
    },
}

impl WriteOp {
    pub fn default_category() -> Self {
        WriteOp::UpsertCategory {
            id: None,
            name: DEFAULT_CATEGORY_NAME.to_string(),
            slug: DEFAULT_CATEGORY_SLUG.to_string(),
        }
    }
}

/// Relational store for synchronized signs.
///
/// Writers are generic over this trait so the synchronizer can run against
/// PostgreSQL in production and an in-memory store in tests.
#[async_trait::async_trait]
pub trait SignStore: Send + Sync {
    /// Remove every sign and, by cascade, its words, phrases and category links.
    ///
    /// Categories are kept.
    async fn truncate(&self) -> Result<(), StoreError>;

    /// Apply `ops` in order as one transaction.
    ///
    /// Either every op is applied or none is.
    async fn execute_batch(&self, ops: &[WriteOp]) -> Result<(), StoreError>;

    /// Number of rows in `signs`.
    async fn sign_count(&self) -> Result<i64, StoreError>;

    /// Advance generated-id sequences past any pinned identifiers.
    async fn sync_identities(&self) -> Result<(), StoreError>;

    async fn ensure_default_category(&self) -> Result<(), StoreError> {
        self.execute_batch(&[WriteOp::default_category()]).await
    }
}
