//! PostgreSQL store
//!
//! One client connection is shared behind `Arc<Mutex<Client>>` and borrowed for
//! the duration of each call. Batches are pipelined inside a transaction.

use async_trait::async_trait;
use futures::future::try_join_all;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_postgres::{Client, NoTls, Statement, Transaction};

use crate::{SignStore, StoreError, WriteOp};

/// Idempotent DDL for every table the synchronizer writes.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS signs (
    id int4 NOT NULL PRIMARY KEY,
    ref_id int4,
    created_at timestamptz NOT NULL DEFAULT now(),
    updated_at timestamptz NOT NULL DEFAULT now(),
    video_url text NOT NULL,
    description text NOT NULL,
    frequency text,
    vocable text,
    transcription text,
    deleted bool NOT NULL DEFAULT false,
    unusual bool NOT NULL DEFAULT false,
    hidden_words text[]
);
CREATE INDEX IF NOT EXISTS signs_updated_at_idx ON signs (updated_at);

CREATE TABLE IF NOT EXISTS categories (
    id int4 GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
    name text NOT NULL,
    slug text NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS signs_categories (
    sign_id int4 NOT NULL REFERENCES signs (id) ON DELETE CASCADE,
    category_id int4 NOT NULL REFERENCES categories (id) ON DELETE CASCADE,
    PRIMARY KEY (sign_id, category_id)
);

CREATE TABLE IF NOT EXISTS words (
    id int4 GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
    sign_id int4 NOT NULL REFERENCES signs (id) ON DELETE CASCADE,
    word text NOT NULL
);
CREATE INDEX IF NOT EXISTS words_sign_id_idx ON words (sign_id);

CREATE TABLE IF NOT EXISTS phrases (
    id int4 GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
    sign_id int4 NOT NULL REFERENCES signs (id) ON DELETE CASCADE,
    video_url text NOT NULL,
    phrase text NOT NULL
);
CREATE INDEX IF NOT EXISTS phrases_sign_id_idx ON phrases (sign_id);
"#;

const INSERT_SIGN: &str = "INSERT INTO signs \
    (id, ref_id, updated_at, video_url, description, deleted, unusual, frequency, transcription, vocable, hidden_words) \
    VALUES ($1::int4, $2::int4, $3::timestamptz, $4::text, $5::text, $6::bool, $7::bool, $8::text, $9::text, $10::text, $11::text[])";

const INSERT_WORD: &str = "INSERT INTO words (sign_id, word) VALUES ($1::int4, $2::text)";

const INSERT_WORD_PINNED: &str =
    "INSERT INTO words (id, sign_id, word) VALUES ($1::int4, $2::int4, $3::text)";

const UPSERT_CATEGORY: &str =
    "INSERT INTO categories (name, slug) VALUES ($1::text, $2::text) ON CONFLICT (slug) DO NOTHING";

const UPSERT_CATEGORY_PINNED: &str =
    "INSERT INTO categories (id, name, slug) VALUES ($1::int4, $2::text, $3::text) ON CONFLICT (slug) DO NOTHING";

// A missing slug yields a NULL category_id and fails the batch.
const LINK_CATEGORY: &str = "INSERT INTO signs_categories (sign_id, category_id) \
    VALUES ($1::int4, (SELECT id FROM categories WHERE slug = $2::text)) \
    ON CONFLICT (sign_id, category_id) DO NOTHING";

const INSERT_PHRASE: &str =
    "INSERT INTO phrases (sign_id, video_url, phrase) VALUES ($1::int4, $2::text, $3::text)";

const INSERT_PHRASE_PINNED: &str =
    "INSERT INTO phrases (id, sign_id, video_url, phrase) VALUES ($1::int4, $2::int4, $3::text, $4::text)";

const SYNC_IDENTITIES: &str = "
SELECT setval(pg_get_serial_sequence('categories', 'id'), COALESCE((SELECT MAX(id) FROM categories), 0) + 1, false);
SELECT setval(pg_get_serial_sequence('words', 'id'), COALESCE((SELECT MAX(id) FROM words), 0) + 1, false);
SELECT setval(pg_get_serial_sequence('phrases', 'id'), COALESCE((SELECT MAX(id) FROM phrases), 0) + 1, false);
";

/// Create a new PostgreSQL client with connection handling
pub async fn new_postgres_client(connection_string: &str) -> Result<Arc<Mutex<Client>>, StoreError> {
    let (client, connection) = tokio_postgres::connect(connection_string, NoTls)
        .await
        .map_err(|e| StoreError::Connect(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("PostgreSQL connection error: {e}");
        }
    });

    Ok(Arc::new(Mutex::new(client)))
}

/// Run [`SCHEMA`] against `client`.
pub async fn ensure_schema(client: &Client) -> Result<(), StoreError> {
    client
        .batch_execute(SCHEMA)
        .await
        .map_err(|e| StoreError::Query(format!("schema bootstrap failed: {e}")))?;
    tracing::info!("Ensured sign-sync schema");
    Ok(())
}

struct Statements {
    insert_sign: Statement,
    insert_word: Statement,
    insert_word_pinned: Statement,
    upsert_category: Statement,
    upsert_category_pinned: Statement,
    link_category: Statement,
    insert_phrase: Statement,
    insert_phrase_pinned: Statement,
}

impl Statements {
    async fn prepare(client: &Client) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            insert_sign: client.prepare(INSERT_SIGN).await?,
            insert_word: client.prepare(INSERT_WORD).await?,
            insert_word_pinned: client.prepare(INSERT_WORD_PINNED).await?,
            upsert_category: client.prepare(UPSERT_CATEGORY).await?,
            upsert_category_pinned: client.prepare(UPSERT_CATEGORY_PINNED).await?,
            link_category: client.prepare(LINK_CATEGORY).await?,
            insert_phrase: client.prepare(INSERT_PHRASE).await?,
            insert_phrase_pinned: client.prepare(INSERT_PHRASE_PINNED).await?,
        })
    }
}

pub struct PostgresStore {
    client: Arc<Mutex<Client>>,
    statements: Statements,
}

impl PostgresStore {
    /// Connect to `connection_string`, optionally bootstrap the schema, and
    /// prepare the write statements.
    pub async fn connect(connection_string: &str, bootstrap_schema: bool) -> Result<Self, StoreError> {
        let client = new_postgres_client(connection_string).await?;
        if bootstrap_schema {
            ensure_schema(&*client.lock().await).await?;
        }
        Self::from_client(client).await
    }

    /// Build a store around an existing shared client. The schema must exist.
    pub async fn from_client(client: Arc<Mutex<Client>>) -> Result<Self, StoreError> {
        let statements = {
            let guard = client.lock().await;
            Statements::prepare(&guard)
                .await
                .map_err(|e| StoreError::Connect(format!("failed to prepare statements: {e}")))?
        };
        Ok(Self { client, statements })
    }

    pub fn client(&self) -> Arc<Mutex<Client>> {
        self.client.clone()
    }

    async fn execute_op(&self, tx: &Transaction<'_>, op: &WriteOp) -> Result<u64, tokio_postgres::Error> {
        let s = &self.statements;
        match op {
            WriteOp::InsertSign(row) => {
                tx.execute(
                    &s.insert_sign,
                    &[
                        &row.id,
                        &row.ref_id,
                        &row.updated_at,
                        &row.video_url,
                        &row.description,
                        &row.deleted,
                        &row.unusual,
                        &row.frequency,
                        &row.transcription,
                        &row.vocable,
                        &row.hidden_words,
                    ],
                )
                .await
            }
            WriteOp::InsertWord {
                sign_id,
                id: None,
                word,
            } => tx.execute(&s.insert_word, &[sign_id, word]).await,
            WriteOp::InsertWord {
                sign_id,
                id: Some(id),
                word,
            } => tx.execute(&s.insert_word_pinned, &[id, sign_id, word]).await,
            WriteOp::UpsertCategory {
                id: None,
                name,
                slug,
            } => tx.execute(&s.upsert_category, &[name, slug]).await,
            WriteOp::UpsertCategory {
                id: Some(id),
                name,
                slug,
            } => tx.execute(&s.upsert_category_pinned, &[id, name, slug]).await,
            WriteOp::LinkCategory { sign_id, slug } => {
                tx.execute(&s.link_category, &[sign_id, slug]).await
            }
            WriteOp::InsertPhrase {
                sign_id,
                id: None,
                video_url,
                phrase,
            } => {
                tx.execute(&s.insert_phrase, &[sign_id, video_url, phrase])
                    .await
            }
            WriteOp::InsertPhrase {
                sign_id,
                id: Some(id),
                video_url,
                phrase,
            } => {
                tx.execute(&s.insert_phrase_pinned, &[id, sign_id, video_url, phrase])
                    .await
            }
        }
    }
}

#[async_trait]
impl SignStore for PostgresStore {
    async fn truncate(&self) -> Result<(), StoreError> {
        let client = self.client.lock().await;
        client
            .execute("TRUNCATE TABLE signs RESTART IDENTITY CASCADE", &[])
            .await
            .map_err(|e| StoreError::Query(format!("error truncating signs table: {e}")))?;
        tracing::debug!("Truncated signs table");
        Ok(())
    }

    async fn execute_batch(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        if ops.is_empty() {
            return Ok(());
        }

        let mut client = self.client.lock().await;
        let tx = client
            .transaction()
            .await
            .map_err(|e| StoreError::Write(format!("error starting transaction: {e}")))?;

        let pending = ops.iter().map(|op| self.execute_op(&tx, op));
        try_join_all(pending)
            .await
            .map_err(|e| StoreError::Write(format!("error executing batch: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Write(format!("error committing batch: {e}")))?;
        Ok(())
    }

    async fn sign_count(&self) -> Result<i64, StoreError> {
        let client = self.client.lock().await;
        let row = client
            .query_one("SELECT COUNT(*) FROM signs", &[])
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(row.get(0))
    }

    async fn sync_identities(&self) -> Result<(), StoreError> {
        let client = self.client.lock().await;
        client
            .batch_execute(SYNC_IDENTITIES)
            .await
            .map_err(|e| StoreError::Query(format!("error advancing identity sequences: {e}")))
    }
}
