//! Paginated full-replace synchronization

use json_stream::http::{build_client, open_body, DEFAULT_FETCH_TIMEOUT};
use json_stream::{spawn_decoder, DEFAULT_CHANNEL_CAPACITY};
use sign_store::{BatchWriter, SignStore, DEFAULT_BATCH_SIZE};
use sign_types::{normalize, CatalogEntry};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::ops::sign_ops;
use crate::Error;

/// Default ceiling on the number of pages fetched in one sync
pub const DEFAULT_MAX_PAGES: usize = 1000;

/// Configuration for sync operations
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Number of write ops per batch flush
    pub batch_size: usize,
    /// Pages fetched before the sync stops even without an empty page
    pub max_pages: usize,
    /// Per-request timeout, body included
    pub fetch_timeout: Duration,
    /// Decoded records buffered between the decoder thread and the writer
    pub channel_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Outcome of a completed sync
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Pages requested, including the terminating empty page
    pub pages_fetched: usize,
    pub records_written: usize,
    pub ops_written: usize,
}

/// Replaces the store contents with the catalog, page by page.
pub struct Synchronizer<S: SignStore> {
    pub(crate) store: Arc<S>,
    pub(crate) client: reqwest::Client,
    pub(crate) config: SyncConfig,
}

impl<S: SignStore> Synchronizer<S> {
    pub fn new(store: Arc<S>, config: SyncConfig) -> Result<Self, Error> {
        let client = build_client(config.fetch_timeout).map_err(Error::Client)?;
        Ok(Self::with_client(store, client, config))
    }

    pub fn with_client(store: Arc<S>, client: reqwest::Client, config: SyncConfig) -> Self {
        Self {
            store,
            client,
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Replace the store contents with every record of the catalog at `source_url`.
    ///
    /// The store is truncated first. Pages `1..=max_pages` are requested with a
    /// `page` query parameter until one comes back empty. The first failing
    /// page or record aborts the run and leaves the store partially filled.
    pub async fn sync(&self, source_url: &str, cancel: &CancellationToken) -> Result<SyncSummary, Error> {
        let base = parse_source_url(source_url)?;
        let media_base = media_base(&base);

        tracing::info!("Starting full sync from {base}");
        self.reset_store(&base, cancel).await?;

        let mut writer = BatchWriter::new(&*self.store, self.config.batch_size);
        let mut summary = SyncSummary::default();

        for page in 1..=self.config.max_pages {
            let url = page_url(&base, page);
            let records = self
                .sync_page(&url, page, &media_base, &mut writer, cancel)
                .await?;
            summary.pages_fetched += 1;

            if records == 0 {
                summary.ops_written = writer.written();
                tracing::info!(
                    "Full sync completed: {} records in {} pages ({} ops)",
                    summary.records_written,
                    summary.pages_fetched - 1,
                    summary.ops_written
                );
                return Ok(summary);
            }
            summary.records_written += records;
        }

        summary.ops_written = writer.written();
        tracing::warn!(
            "Stopped after reaching the page ceiling of {} pages ({} records written)",
            self.config.max_pages,
            summary.records_written
        );
        Ok(summary)
    }

    /// Truncate and re-create the default category.
    pub(crate) async fn reset_store(&self, base: &Url, cancel: &CancellationToken) -> Result<(), Error> {
        let write_error = |source| Error::Write {
            url: base.to_string(),
            page: 0,
            source,
        };
        cancellable(cancel, self.store.truncate())
            .await?
            .map_err(write_error)?;
        cancellable(cancel, self.store.ensure_default_category())
            .await?
            .map_err(write_error)?;
        Ok(())
    }

    async fn sync_page(
        &self,
        url: &Url,
        page: usize,
        media_base: &str,
        writer: &mut BatchWriter<'_, S>,
        cancel: &CancellationToken,
    ) -> Result<usize, Error> {
        let write_error = |source| Error::Write {
            url: url.to_string(),
            page,
            source,
        };

        let body = cancellable(cancel, open_body(&self.client, url))
            .await?
            .map_err(|e| Error::from_fetch(e, page))?;
        let mut entries = spawn_decoder::<CatalogEntry, _>(body, self.config.channel_capacity);

        let mut records = 0usize;
        while let Some(entry) = cancellable(cancel, entries.next()).await? {
            let sign = normalize(&entry, media_base).map_err(|source| Error::Normalization {
                url: url.to_string(),
                page,
                record_id: entry.id.clone(),
                source,
            })?;
            for op in sign_ops(sign) {
                cancellable(cancel, writer.push(op))
                    .await?
                    .map_err(write_error)?;
            }
            records += 1;
        }

        entries
            .finish()
            .await
            .map_err(|e| Error::from_stream(e, url, page))?;
        cancellable(cancel, writer.flush())
            .await?
            .map_err(write_error)?;

        tracing::debug!("Page {page}: {records} records from {url}");
        Ok(records)
    }
}

/// Race `fut` against cancellation of `cancel`.
pub(crate) async fn cancellable<F: Future>(cancel: &CancellationToken, fut: F) -> Result<F::Output, Error> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        output = fut => Ok(output),
    }
}

pub(crate) fn parse_source_url(source_url: &str) -> Result<Url, Error> {
    Url::parse(source_url).map_err(|source| Error::InvalidUrl {
        url: source_url.to_string(),
        source,
    })
}

/// `base` with its `page` query parameter set to `page`; other parameters are kept in order.
pub fn page_url(base: &Url, page: usize) -> Url {
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut url = base.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("page", &page.to_string());
    url
}

/// `scheme://host[:port]/` of the catalog, the prefix of every relative media path.
pub fn media_base(url: &Url) -> String {
    format!("{}/", url.origin().ascii_serialization())
}
