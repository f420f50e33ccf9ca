//! One-shot bulk load of a legacy sign dump

use json_stream::http::open_body;
use json_stream::spawn_decoder;
use sign_store::{BatchWriter, SignStore, WriteOp};
use sign_types::LegacySign;
use tokio_util::sync::CancellationToken;

use crate::ops::{default_category_link, legacy_ops};
use crate::sync::{cancellable, parse_source_url};
use crate::{Error, Synchronizer};

/// Outcome of a completed legacy load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub records_written: usize,
    pub ops_written: usize,
}

impl<S: SignStore> Synchronizer<S> {
    /// Replace the store contents with the single JSON array of signs at `source_url`.
    ///
    /// Identifiers (record, word, phrase, tag) are kept as given; tags become
    /// categories and examples become phrases. Afterwards the generated-id
    /// sequences are moved past the highest pinned id, the default category is
    /// ensured, and records without tags are linked to it.
    ///
    /// A tag whose id is held by a category with a different slug fails the
    /// load with [`Error::Write`].
    pub async fn load_legacy(&self, source_url: &str, cancel: &CancellationToken) -> Result<LoadSummary, Error> {
        let url = parse_source_url(source_url)?;
        let write_error = |source| Error::Write {
            url: url.to_string(),
            page: 1,
            source,
        };

        tracing::info!("Starting legacy load from {url}");
        // The default category is created after the pinned tags so it cannot
        // take one of their ids.
        cancellable(cancel, self.store.truncate())
            .await?
            .map_err(|source| Error::Write {
                url: url.to_string(),
                page: 0,
                source,
            })?;

        let body = cancellable(cancel, open_body(&self.client, &url))
            .await?
            .map_err(|e| Error::from_fetch(e, 1))?;
        let mut signs = spawn_decoder::<LegacySign, _>(body, self.config.channel_capacity);
        let mut writer = BatchWriter::new(&*self.store, self.config.batch_size);

        let mut records = 0usize;
        let mut untagged = Vec::new();
        while let Some(sign) = cancellable(cancel, signs.next()).await? {
            let record_id = sign.id.clone();
            let has_tags = !sign.tags.is_empty();
            let ops = legacy_ops(sign).map_err(|source| Error::Normalization {
                url: url.to_string(),
                page: 1,
                record_id,
                source,
            })?;
            if !has_tags {
                if let Some(WriteOp::InsertSign(row)) = ops.first() {
                    untagged.push(row.id);
                }
            }
            for op in ops {
                cancellable(cancel, writer.push(op))
                    .await?
                    .map_err(write_error)?;
            }
            records += 1;
        }

        signs
            .finish()
            .await
            .map_err(|e| Error::from_stream(e, &url, 1))?;
        cancellable(cancel, writer.flush())
            .await?
            .map_err(write_error)?;
        self.store.sync_identities().await.map_err(write_error)?;

        cancellable(cancel, self.store.ensure_default_category())
            .await?
            .map_err(write_error)?;
        cancellable(cancel, writer.extend(untagged.iter().map(|&id| default_category_link(id))))
            .await?
            .map_err(write_error)?;
        let ops_written = cancellable(cancel, writer.finish())
            .await?
            .map_err(write_error)?;

        tracing::info!(
            "Legacy load completed: {records} records ({ops_written} ops, {} linked to the default category)",
            untagged.len()
        );
        Ok(LoadSummary {
            records_written: records,
            ops_written,
        })
    }
}
