//! Index building and transforms against HTTP sources

use index_cache::{CacheStatus, IndexCache, IndexStore};
use json_stream::http::{open_body, FetchError};
use sign_types::LegacyIndexes;
use std::io::Write;
use std::sync::Arc;
use url::Url;

use crate::{build_indexes, transform_stream, Error};

/// Stream the legacy dataset at `legacy_url` and build the index tables from it.
pub async fn fetch_indexes(client: &reqwest::Client, legacy_url: &Url) -> Result<LegacyIndexes, Error> {
    tracing::info!("Building index tables from {legacy_url}");
    let body = open_body(client, legacy_url).await?;
    tokio::task::spawn_blocking(move || build_indexes(body))
        .await
        .map_err(|e| Error::Task(e.to_string()))?
        .map_err(|e| body_error(legacy_url, e))
}

/// Return the cached index tables, fetching and caching them on a miss.
///
/// With `rebuild` the cached artifacts are invalidated first.
pub async fn load_or_fetch_indexes<S: IndexStore>(
    cache: &IndexCache<S>,
    client: &reqwest::Client,
    legacy_url: &Url,
    rebuild: bool,
) -> Result<(LegacyIndexes, CacheStatus), Error> {
    if rebuild {
        cache.invalidate().await?;
    }
    Ok(cache
        .load_or_build(|| fetch_indexes(client, legacy_url))
        .await?)
}

/// Fetch the current-schema array at `new_url` and write it to `writer` in the legacy shape.
pub async fn transform_remote<W>(
    client: &reqwest::Client,
    new_url: &Url,
    writer: W,
    indexes: Arc<LegacyIndexes>,
) -> Result<usize, Error>
where
    W: Write + Send + 'static,
{
    let body = open_body(client, new_url).await?;
    let written = tokio::task::spawn_blocking(move || transform_stream(body, writer, &indexes))
        .await
        .map_err(|e| Error::Task(e.to_string()))?
        .map_err(|e| body_error(new_url, e))?;

    tracing::info!("Transformed {written} signs from {new_url}");
    Ok(written)
}

/// Network faults while reading a body are fetch errors, not decode errors.
fn body_error(url: &Url, error: Error) -> Error {
    match error {
        Error::Decode(source) => match source.into_transport() {
            Ok(source) => Error::Fetch(FetchError::Request {
                url: url.to_string(),
                source,
            }),
            Err(source) => Error::Decode(source),
        },
        other => other,
    }
}
