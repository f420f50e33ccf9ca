//! HTTP/HTTPS response bodies as blocking readers

use futures::TryStreamExt;
use std::io::Read;
use std::time::Duration;
use thiserror::Error;
use tokio_util::io::{StreamReader, SyncIoBridge};
use url::Url;

/// Default per-request timeout for upstream fetches
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// Build an HTTP client whose requests, body included, time out after `timeout`.
pub fn build_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// Request `url` and return its body as a blocking `Read`.
///
/// The body is streamed rather than buffered, so the reader must be consumed
/// off the async executor (e.g. inside `spawn_blocking`). Non-2xx responses are
/// reported as [`FetchError::Status`] before any body is read.
pub async fn open_body(client: &reqwest::Client, url: &Url) -> Result<Box<dyn Read + Send>, FetchError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    tracing::debug!("Streaming response body from: {url}");

    let body = response.bytes_stream().map_err(std::io::Error::other);
    let reader = StreamReader::new(Box::pin(body));
    Ok(Box::new(SyncIoBridge::new(reader)))
}
