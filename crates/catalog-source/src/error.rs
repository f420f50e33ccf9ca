use json_stream::StreamError;
use sign_store::StoreError;
use sign_types::NormalizationError;
use thiserror::Error;

/// Failure of a sync or legacy load.
///
/// `page` is the 1-based page being processed; `0` means the failure happened
/// before the first page (URL parsing, truncation, default category).
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid source URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("error loading data from {url} (page {page}): {source}")]
    Fetch {
        url: String,
        page: usize,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} (page {page}) returned status {status}")]
    Status {
        url: String,
        page: usize,
        status: reqwest::StatusCode,
    },

    #[error("error decoding {url} (page {page}): {source}")]
    Decode {
        url: String,
        page: usize,
        #[source]
        source: StreamError,
    },

    #[error("error normalizing sign {record_id:?} from {url} (page {page}): {source}")]
    Normalization {
        url: String,
        page: usize,
        record_id: String,
        #[source]
        source: NormalizationError,
    },

    #[error("error writing {url} (page {page}): {source}")]
    Write {
        url: String,
        page: usize,
        #[source]
        source: StoreError,
    },

    #[error("sync cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn from_fetch(error: json_stream::http::FetchError, page: usize) -> Self {
        match error {
            json_stream::http::FetchError::Request { url, source } => Error::Fetch { url, page, source },
            json_stream::http::FetchError::Status { url, status } => Error::Status { url, page, status },
        }
    }

    /// A failed body decode; network faults while reading the body are fetch errors.
    pub(crate) fn from_stream(error: StreamError, url: &url::Url, page: usize) -> Self {
        match error.into_transport() {
            Ok(source) => Error::Fetch {
                url: url.to_string(),
                page,
                source,
            },
            Err(source) => Error::Decode {
                url: url.to_string(),
                page,
                source,
            },
        }
    }
}
