use index_cache::CacheError;
use json_stream::http::FetchError;
use json_stream::StreamError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The input stream was not a JSON array of signs.
    #[error("failed to decode sign stream: {0}")]
    Decode(#[from] StreamError),

    /// A legacy record carried an identifier that is not an integer.
    #[error("legacy record #{position} (id {record_id:?}) has a non-numeric {field}: {value:?}")]
    InvalidLegacyId {
        position: usize,
        record_id: String,
        field: &'static str,
        value: String,
    },

    #[error("failed to encode legacy sign stream: {0}")]
    Encode(#[source] StreamError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("transform task failed: {0}")]
    Task(String),
}
