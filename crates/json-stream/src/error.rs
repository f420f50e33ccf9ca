use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    /// The input was not a JSON array of the expected element shape.
    /// `index` is the zero-based position of the element being decoded.
    #[error("JSON decode error at element {index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON encode error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The consumer stopped receiving before the array was fully decoded
    #[error("element consumer went away")]
    Aborted,

    #[error("decoder task failed: {0}")]
    Task(String),
}

impl StreamError {
    /// Classify a `serde_json` failure: reader faults stay IO errors, everything else is a decode error.
    pub(crate) fn from_json(index: usize, source: serde_json::Error) -> Self {
        if source.is_io() {
            StreamError::Io(source.into())
        } else {
            StreamError::Decode { index, source }
        }
    }

    /// The HTTP transport error behind a failed body read, if that is what this is.
    ///
    /// Bodies opened with [`crate::http::open_body`] surface network faults and
    /// timeouts as [`StreamError::Io`] wrapping a `reqwest::Error`.
    pub fn into_transport(self) -> Result<reqwest::Error, Self> {
        match self {
            StreamError::Io(e) => e.downcast::<reqwest::Error>().map_err(StreamError::Io),
            other => Err(other),
        }
    }
}
