use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("index cache IO error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("index artifact {key} is not valid JSON: {source}")]
    Serde {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The builder passed to `load_or_build` failed.
    #[error("failed to build index tables: {0}")]
    Build(#[source] Box<dyn std::error::Error + Send + Sync>),
}
