use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures of the key/value store behind the cache
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store operation on '{key}' failed: {message}")]
    Operation { key: String, message: String },

    #[error("Cached value for '{key}' could not be encoded: {source}")]
    Encoding {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn operation(key: &str, message: impl Into<String>) -> Self {
        Self::Operation {
            key: key.to_string(),
            message: message.into(),
        }
    }
}
