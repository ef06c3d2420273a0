use std::path::PathBuf;

use product_finder_client::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("invalid bucket name: {0:?}")]
    InvalidName(String),

    #[error("corrupt cache bucket {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("install failed fetching {target}: {source}")]
    Fetch { target: String, source: ApiError },

    #[error("install failed: {url} returned {status}")]
    BadStatus { url: String, status: u16 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
