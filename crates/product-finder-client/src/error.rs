use product_finder_core::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("transport failed: {0}")]
    Transport(String),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Json(_) => ErrorKind::MalformedPayload,
            Self::Http(_) | Self::Url(_) | Self::Transport(_) | Self::Server { .. } => {
                ErrorKind::NetworkFailure
            }
        }
    }
}
