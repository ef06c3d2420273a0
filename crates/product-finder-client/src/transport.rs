use std::time::Duration;

use async_trait::async_trait;
use product_finder_core::FinderConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::ApiError;

/// A fully-read HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Resolved absolute URL the response came from.
    pub url: String,
    pub status: u16,
    #[serde(default)]
    pub content_type: Option<String>,
    pub body: String,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can perform a GET.
///
/// `target` is either a path relative to the backend origin
/// (`/api/search?q=tea&type=name`) or an absolute URL.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, target: &str) -> Result<Reply, ApiError>;

    /// Absolute URL `target` refers to. Used as the cache key.
    fn resolve(&self, target: &str) -> Result<String, ApiError>;
}

/// [`Transport`] backed by `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
    base: Url,
}

impl HttpTransport {
    /// Create a transport for the given backend origin.
    ///
    /// `timeout` bounds each request; `None` waits indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let base = Url::parse(base_url.trim_end_matches('/'))?;
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            client: builder.build()?,
            base,
        })
    }

    /// Transport for `config.base_url`, bounded by `request_timeout_secs` when set.
    pub fn from_config(config: &FinderConfig) -> Result<Self, ApiError> {
        let timeout = config.request_timeout_secs.map(Duration::from_secs);
        Self::new(&config.base_url, timeout)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, target: &str) -> Result<Reply, ApiError> {
        let url = self.resolve(target)?;
        debug!(url = %url, "GET");
        let resp = self.client.get(&url).send().await?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.text().await?;
        Ok(Reply {
            url,
            status,
            content_type,
            body,
        })
    }

    fn resolve(&self, target: &str) -> Result<String, ApiError> {
        Ok(self.base.join(target)?.to_string())
    }
}
