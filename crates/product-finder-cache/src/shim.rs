//! Install, activate and fetch steps of the offline cache.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use product_finder_client::{ApiError, Reply, Transport};
use tracing::{debug, info};

use crate::{CacheError, CacheStorage};

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Network,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Network => "network",
        }
    }
}

/// Fetch every manifest entry and store them in the `cache_name` bucket.
///
/// All-or-nothing: if any fetch fails or returns a non-OK status, nothing
/// is stored. Returns the number of cached entries.
pub async fn install(
    storage: &CacheStorage,
    cache_name: &str,
    manifest: &[&str],
    network: &dyn Transport,
) -> Result<usize, CacheError> {
    let bucket = storage.open(cache_name)?;
    info!(cache = cache_name, assets = manifest.len(), "installing asset cache");

    let fetches = manifest.iter().map(|&target| async move {
        let reply = network
            .get(target)
            .await
            .map_err(|source| CacheError::Fetch {
                target: target.to_string(),
                source,
            })?;
        if !reply.is_success() {
            return Err(CacheError::BadStatus {
                url: reply.url,
                status: reply.status,
            });
        }
        Ok(reply)
    });
    let replies = try_join_all(fetches).await?;

    let count = replies.len();
    bucket.put_all(replies)?;
    info!(cache = cache_name, count, "asset cache installed");
    Ok(count)
}

/// Delete every bucket other than `current`. Returns the deleted names.
pub fn activate(storage: &CacheStorage, current: &str) -> Result<Vec<String>, CacheError> {
    let mut deleted = Vec::new();
    for name in storage.keys()? {
        if name != current && storage.delete(&name)? {
            info!(cache = %name, "deleted stale cache");
            deleted.push(name);
        }
    }
    Ok(deleted)
}

/// Cache-first [`Transport`].
///
/// Hits are served as stored, without revalidation. Misses go to the
/// network and are not written back; the cache only grows at install.
pub struct CachedTransport {
    storage: Arc<CacheStorage>,
    network: Arc<dyn Transport>,
}

impl CachedTransport {
    pub fn new(storage: Arc<CacheStorage>, network: Arc<dyn Transport>) -> Self {
        Self { storage, network }
    }

    /// Like [`Transport::get`], also reporting where the response came from.
    pub async fn fetch(&self, target: &str) -> Result<(Reply, Source), ApiError> {
        let url = self.network.resolve(target)?;
        let hit = self
            .storage
            .match_url(&url)
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if let Some(reply) = hit {
            debug!(url = %url, "cache hit");
            return Ok((reply, Source::Cache));
        }
        debug!(url = %url, "cache miss");
        let reply = self.network.get(target).await?;
        Ok((reply, Source::Network))
    }
}

#[async_trait]
impl Transport for CachedTransport {
    async fn get(&self, target: &str) -> Result<Reply, ApiError> {
        self.fetch(target).await.map(|(reply, _)| reply)
    }

    fn resolve(&self, target: &str) -> Result<String, ApiError> {
        self.network.resolve(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ASSET_MANIFEST;
    use product_finder_client::stub::StubTransport;

    fn stub_with_manifest() -> Arc<StubTransport> {
        let stub = Arc::new(StubTransport::new());
        for target in ASSET_MANIFEST {
            stub.reply(target, 200, &format!("asset {target}"));
        }
        stub
    }

    #[tokio::test]
    async fn install_caches_whole_manifest() {
        let storage = CacheStorage::in_memory();
        let stub = stub_with_manifest();
        let count = install(&storage, "product-finder-v1", ASSET_MANIFEST, stub.as_ref())
            .await
            .unwrap();
        assert_eq!(count, ASSET_MANIFEST.len());
        let bucket = storage.open("product-finder-v1").unwrap();
        assert_eq!(bucket.len().unwrap(), ASSET_MANIFEST.len());
        assert!(
            storage
                .match_url("http://stub.local/static/js/app.js")
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn install_is_all_or_nothing() {
        let storage = CacheStorage::in_memory();
        let stub = stub_with_manifest();
        stub.reply("/static/js/barcode.js", 404, "missing");
        let err = install(&storage, "product-finder-v1", ASSET_MANIFEST, stub.as_ref())
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::BadStatus { status: 404, .. }));
        assert!(storage.open("product-finder-v1").unwrap().is_empty().unwrap());
    }

    #[tokio::test]
    async fn install_fails_on_transport_error() {
        let storage = CacheStorage::in_memory();
        let stub = stub_with_manifest();
        stub.fail("/", "offline");
        let err = install(&storage, "v1", ASSET_MANIFEST, stub.as_ref())
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::Fetch { .. }));
    }

    #[tokio::test]
    async fn hit_served_without_network() {
        let storage = Arc::new(CacheStorage::in_memory());
        let stub = stub_with_manifest();
        install(&storage, "v1", &["/static/js/app.js"], stub.as_ref())
            .await
            .unwrap();
        let before = stub.requests().len();

        let cached = CachedTransport::new(storage, stub.clone());
        let (reply, source) = cached.fetch("/static/js/app.js").await.unwrap();
        assert_eq!(source, Source::Cache);
        assert_eq!(reply.body, "asset /static/js/app.js");
        assert_eq!(stub.requests().len(), before);
    }

    #[tokio::test]
    async fn miss_goes_to_network_and_is_not_stored() {
        let storage = Arc::new(CacheStorage::in_memory());
        let stub = Arc::new(StubTransport::new());
        stub.reply("/api/search?q=tea&type=name", 200, "[]");
        let cached = CachedTransport::new(storage.clone(), stub.clone());

        let (_, source) = cached.fetch("/api/search?q=tea&type=name").await.unwrap();
        assert_eq!(source, Source::Network);
        let (_, source) = cached.fetch("/api/search?q=tea&type=name").await.unwrap();
        assert_eq!(source, Source::Network);
        assert_eq!(stub.requests().len(), 2);
        assert!(storage.keys().unwrap().is_empty());
    }

    #[test]
    fn activate_removes_other_buckets() {
        let storage = CacheStorage::in_memory();
        storage.open("product-finder-v1").unwrap();
        storage.open("product-finder-v2").unwrap();
        let deleted = activate(&storage, "product-finder-v2").unwrap();
        assert_eq!(deleted, vec!["product-finder-v1"]);
        assert_eq!(storage.keys().unwrap(), vec!["product-finder-v2"]);
    }
}
