//! Named cache buckets keyed by absolute request URL.
//!
//! Buckets live in memory and, when the storage has a directory, are
//! mirrored to `<dir>/<bucket name>.json` after every write so an installed
//! asset set survives restarts.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use product_finder_client::Reply;
use product_finder_core::FinderConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::CacheError;

const BUCKET_EXT: &str = "json";

/// On-disk form of a bucket.
#[derive(Serialize, Deserialize)]
struct BucketFile {
    name: String,
    updated_at: DateTime<Utc>,
    entries: BTreeMap<String, Reply>,
}

/// One named cache.
#[derive(Debug)]
pub struct CacheBucket {
    name: String,
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, Reply>>,
}

impl CacheBucket {
    fn new(name: &str, path: Option<PathBuf>, entries: BTreeMap<String, Reply>) -> Self {
        Self {
            name: name.to_string(),
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exact-URL lookup.
    pub fn match_url(&self, url: &str) -> Result<Option<Reply>, CacheError> {
        Ok(self.lock()?.get(url).cloned())
    }

    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }

    /// Cached URLs in sorted order.
    pub fn urls(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    /// Store every reply under its URL, then persist once.
    pub fn put_all(&self, replies: Vec<Reply>) -> Result<(), CacheError> {
        let snapshot = {
            let mut entries = self.lock()?;
            for reply in replies {
                entries.insert(reply.url.clone(), reply);
            }
            entries.clone()
        };
        self.persist(snapshot)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Reply>>, CacheError> {
        self.entries
            .lock()
            .map_err(|e| CacheError::Other(format!("bucket lock poisoned: {e}")))
    }

    fn persist(&self, entries: BTreeMap<String, Reply>) -> Result<(), CacheError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let file = BucketFile {
            name: self.name.clone(),
            updated_at: Utc::now(),
            entries,
        };
        let dir = path.parent().unwrap_or(Path::new("."));
        // Write-then-rename so a crash never leaves a half-written bucket.
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, &file)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| CacheError::Io(e.error))?;
        Ok(())
    }
}

/// All buckets, addressed by name.
#[derive(Debug)]
pub struct CacheStorage {
    dir: Option<PathBuf>,
    buckets: Mutex<HashMap<String, Arc<CacheBucket>>>,
}

impl CacheStorage {
    /// Storage that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Open or create file-backed storage in `dir`, loading existing buckets.
    pub fn persistent(dir: &Path) -> Result<Self, CacheError> {
        std::fs::create_dir_all(dir)?;
        let mut buckets = HashMap::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(BUCKET_EXT) {
                continue;
            }
            // A stray or truncated file only loses its own entries.
            let file = match load_bucket_file(&path) {
                Ok(file) => file,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable bucket file");
                    continue;
                }
            };
            let bucket = CacheBucket::new(&file.name, Some(path), file.entries);
            buckets.insert(file.name, Arc::new(bucket));
        }
        info!(dir = %dir.display(), buckets = buckets.len(), "opened cache storage");
        Ok(Self {
            dir: Some(dir.to_path_buf()),
            buckets: Mutex::new(buckets),
        })
    }

    /// Persistent when `cache_dir` is configured, in-memory otherwise.
    pub fn from_config(config: &FinderConfig) -> Result<Self, CacheError> {
        match &config.cache_dir {
            Some(dir) => Self::persistent(dir),
            None => Ok(Self::in_memory()),
        }
    }

    /// Open the named bucket, creating it empty if needed.
    pub fn open(&self, name: &str) -> Result<Arc<CacheBucket>, CacheError> {
        validate_name(name)?;
        let mut buckets = self.lock()?;
        if let Some(bucket) = buckets.get(name) {
            return Ok(bucket.clone());
        }
        let path = self
            .dir
            .as_ref()
            .map(|d| d.join(format!("{name}.{BUCKET_EXT}")));
        let bucket = Arc::new(CacheBucket::new(name, path, BTreeMap::new()));
        buckets.insert(name.to_string(), bucket.clone());
        Ok(bucket)
    }

    pub fn has(&self, name: &str) -> Result<bool, CacheError> {
        Ok(self.lock()?.contains_key(name))
    }

    /// Bucket names in sorted order.
    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut names: Vec<String> = self.lock()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Remove a bucket and its file. Returns whether it existed.
    pub fn delete(&self, name: &str) -> Result<bool, CacheError> {
        let removed = self.lock()?.remove(name);
        let Some(bucket) = removed else {
            return Ok(false);
        };
        if let Some(path) = &bucket.path {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(path = %path.display(), "bucket file already gone");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(true)
    }

    /// Look `url` up across every bucket, in name order.
    pub fn match_url(&self, url: &str) -> Result<Option<Reply>, CacheError> {
        let mut buckets: Vec<Arc<CacheBucket>> = self.lock()?.values().cloned().collect();
        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        for bucket in buckets {
            if let Some(hit) = bucket.match_url(url)? {
                return Ok(Some(hit));
            }
        }
        Ok(None)
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Arc<CacheBucket>>>, CacheError> {
        self.buckets
            .lock()
            .map_err(|e| CacheError::Other(format!("storage lock poisoned: {e}")))
    }
}

fn load_bucket_file(path: &Path) -> Result<BucketFile, CacheError> {
    let text = std::fs::read_to_string(path)?;
    let file: BucketFile = serde_json::from_str(&text).map_err(|source| CacheError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;
    validate_name(&file.name)?;
    Ok(file)
}

fn validate_name(name: &str) -> Result<(), CacheError> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !name.starts_with('.');
    if ok {
        Ok(())
    } else {
        Err(CacheError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(url: &str, body: &str) -> Reply {
        Reply {
            url: url.to_string(),
            status: 200,
            content_type: Some("text/javascript".into()),
            body: body.to_string(),
        }
    }

    #[test]
    fn open_is_idempotent() {
        let storage = CacheStorage::in_memory();
        let a = storage.open("product-finder-v1").unwrap();
        a.put_all(vec![reply("http://shop/app.js", "js")]).unwrap();
        let b = storage.open("product-finder-v1").unwrap();
        assert_eq!(b.len().unwrap(), 1);
        assert_eq!(storage.keys().unwrap(), vec!["product-finder-v1"]);
    }

    #[test]
    fn bucket_lists_urls_sorted() {
        let storage = CacheStorage::in_memory();
        assert!(!storage.has("v1").unwrap());
        let bucket = storage.open("v1").unwrap();
        bucket
            .put_all(vec![
                reply("http://shop/static/js/app.js", "js"),
                reply("http://shop/", "<html>"),
            ])
            .unwrap();
        assert!(storage.has("v1").unwrap());
        assert_eq!(bucket.name(), "v1");
        assert_eq!(
            bucket.urls().unwrap(),
            vec!["http://shop/", "http://shop/static/js/app.js"]
        );
    }

    #[test]
    fn match_is_exact() {
        let storage = CacheStorage::in_memory();
        let bucket = storage.open("v1").unwrap();
        bucket.put_all(vec![reply("http://shop/app.js", "js")]).unwrap();
        assert!(storage.match_url("http://shop/app.js").unwrap().is_some());
        assert!(storage.match_url("http://shop/app.js?v=2").unwrap().is_none());
        assert!(storage.match_url("http://shop/").unwrap().is_none());
    }

    #[test]
    fn rejects_path_like_names() {
        let storage = CacheStorage::in_memory();
        assert!(matches!(
            storage.open("../evil"),
            Err(CacheError::InvalidName(_))
        ));
        assert!(storage.open("").is_err());
        assert!(storage.open("a/b").is_err());
    }

    #[test]
    fn persistent_buckets_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = CacheStorage::persistent(dir.path()).unwrap();
            let bucket = storage.open("product-finder-v1").unwrap();
            bucket
                .put_all(vec![
                    reply("http://shop/", "<html>"),
                    reply("http://shop/static/js/app.js", "js"),
                ])
                .unwrap();
        }
        let storage = CacheStorage::persistent(dir.path()).unwrap();
        assert_eq!(storage.keys().unwrap(), vec!["product-finder-v1"]);
        let hit = storage.match_url("http://shop/").unwrap().unwrap();
        assert_eq!(hit.body, "<html>");
    }

    #[test]
    fn delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CacheStorage::persistent(dir.path()).unwrap();
        storage
            .open("old")
            .unwrap()
            .put_all(vec![reply("http://shop/", "x")])
            .unwrap();
        assert!(dir.path().join("old.json").exists());
        assert!(storage.delete("old").unwrap());
        assert!(!dir.path().join("old.json").exists());
        assert!(!storage.delete("old").unwrap());
    }

    #[test]
    fn corrupt_file_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{").unwrap();
        assert!(matches!(
            load_bucket_file(&path),
            Err(CacheError::Corrupt { .. })
        ));
    }

    #[test]
    fn unreadable_files_skipped_on_open() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = CacheStorage::persistent(dir.path()).unwrap();
            storage
                .open("product-finder-v1")
                .unwrap()
                .put_all(vec![reply("http://shop/", "<html>")])
                .unwrap();
        }
        std::fs::write(dir.path().join("settings.json"), r#"{"theme":"dark"}"#).unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();

        let storage = CacheStorage::persistent(dir.path()).unwrap();

        assert_eq!(storage.keys().unwrap(), vec!["product-finder-v1"]);
        assert!(storage.match_url("http://shop/").unwrap().is_some());
        assert!(dir.path().join("settings.json").exists());
    }
}
