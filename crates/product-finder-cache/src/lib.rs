//! Cache layer: named response buckets filled at install time and a cache-first transport.

mod error;
pub mod manifest;
mod shim;
mod storage;

pub use error::CacheError;
pub use manifest::ASSET_MANIFEST;
pub use shim::{CachedTransport, Source, activate, install};
pub use storage::{CacheBucket, CacheStorage};
