//! Client configuration shared by the UI, cache and CLI crates.
//!
//! Values come from an optional TOML file; the CLI layers flags and
//! environment variables on top.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Result counts above this show the refine-your-search panel.
pub const DEFAULT_OVERFLOW_THRESHOLD: u64 = 50;

/// Bump the version suffix whenever the asset manifest changes.
pub const DEFAULT_CACHE_NAME: &str = "product-finder-v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    /// Backend origin, e.g. `http://localhost:5000` (no trailing slash needed).
    pub base_url: String,
    pub overflow_threshold: u64,
    pub cache_name: String,
    /// Directory for persisted cache buckets. In-memory only when unset.
    pub cache_dir: Option<PathBuf>,
    /// Per-request timeout. Requests never time out when unset.
    pub request_timeout_secs: Option<u64>,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            overflow_threshold: DEFAULT_OVERFLOW_THRESHOLD,
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            cache_dir: None,
            request_timeout_secs: None,
        }
    }
}

impl FinderConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        info!(path = %path.display(), base_url = %config.base_url, "loaded config");
        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_gives_defaults() {
        let config = FinderConfig::from_toml_str("").unwrap();
        assert_eq!(config, FinderConfig::default());
        assert_eq!(config.overflow_threshold, 50);
        assert_eq!(config.cache_name, "product-finder-v1");
    }

    #[test]
    fn partial_document_overrides() {
        let config = FinderConfig::from_toml_str(
            r#"
            base_url = "https://shop.example"
            overflow_threshold = 20
            "#,
        )
        .unwrap();
        assert_eq!(config.base_url, "https://shop.example");
        assert_eq!(config.overflow_threshold, 20);
        assert_eq!(config.cache_name, DEFAULT_CACHE_NAME);
        assert!(config.cache_dir.is_none());
    }

    #[test]
    fn wrong_type_is_parse_error() {
        let err = FinderConfig::from_toml_str("overflow_threshold = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cache_name = \"product-finder-v2\"").unwrap();
        writeln!(file, "request_timeout_secs = 10").unwrap();
        let config = FinderConfig::load(file.path()).unwrap();
        assert_eq!(config.cache_name, "product-finder-v2");
        assert_eq!(config.request_timeout_secs, Some(10));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = FinderConfig::load(Path::new("/nonexistent/finder.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn no_path_gives_defaults() {
        let config = FinderConfig::load_or_default(None).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }
}
