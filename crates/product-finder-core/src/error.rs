use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// How a failure is presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure or non-OK HTTP status.
    NetworkFailure,
    /// Response body (or a nested payload) did not parse.
    MalformedPayload,
    /// Camera or decoder could not be initialised.
    DeviceUnavailable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkFailure => "network_failure",
            Self::MalformedPayload => "malformed_payload",
            Self::DeviceUnavailable => "device_unavailable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
