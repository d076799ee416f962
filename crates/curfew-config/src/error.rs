//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("attestation.trusted_key is not set")]
    MissingTrustedKey,

    #[error("attestation.trusted_key must be 32 base64-encoded bytes: {0}")]
    InvalidTrustedKey(String),

    #[error("relayer.max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("cannot determine user config directory")]
    NoHomeDirectory,
}
