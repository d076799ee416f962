//! Configuration management for curfew
//!
//! Sources, from lowest to highest precedence:
//! 1. Built-in defaults
//! 2. ~/.config/curfew/config.toml (user defaults)
//! 3. curfew.toml (project config)
//! 4. curfew.local.toml (untracked local overrides)
//! 5. Environment variables (`CURFEW_<SECTION>__<KEY>`)

use anyhow::Result;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Top-level configuration for a curfew policy instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurfewConfig {
    pub policy: PolicyConfig,
    pub store: StoreConfig,
    pub audit: AuditConfig,
    pub attestation: AttestationConfig,
    pub relayer: RelayerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Label used in logs.
    pub name: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            name: "curfew".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StoreBackend {
    Memory,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            data_dir: PathBuf::from(".curfew/data"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AuditBackend {
    Memory,
    Jsonl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub backend: AuditBackend,
    pub file: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            backend: AuditBackend::Memory,
            file: PathBuf::from(".curfew/audit.jsonl"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttestationConfig {
    /// Base64 Ed25519 public key of the input gateway. Empty means unset.
    pub trusted_key: String,
}

impl AttestationConfig {
    /// Decodes the trusted gateway key.
    pub fn trusted_key_bytes(&self) -> Result<[u8; 32], ConfigError> {
        let encoded = self.trusted_key.trim();
        if encoded.is_empty() {
            return Err(ConfigError::MissingTrustedKey);
        }
        let decoded = STANDARD
            .decode(encoded)
            .map_err(|e| ConfigError::InvalidTrustedKey(e.to_string()))?;
        decoded
            .try_into()
            .map_err(|bytes: Vec<u8>| {
                ConfigError::InvalidTrustedKey(format!("decoded to {} bytes", bytes.len()))
            })
    }

    /// Encodes a gateway key for writing into config.
    pub fn encode_key(bytes: &[u8; 32]) -> String {
        STANDARD.encode(bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayerConfig {
    pub max_attempts: u32,
    pub retry_interval_ms: u64,
}

impl RelayerConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            retry_interval_ms: 500,
        }
    }
}

impl CurfewConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Parses a single TOML file with no layering.
    ///
    /// Relative paths resolve against the file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.validate()?;
        Ok(config)
    }

    /// Everything in memory; handy for tests and demos.
    pub fn ephemeral() -> Self {
        Self::default()
    }

    /// File-backed store and JSONL audit under `dir`.
    pub fn durable(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            store: StoreConfig {
                backend: StoreBackend::File,
                data_dir: dir.join("data"),
            },
            audit: AuditConfig {
                backend: AuditBackend::Jsonl,
                file: dir.join("audit.jsonl"),
            },
            ..Default::default()
        }
    }

    /// Resolve relative paths to absolute
    pub fn resolve_paths(&mut self, base_dir: impl AsRef<Path>) {
        let base = base_dir.as_ref();

        if self.store.data_dir.is_relative() {
            self.store.data_dir = base.join(&self.store.data_dir);
        }

        if self.audit.file.is_relative() {
            self.audit.file = base.join(&self.audit.file);
        }
    }

    /// Checks values that deserialize fine but cannot work.
    ///
    /// The trusted key is only checked when present; a missing key is
    /// reported when a verifier is actually built from it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.relayer.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if !self.attestation.trusted_key.trim().is_empty() {
            self.attestation.trusted_key_bytes()?;
        }
        Ok(())
    }
}
