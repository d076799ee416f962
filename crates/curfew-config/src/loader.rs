//! Layered configuration loading.

use crate::{CurfewConfig, Paths};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Merges defaults, TOML files and environment into a [`CurfewConfig`].
///
/// Later sources override earlier ones. Environment variables use a double
/// underscore between section and key, e.g. `CURFEW_STORE__DATA_DIR`.
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
    user_config: bool,
}

impl ConfigLoader {
    /// Loader rooted at the current directory.
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "CURFEW".to_string(),
            user_config: true,
        }
    }

    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "CURFEW")
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Skip `~/.config/curfew/config.toml`.
    pub fn without_user_config(mut self) -> Self {
        self.user_config = false;
        self
    }

    pub fn load(self) -> Result<CurfewConfig> {
        let mut builder = config::Config::builder();

        // 1. Built-in defaults
        builder = builder.add_source(config::Config::try_from(&CurfewConfig::default())?);

        // 2. User config, 3. project config, 4. local overrides
        let mut files = Vec::with_capacity(3);
        if self.user_config {
            if let Ok(user_file) = Paths::new().user_config_file() {
                files.push(user_file);
            }
        }
        files.push(Paths::project_config_file(&self.project_dir));
        files.push(Paths::local_config_file(&self.project_dir));

        for file in files {
            builder = builder.add_source(
                config::File::from(file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 5. Environment
        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let merged = builder.build().context("Failed to build configuration")?;
        let mut curfew_config: CurfewConfig = merged
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        curfew_config.resolve_paths(&self.project_dir);
        curfew_config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", self.project_dir.display()))?;

        Ok(curfew_config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
