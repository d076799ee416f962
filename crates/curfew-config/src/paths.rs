//! Where configuration and policy data live on disk.

use crate::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const PROJECT_FILE: &str = "curfew.toml";
pub const LOCAL_FILE: &str = "curfew.local.toml";
pub const STATE_DIR: &str = ".curfew";

/// XDG-aware path discovery for curfew.
pub struct Paths {
    project_dirs: Option<ProjectDirs>,
}

impl Paths {
    pub fn new() -> Self {
        Self {
            project_dirs: ProjectDirs::from("rs", "curfew", "curfew"),
        }
    }

    /// `~/.config/curfew/` on Linux.
    pub fn user_config_dir(&self) -> Result<PathBuf, ConfigError> {
        self.project_dirs
            .as_ref()
            .map(|p| p.config_dir().to_path_buf())
            .ok_or(ConfigError::NoHomeDirectory)
    }

    pub fn user_config_file(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.user_config_dir()?.join("config.toml"))
    }

    pub fn project_config_file(project_dir: impl AsRef<Path>) -> PathBuf {
        project_dir.as_ref().join(PROJECT_FILE)
    }

    /// Untracked per-machine overrides.
    pub fn local_config_file(project_dir: impl AsRef<Path>) -> PathBuf {
        project_dir.as_ref().join(LOCAL_FILE)
    }

    /// Default home for snapshots and audit logs.
    pub fn state_dir(project_dir: impl AsRef<Path>) -> PathBuf {
        project_dir.as_ref().join(STATE_DIR)
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}
