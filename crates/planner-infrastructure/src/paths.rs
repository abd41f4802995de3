//! Unified path management for planner files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/planner/           # Config directory (or $PLANNER_HOME)
//! ├── config.toml              # Application configuration
//! ├── storage.json             # Durable key-value storage (credential, identity)
//! └── logs/                    # Application logs
//!     └── planner.log.YYYY-MM-DD
//! ```

use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Overrides the planner home directory (used by tests and portable installs).
pub const PLANNER_HOME_ENV: &str = "PLANNER_HOME";

const APP_DIR: &str = "planner";

/// Errors that can occur during path resolution.
#[derive(Error, Debug)]
pub enum PathError {
    /// Config directory could not be determined.
    #[error("Cannot find config directory")]
    ConfigDirNotFound,
}

/// Path resolver for planner files.
///
/// With an explicit base, every path lives under it. Otherwise `$PLANNER_HOME`
/// is used when set, then the platform config directory.
#[derive(Debug, Clone, Default)]
pub struct PlannerPaths {
    base: Option<PathBuf>,
}

impl PlannerPaths {
    /// Creates a resolver, optionally rooted at `base`.
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the planner configuration directory.
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }

        if let Some(home) = env::var_os(PLANNER_HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(home));
        }

        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to config.toml.
    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Returns the path to the durable key-value storage file.
    ///
    /// # Security Note
    ///
    /// This file holds the bearer credential in plaintext.
    pub fn storage_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("storage.json"))
    }

    /// Returns the log directory.
    pub fn logs_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("logs"))
    }
}
