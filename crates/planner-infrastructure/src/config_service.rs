//! Configuration service implementation.
//!
//! This module provides a ConfigService that loads the planner configuration
//! from config.toml and resolves the gateway configuration from it.

use crate::paths::{PathError, PlannerPaths};
use parking_lot::RwLock;
use planner_core::config::{ApiConfig, PlannerConfig};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Configuration service that loads and caches config.toml.
#[derive(Debug, Clone)]
pub struct ConfigService {
    paths: PlannerPaths,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<PlannerConfig>>>,
}

impl ConfigService {
    /// Creates a new ConfigService.
    ///
    /// The configuration is loaded lazily on first access.
    pub fn new(paths: PlannerPaths) -> Self {
        Self {
            paths,
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn paths(&self) -> &PlannerPaths {
        &self.paths
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// A missing file yields the defaults. A file that cannot be read or
    /// parsed is logged and also yields the defaults.
    pub fn get_config(&self) -> PlannerConfig {
        if let Some(cached) = self.config.read().as_ref() {
            return cached.clone();
        }

        let loaded = self.load().unwrap_or_else(|e| {
            tracing::warn!("[ConfigService] {}; using defaults", e);
            PlannerConfig::default()
        });

        *self.config.write() = Some(loaded.clone());
        loaded
    }

    /// Resolves the gateway configuration (environment > file > defaults).
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::resolve(&self.get_config().api)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        *self.config.write() = None;
    }

    /// Reads config.toml without touching the cache.
    pub fn load(&self) -> Result<PlannerConfig, ConfigError> {
        let path = self.paths.config_file()?;

        if !path.exists() {
            tracing::debug!("[ConfigService] No config file at {}", path.display());
            return Ok(PlannerConfig::default());
        }

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }
}
