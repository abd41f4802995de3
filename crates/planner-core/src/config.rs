//! Configuration model.
//!
//! `PlannerConfig` mirrors `config.toml`; `ApiConfig` is the resolved gateway
//! configuration after environment overrides and defaults are applied.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Environment variable supplying the API root address.
pub const API_URL_ENV: &str = "STUDY_PLANNER_API_URL";
/// Environment variable overriding the request timeout in milliseconds.
pub const API_TIMEOUT_ENV: &str = "STUDY_PLANNER_API_TIMEOUT_MS";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_API_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct PlannerConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// `[api]` section.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ApiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// `[logging]` section.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct LoggingSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl LoggingSettings {
    pub fn level_or_default(&self) -> &str {
        self.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

/// Resolved gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Root that relative request paths are resolved against.
    pub base_url: String,
    /// Abort threshold for a single call.
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::resolve(&ApiSettings::default())
    }

    /// Resolves the gateway configuration.
    ///
    /// Priority:
    /// 1. Environment variables (`STUDY_PLANNER_API_URL`, `STUDY_PLANNER_API_TIMEOUT_MS`)
    /// 2. `[api]` settings from config.toml
    /// 3. Built-in defaults
    pub fn resolve(settings: &ApiSettings) -> Self {
        let base_url = env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| settings.base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let timeout_ms = env::var(API_TIMEOUT_ENV)
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .or(settings.timeout_ms)
            .unwrap_or(DEFAULT_API_TIMEOUT_MS);

        Self::new(base_url, Duration::from_millis(timeout_ms))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_API_BASE_URL,
            Duration::from_millis(DEFAULT_API_TIMEOUT_MS),
        )
    }
}
