//! Application wiring.
//!
//! Builds the gateway and session store over one shared durable store and
//! restores the previous session.

use crate::session::SessionStore;
use anyhow::{Context, Result};
use planner_core::config::ApiConfig;
use planner_core::storage::KeyValueStore;
use planner_infrastructure::{ConfigService, FileKeyValueStore};
use planner_interaction::HttpService;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Values that take precedence over the environment and config.toml.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub storage_file: Option<PathBuf>,
}

/// Everything a front end needs, created once at startup.
pub struct AppContext {
    api: ApiConfig,
    storage_path: PathBuf,
    session: SessionStore,
}

impl AppContext {
    /// Resolves configuration, opens durable storage, and restores the session.
    pub fn bootstrap(config_service: &ConfigService, overrides: Overrides) -> Result<Self> {
        let mut api = config_service.api_config();
        if let Some(url) = overrides.api_url {
            api = api.with_base_url(url);
        }
        if let Some(timeout_ms) = overrides.timeout_ms {
            api = api.with_timeout(Duration::from_millis(timeout_ms));
        }

        let storage_path = match overrides.storage_file {
            Some(path) => path,
            None => config_service
                .paths()
                .storage_file()
                .context("Failed to resolve session storage path")?,
        };

        tracing::debug!(
            "[AppContext] API {} (timeout {} ms), storage {}",
            api.base_url,
            api.timeout.as_millis(),
            storage_path.display()
        );

        let storage: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(storage_path.clone()));
        Ok(Self::with_storage(api, storage_path, storage))
    }

    /// Wires the gateway and session over `storage` and restores the session.
    pub fn with_storage(
        api: ApiConfig,
        storage_path: PathBuf,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        let http = HttpService::new(api.clone(), storage.clone());
        let session = SessionStore::new(http, storage);
        session.load();

        Self {
            api,
            storage_path,
            session,
        }
    }

    pub fn api(&self) -> &ApiConfig {
        &self.api
    }

    pub fn storage_path(&self) -> &PathBuf {
        &self.storage_path
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// The gateway shared with the session store.
    pub fn http(&self) -> Result<Arc<HttpService>> {
        self.session
            .http()
            .cloned()
            .context("Session store has no gateway")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planner_core::session::SessionStatus;
    use planner_core::storage::StorageKeys;
    use planner_infrastructure::PlannerPaths;
    use tempfile::TempDir;

    #[test]
    fn test_bootstrap_restores_stored_session() {
        let temp_dir = TempDir::new().unwrap();
        let storage_path = temp_dir.path().join("storage.json");
        let store = FileKeyValueStore::new(storage_path.clone());
        store.set(StorageKeys::AUTH_TOKEN, "tok123").unwrap();
        store
            .set(
                StorageKeys::USER_DATA,
                r#"{"id":"1","email":"a@b.com","name":"A"}"#,
            )
            .unwrap();

        let config_service = ConfigService::new(PlannerPaths::new(Some(temp_dir.path())));
        let context = AppContext::bootstrap(
            &config_service,
            Overrides {
                api_url: Some("http://planner.test/api/".into()),
                timeout_ms: Some(250),
                storage_file: Some(storage_path),
            },
        )
        .unwrap();

        assert_eq!(context.session().status(), SessionStatus::Authenticated);
        assert_eq!(context.api().base_url, "http://planner.test/api/");
        assert_eq!(context.api().timeout, Duration::from_millis(250));

        let http = context.http().unwrap();
        assert_eq!(http.base_url(), "http://planner.test/api/");
    }

    #[test]
    fn test_bootstrap_defaults_storage_under_home() {
        let temp_dir = TempDir::new().unwrap();
        let config_service = ConfigService::new(PlannerPaths::new(Some(temp_dir.path())));

        let context = AppContext::bootstrap(&config_service, Overrides::default()).unwrap();

        assert_eq!(
            context.storage_path(),
            &temp_dir.path().join("storage.json")
        );
        assert_eq!(context.session().status(), SessionStatus::Anonymous);
    }
}
