use super::state::SessionState;
use planner_core::error::ApiError;
use planner_core::session::{SessionSnapshot, SessionStatus};
use planner_core::storage::{KeyValueStore, StorageKeys, clear_credentials};
use planner_core::user::{AuthApi, AuthResponse, LoginForm, RegisterForm, User, UserPatch};
use planner_interaction::{HttpAuthApi, HttpService};
use std::sync::Arc;

/// Owns the authenticated session.
///
/// `SessionStore` is responsible for:
/// - Restoring the session from durable storage on startup
/// - Signing in and registering through the auth API
/// - Persisting the credential and identity
/// - Signing out, explicitly or when the gateway sees a 401
///
/// Storage is always written before memory. Overlapping operations are not
/// serialized; a `load` that finishes after a `login` overwrites it.
pub struct SessionStore {
    auth_api: Arc<dyn AuthApi>,
    storage: Arc<dyn KeyValueStore>,
    state: Arc<SessionState>,
    http: Option<Arc<HttpService>>,
}

impl SessionStore {
    /// Creates a session store over `http`.
    ///
    /// Installs the session state as the gateway's unauthorized hook, so a
    /// 401 from any call signs the session out in memory as well.
    ///
    /// # Arguments
    ///
    /// * `http` - The gateway; it must read from the same `storage`
    /// * `storage` - Durable storage for the credential and identity
    pub fn new(http: HttpService, storage: Arc<dyn KeyValueStore>) -> Self {
        let state = Arc::new(SessionState::new());
        let http = Arc::new(http.with_unauthorized_handler(state.clone()));
        let auth_api = Arc::new(HttpAuthApi::new(http.clone()));

        Self {
            auth_api,
            storage,
            state,
            http: Some(http),
        }
    }

    /// Creates a session store over an arbitrary auth API.
    pub fn with_auth_api(
        auth_api: Arc<dyn AuthApi>,
        storage: Arc<dyn KeyValueStore>,
        state: Arc<SessionState>,
    ) -> Self {
        Self {
            auth_api,
            storage,
            state,
            http: None,
        }
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot()
    }

    pub fn user(&self) -> Option<User> {
        self.state.user()
    }

    pub fn token(&self) -> Option<String> {
        self.state.token()
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.user().is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    /// The shared gateway, when this store was built over one.
    pub fn http(&self) -> Option<&Arc<HttpService>> {
        self.http.as_ref()
    }

    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    // ============================================================================
    // Operations
    // ============================================================================

    /// Restores the session from durable storage.
    ///
    /// With both the credential and a parseable identity stored the session
    /// becomes authenticated without contacting the server. An unreadable or
    /// unparseable record is removed. If either key is missing the session
    /// is anonymous and storage is left as it is.
    pub fn load(&self) {
        self.state.begin_load();

        let token = self.storage.get(StorageKeys::AUTH_TOKEN);
        let user_data = self.storage.get(StorageKeys::USER_DATA);

        match (token, user_data) {
            (Ok(Some(token)), Ok(Some(user_data))) if !token.is_empty() && !user_data.is_empty() => {
                match serde_json::from_str::<User>(&user_data) {
                    Ok(user) => {
                        tracing::info!("[SessionStore] Restored session for {}", user.email);
                        self.state.authenticate(user, token);
                    }
                    Err(e) => {
                        tracing::warn!("[SessionStore] Stored identity is unreadable: {}", e);
                        self.discard_stored_session();
                        self.state.clear();
                    }
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("[SessionStore] Failed to read stored session: {}", e);
                self.discard_stored_session();
                self.state.clear();
            }
            _ => {
                tracing::debug!("[SessionStore] No stored session");
                self.state.clear();
            }
        }

        self.state.set_loading(false);
    }

    /// Signs in with `form`.
    ///
    /// # Errors
    ///
    /// Returns the gateway's error unchanged, or `ApiError::Storage` if the
    /// session cannot be persisted.
    pub async fn login(&self, form: &LoginForm) -> Result<User, ApiError> {
        self.state.set_loading(true);

        let result = match self.auth_api.login(form).await {
            Ok(response) => self.establish(response),
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            tracing::warn!("[SessionStore] Login failed: {}", e);
        }

        self.state.set_loading(false);
        result
    }

    /// Creates an account and signs in with it.
    ///
    /// # Errors
    ///
    /// Same as [`SessionStore::login`].
    pub async fn register(&self, form: &RegisterForm) -> Result<User, ApiError> {
        self.state.set_loading(true);

        let result = match self.auth_api.register(form).await {
            Ok(response) => self.establish(response),
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            tracing::warn!("[SessionStore] Registration failed: {}", e);
        }

        self.state.set_loading(false);
        result
    }

    /// Signs out. Calling it while signed out changes nothing.
    pub fn logout(&self) {
        self.discard_stored_session();
        self.state.clear();
        tracing::info!("[SessionStore] Signed out");
    }

    /// Merges `patch` into the current identity and persists it.
    ///
    /// Returns `Ok(None)` without doing anything while signed out.
    pub fn update_user(&self, patch: UserPatch) -> Result<Option<User>, ApiError> {
        let Some(mut user) = self.state.user() else {
            return Ok(None);
        };

        user.apply(patch);
        self.storage
            .set(StorageKeys::USER_DATA, &serde_json::to_string(&user)?)?;
        self.state.replace_user(user.clone());

        Ok(Some(user))
    }

    /// Confirms the stored credential with the server and refreshes the
    /// identity from its answer.
    ///
    /// A rejected credential has already signed the session out by the time
    /// this returns.
    pub async fn verify(&self) -> Result<User, ApiError> {
        let user = self.auth_api.verify().await?;

        if self.state.status() == SessionStatus::Authenticated {
            self.storage
                .set(StorageKeys::USER_DATA, &serde_json::to_string(&user)?)?;
            self.state.replace_user(user.clone());
        }

        Ok(user)
    }

    fn establish(&self, response: AuthResponse) -> Result<User, ApiError> {
        let AuthResponse { user, token } = response;

        // The credential is only ever stored together with its identity.
        if let Err(e) = self.persist(&user, &token) {
            self.discard_stored_session();
            return Err(e);
        }
        self.state.authenticate(user.clone(), token);

        tracing::info!("[SessionStore] Signed in as {}", user.email);
        Ok(user)
    }

    fn persist(&self, user: &User, token: &str) -> Result<(), ApiError> {
        let user_data = serde_json::to_string(user)?;
        self.storage.set(StorageKeys::AUTH_TOKEN, token)?;
        self.storage.set(StorageKeys::USER_DATA, &user_data)?;
        Ok(())
    }

    fn discard_stored_session(&self) {
        if let Err(e) = clear_credentials(self.storage.as_ref()) {
            tracing::warn!("[SessionStore] Failed to clear stored session: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use planner_core::error::messages;
    use planner_core::storage::StorageError;
    use planner_infrastructure::{FileKeyValueStore, MemoryKeyValueStore};
    use serde_json::Map;
    use tempfile::TempDir;

    /// Memory store whose identity writes fail.
    #[derive(Default)]
    struct IdentityWriteFails(MemoryKeyValueStore);

    impl KeyValueStore for IdentityWriteFails {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == StorageKeys::USER_DATA {
                return Err(StorageError::Lock("disk full".into()));
            }
            self.0.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.0.remove(key)
        }
    }

    fn user() -> User {
        User {
            id: "1".into(),
            email: "a@b.com".into(),
            name: "A".into(),
            created_at: None,
            updated_at: None,
            extra: Map::new(),
        }
    }

    struct FakeAuthApi {
        response: Result<AuthResponse, ApiError>,
        verified: Result<User, ApiError>,
        logins: Mutex<Vec<String>>,
    }

    impl FakeAuthApi {
        fn succeeding() -> Self {
            Self {
                response: Ok(AuthResponse {
                    user: user(),
                    token: "tok123".into(),
                }),
                verified: Ok(user()),
                logins: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: ApiError) -> Self {
            Self {
                response: Err(error.clone()),
                verified: Err(error),
                logins: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AuthApi for FakeAuthApi {
        async fn login(&self, form: &LoginForm) -> Result<AuthResponse, ApiError> {
            self.logins.lock().push(form.email.clone());
            self.response.clone()
        }

        async fn register(&self, _form: &RegisterForm) -> Result<AuthResponse, ApiError> {
            self.response.clone()
        }

        async fn verify(&self) -> Result<User, ApiError> {
            self.verified.clone()
        }
    }

    fn store_with(
        api: FakeAuthApi,
        storage: Arc<MemoryKeyValueStore>,
    ) -> (SessionStore, Arc<FakeAuthApi>) {
        store_with_storage(api, storage)
    }

    fn store_with_storage(
        api: FakeAuthApi,
        storage: Arc<dyn KeyValueStore>,
    ) -> (SessionStore, Arc<FakeAuthApi>) {
        let api = Arc::new(api);
        let store = SessionStore::with_auth_api(
            api.clone(),
            storage,
            Arc::new(SessionState::new()),
        );
        (store, api)
    }

    fn login_form() -> LoginForm {
        LoginForm {
            email: "a@b.com".into(),
            password: "pw".into(),
        }
    }

    #[test]
    fn test_load_restores_without_network() {
        let storage = Arc::new(MemoryKeyValueStore::with_entries([
            (StorageKeys::AUTH_TOKEN, "tok123"),
            (StorageKeys::USER_DATA, r#"{"id":"1","email":"a@b.com","name":"A"}"#),
        ]));
        let (store, api) = store_with(FakeAuthApi::succeeding(), storage);

        store.load();

        assert_eq!(store.status(), SessionStatus::Authenticated);
        assert_eq!(store.token().as_deref(), Some("tok123"));
        assert_eq!(store.user(), Some(user()));
        assert!(store.is_authenticated());
        assert!(!store.is_loading());
        assert!(api.logins.lock().is_empty());
    }

    #[test]
    fn test_load_discards_corrupt_identity() {
        let storage = Arc::new(MemoryKeyValueStore::with_entries([
            (StorageKeys::AUTH_TOKEN, "tok123"),
            (StorageKeys::USER_DATA, "not-json"),
        ]));
        let (store, _) = store_with(FakeAuthApi::succeeding(), storage.clone());

        store.load();

        assert_eq!(store.status(), SessionStatus::Anonymous);
        assert!(!store.is_authenticated());
        assert!(!store.is_loading());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_load_with_missing_key_leaves_storage_alone() {
        let storage = Arc::new(MemoryKeyValueStore::with_entries([(
            StorageKeys::AUTH_TOKEN,
            "tok123",
        )]));
        let (store, _) = store_with(FakeAuthApi::succeeding(), storage.clone());

        store.load();

        assert_eq!(store.status(), SessionStatus::Anonymous);
        assert_eq!(
            storage.get(StorageKeys::AUTH_TOKEN).unwrap().as_deref(),
            Some("tok123")
        );
    }

    #[tokio::test]
    async fn test_login_persists_then_authenticates() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let (store, api) = store_with(FakeAuthApi::succeeding(), storage.clone());
        store.load();

        let signed_in = store.login(&login_form()).await.unwrap();

        assert_eq!(signed_in, user());
        assert_eq!(store.status(), SessionStatus::Authenticated);
        assert!(!store.is_loading());
        assert_eq!(
            storage.get(StorageKeys::AUTH_TOKEN).unwrap().as_deref(),
            Some("tok123")
        );
        let stored: User =
            serde_json::from_str(&storage.get(StorageKeys::USER_DATA).unwrap().unwrap()).unwrap();
        assert_eq!(stored, user());
        assert_eq!(*api.logins.lock(), vec!["a@b.com".to_string()]);
    }

    #[tokio::test]
    async fn test_login_failure_is_returned_unchanged() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let rejection = ApiError::from_status(400, Some("Invalid credentials".into()));
        let (store, _) = store_with(FakeAuthApi::failing(rejection.clone()), storage.clone());
        store.load();

        let err = store.login(&login_form()).await.unwrap_err();

        assert_eq!(err, rejection);
        assert_eq!(store.status(), SessionStatus::Anonymous);
        assert!(!store.is_loading());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_register_signs_in() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let (store, _) = store_with(FakeAuthApi::succeeding(), storage.clone());

        let form = RegisterForm {
            name: "A".into(),
            email: "a@b.com".into(),
            password: "pw".into(),
            confirm_password: "pw".into(),
        };
        store.register(&form).await.unwrap();

        assert!(store.is_authenticated());
        assert_eq!(storage.len(), 2);
    }

    #[tokio::test]
    async fn test_register_timeout_passes_through() {
        let (store, _) = store_with(
            FakeAuthApi::failing(ApiError::timeout()),
            Arc::new(MemoryKeyValueStore::new()),
        );

        let form = RegisterForm {
            name: "A".into(),
            email: "a@b.com".into(),
            password: "pw".into(),
            confirm_password: "pw".into(),
        };
        let err = store.register(&form).await.unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(err.message(), messages::REQUEST_TIMEOUT);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let (store, _) = store_with(FakeAuthApi::succeeding(), storage.clone());
        store.login(&login_form()).await.unwrap();

        store.logout();
        assert_eq!(store.status(), SessionStatus::Anonymous);
        assert!(storage.is_empty());

        store.logout();
        assert_eq!(store.status(), SessionStatus::Anonymous);
        assert_eq!(store.user(), None);
    }

    #[tokio::test]
    async fn test_update_user_merges_and_persists() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let (store, _) = store_with(FakeAuthApi::succeeding(), storage.clone());
        store.login(&login_form()).await.unwrap();

        let updated = store
            .update_user(UserPatch {
                name: Some("Anna".into()),
                ..Default::default()
            })
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Anna");
        assert_eq!(updated.email, "a@b.com");
        assert_eq!(store.user().unwrap().name, "Anna");
        let stored: User =
            serde_json::from_str(&storage.get(StorageKeys::USER_DATA).unwrap().unwrap()).unwrap();
        assert_eq!(stored.name, "Anna");
    }

    #[tokio::test]
    async fn test_update_user_persists_id_and_extra_fields() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let (store, _) = store_with(FakeAuthApi::succeeding(), storage.clone());
        store.login(&login_form()).await.unwrap();

        let mut extra = Map::new();
        extra.insert("avatar".into(), "b.png".into());
        store
            .update_user(UserPatch {
                id: Some("42".into()),
                extra,
                ..Default::default()
            })
            .unwrap();

        let stored: serde_json::Value =
            serde_json::from_str(&storage.get(StorageKeys::USER_DATA).unwrap().unwrap()).unwrap();
        assert_eq!(stored["id"], "42");
        assert_eq!(stored["avatar"], "b.png");
        assert_eq!(store.user().unwrap().id, "42");
    }

    #[test]
    fn test_update_user_while_anonymous_is_noop() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let (store, _) = store_with(FakeAuthApi::succeeding(), storage.clone());
        store.load();

        let result = store
            .update_user(UserPatch {
                name: Some("Anna".into()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(result, None);
        assert_eq!(store.user(), None);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_verify_refreshes_identity() {
        let storage = Arc::new(MemoryKeyValueStore::with_entries([
            (StorageKeys::AUTH_TOKEN, "tok123"),
            (
                StorageKeys::USER_DATA,
                r#"{"id":"1","email":"a@b.com","name":"Old"}"#,
            ),
        ]));
        let (store, _) = store_with(FakeAuthApi::succeeding(), storage.clone());
        store.load();
        assert_eq!(store.user().unwrap().name, "Old");

        store.verify().await.unwrap();

        assert_eq!(store.user().unwrap().name, "A");
        assert!(
            storage
                .get(StorageKeys::USER_DATA)
                .unwrap()
                .unwrap()
                .contains("\"name\":\"A\"")
        );
    }

    #[tokio::test]
    async fn test_failed_identity_write_leaves_no_credential_behind() {
        let storage = Arc::new(IdentityWriteFails::default());
        let store = SessionStore::with_auth_api(
            Arc::new(FakeAuthApi::succeeding()),
            storage.clone(),
            Arc::new(SessionState::new()),
        );
        store.load();

        let err = store.login(&login_form()).await.unwrap_err();

        assert_eq!(err.kind(), planner_core::ErrorKind::Other);
        assert!(err.message().contains("disk full"));
        assert_eq!(store.status(), SessionStatus::Anonymous);
        assert!(!store.is_loading());
        assert_eq!(storage.get(StorageKeys::AUTH_TOKEN).unwrap(), None);
        assert_eq!(storage.get(StorageKeys::USER_DATA).unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_storage_file_is_repaired_by_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        std::fs::write(&path, "{ not json").unwrap();
        let storage = Arc::new(FileKeyValueStore::new(path.clone()));
        let (store, _) = store_with_storage(FakeAuthApi::succeeding(), storage.clone());

        store.load();
        assert_eq!(store.status(), SessionStatus::Anonymous);
        assert_eq!(storage.get(StorageKeys::AUTH_TOKEN).unwrap(), None);

        store.login(&login_form()).await.unwrap();

        assert_eq!(store.status(), SessionStatus::Authenticated);
        assert_eq!(
            storage.get(StorageKeys::AUTH_TOKEN).unwrap().as_deref(),
            Some("tok123")
        );
    }
}
