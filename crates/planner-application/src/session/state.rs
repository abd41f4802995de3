use parking_lot::RwLock;
use planner_core::session::{SessionSnapshot, SessionStatus, UnauthorizedHandler};
use planner_core::user::User;

/// In-memory session, shared between the session store and the gateway's
/// unauthorized hook.
///
/// Every method takes the lock for one short critical section; nothing here
/// is held across an `.await`.
#[derive(Debug, Default)]
pub struct SessionState {
    inner: RwLock<SessionSnapshot>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.read().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.read().status
    }

    pub fn user(&self) -> Option<User> {
        self.inner.read().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.read().token.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.read().is_loading
    }

    pub(crate) fn begin_load(&self) {
        let mut inner = self.inner.write();
        inner.status = SessionStatus::Loading;
        inner.is_loading = true;
    }

    pub(crate) fn set_loading(&self, is_loading: bool) {
        self.inner.write().is_loading = is_loading;
    }

    /// Leaves `is_loading` untouched; callers own that flag.
    pub(crate) fn authenticate(&self, user: User, token: String) {
        let mut inner = self.inner.write();
        inner.status = SessionStatus::Authenticated;
        inner.user = Some(user);
        inner.token = Some(token);
    }

    /// Replaces the identity while authenticated. Returns false otherwise.
    pub(crate) fn replace_user(&self, user: User) -> bool {
        let mut inner = self.inner.write();
        if inner.status != SessionStatus::Authenticated {
            return false;
        }
        inner.user = Some(user);
        true
    }

    pub(crate) fn clear(&self) {
        let mut inner = self.inner.write();
        inner.status = SessionStatus::Anonymous;
        inner.user = None;
        inner.token = None;
    }
}

impl UnauthorizedHandler for SessionState {
    fn on_unauthorized(&self) {
        self.clear();
        tracing::info!("[SessionState] Credential rejected by server; signed out");
    }
}
