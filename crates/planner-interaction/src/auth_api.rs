//! HttpAuthApi - the authentication endpoints over the request gateway.

use crate::http::HttpService;
use async_trait::async_trait;
use planner_core::error::ApiError;
use planner_core::user::{AuthApi, AuthResponse, LoginForm, RegisterForm, User};
use std::sync::Arc;

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";
const VERIFY_PATH: &str = "/auth/verify";

/// [`AuthApi`] implementation that calls the planner REST API.
#[derive(Clone)]
pub struct HttpAuthApi {
    http: Arc<HttpService>,
}

impl HttpAuthApi {
    pub fn new(http: Arc<HttpService>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, form: &LoginForm) -> Result<AuthResponse, ApiError> {
        tracing::debug!("[HttpAuthApi] Logging in as {}", form.email);
        self.http.post(LOGIN_PATH, Some(form)).await
    }

    async fn register(&self, form: &RegisterForm) -> Result<AuthResponse, ApiError> {
        tracing::debug!("[HttpAuthApi] Registering {}", form.email);
        self.http.post(REGISTER_PATH, Some(form)).await
    }

    async fn verify(&self) -> Result<User, ApiError> {
        self.http.get(VERIFY_PATH, None).await
    }
}
