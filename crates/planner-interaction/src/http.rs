//! HttpService - the request gateway for the planner REST API.
//!
//! Every call is bounded by the configured timeout, carries the stored bearer
//! credential when one exists, and fails with a classified [`ApiError`].
//! There are no retries.

use planner_core::config::ApiConfig;
use planner_core::error::ApiError;
use planner_core::session::UnauthorizedHandler;
use planner_core::storage::{KeyValueStore, StorageKeys, clear_credentials};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const JSON_CONTENT_TYPE: &str = "application/json";

/// A query-string value. Numbers are rendered as their JSON text.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Text(String),
    Number(Number),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Text(s) => f.write_str(s),
            QueryValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

macro_rules! query_value_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for QueryValue {
            fn from(value: $t) -> Self {
                QueryValue::Number(Number::from(value))
            }
        })*
    };
}

query_value_from_int!(i32, i64, u32, u64, usize);

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        match Number::from_f64(value) {
            Some(n) => QueryValue::Number(n),
            None => QueryValue::Text(value.to_string()),
        }
    }
}

/// Ordered query parameters.
pub type QueryParams = Vec<(String, QueryValue)>;

/// Describes one request. Built per call and not retained.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub method: Method,
    /// Applied over the default `Content-Type`; `Authorization` is always
    /// recomputed from storage afterwards.
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub params: Option<QueryParams>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            body: None,
            params: None,
        }
    }
}

impl RequestConfig {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = Some(params);
        self
    }
}

/// A file to send with [`HttpService::upload`].
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Reads a file from disk, naming the part after the file name.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }
}

/// The request gateway.
///
/// Owns no state beyond its configuration. It reads the credential from
/// durable storage on every call and never writes it, except to clear it
/// when the server answers 401.
#[derive(Clone)]
pub struct HttpService {
    client: Client,
    base_url: String,
    timeout: Duration,
    storage: Arc<dyn KeyValueStore>,
    unauthorized_handler: Option<Arc<dyn UnauthorizedHandler>>,
}

impl HttpService {
    /// Creates a gateway for `config` reading the credential from `storage`.
    pub fn new(config: ApiConfig, storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url,
            timeout: config.timeout,
            storage,
            unauthorized_handler: None,
        }
    }

    /// Installs a hook invoked after a 401 has cleared the stored session.
    pub fn with_unauthorized_handler(mut self, handler: Arc<dyn UnauthorizedHandler>) -> Self {
        self.unauthorized_handler = Some(handler);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // ============================================================================
    // Verbs
    // ============================================================================

    /// GET request
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<&QueryParams>,
    ) -> Result<T, ApiError> {
        let mut config = RequestConfig::new(Method::GET);
        config.params = params.cloned();
        self.request(path, config).await
    }

    /// POST request
    pub async fn post<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::POST, path, body).await
    }

    /// PUT request
    pub async fn put<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::PUT, path, body).await
    }

    /// PATCH request
    pub async fn patch<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::PATCH, path, body).await
    }

    /// DELETE request
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(path, RequestConfig::new(Method::DELETE)).await
    }

    /// Uploads a file as multipart form data.
    ///
    /// The file is sent in the `file` part; each extra field is appended as
    /// text. Only `Authorization` is set explicitly so the multipart boundary
    /// header is left to the client.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        file: UploadFile,
        extra_fields: Option<&Map<String, Value>>,
    ) -> Result<T, ApiError> {
        let url = self.build_url(path, None)?;

        let mut part = Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(mime_type) = &file.mime_type {
            part = part
                .mime_str(mime_type)
                .map_err(|e| ApiError::request(e.to_string()))?;
        }

        let mut form = Form::new().part("file", part);
        if let Some(fields) = extra_fields {
            for (key, value) in fields {
                form = form.text(key.clone(), form_text(value));
            }
        }

        let mut headers = HeaderMap::new();
        self.apply_authorization(&mut headers)?;

        tracing::debug!("[HttpService] POST {} (multipart)", url);

        let builder = self.client.post(url).headers(headers).multipart(form);
        self.execute(builder, ApiError::upload_timeout).await
    }

    /// Issues a request described by `config`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<T, ApiError> {
        let url = self.build_url(path, config.params.as_ref())?;
        let headers = self.build_headers(&config.headers)?;

        tracing::debug!("[HttpService] {} {}", config.method, url);

        let mut builder = self.client.request(config.method, url).headers(headers);
        if let Some(body) = &config.body {
            let bytes = serde_json::to_vec(body).map_err(|e| ApiError::request(e.to_string()))?;
            builder = builder.body(bytes);
        }

        self.execute(builder, ApiError::timeout).await
    }

    async fn send_with_body<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut config = RequestConfig::new(method);
        if let Some(body) = body {
            config.body =
                Some(serde_json::to_value(body).map_err(|e| ApiError::request(e.to_string()))?);
        }
        self.request(path, config).await
    }

    // ============================================================================
    // Request building
    // ============================================================================

    /// Resolves `path` against the base address and appends `params` in order.
    pub fn build_url(&self, path: &str, params: Option<&QueryParams>) -> Result<Url, ApiError> {
        let base = Url::parse(&self.base_url)
            .map_err(|e| ApiError::request(format!("Invalid base URL '{}': {}", self.base_url, e)))?;
        let mut url = base
            .join(path)
            .map_err(|e| ApiError::request(format!("Invalid request path '{}': {}", path, e)))?;

        if let Some(params) = params {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, &value.to_string());
            }
        }

        Ok(url)
    }

    /// Default JSON content type, then caller headers, then the bearer
    /// credential from storage.
    pub fn build_headers(&self, custom: &[(String, String)]) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        for (name, value) in custom {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::request(format!("Invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::request(format!("Invalid value for header '{}': {}", name, e)))?;
            headers.insert(name, value);
        }

        self.apply_authorization(&mut headers)?;
        Ok(headers)
    }

    fn apply_authorization(&self, headers: &mut HeaderMap) -> Result<(), ApiError> {
        if let Some(token) = self.auth_token() {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ApiError::request(format!("Invalid stored credential: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(())
    }

    /// Reads the stored credential. Unreadable storage counts as no credential.
    fn auth_token(&self) -> Option<String> {
        match self.storage.get(StorageKeys::AUTH_TOKEN) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!("[HttpService] Failed to read stored credential: {}", e);
                None
            }
        }
    }

    // ============================================================================
    // Execution and response handling
    // ============================================================================

    /// Races the exchange against the timeout. Dropping the exchange future
    /// on expiry cancels the in-flight request.
    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        on_timeout: fn() -> ApiError,
    ) -> Result<T, ApiError> {
        match tokio::time::timeout(self.timeout, self.exchange(builder)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    "[HttpService] Request timed out after {} ms",
                    self.timeout.as_millis()
                );
                Err(on_timeout())
            }
        }
    }

    async fn exchange<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await.map_err(classify_transport_error)?;
        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T, ApiError> {
        let status = response.status();

        if !status.is_success() {
            if status.as_u16() == 401 {
                self.clear_stored_session();
            }

            let body_message = response
                .bytes()
                .await
                .ok()
                .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok())
                .and_then(|body| extract_message(&body));

            let error = ApiError::from_status(status.as_u16(), body_message);
            tracing::warn!("[HttpService] Request failed ({}): {}", status, error);
            return Err(error);
        }

        let bytes = response.bytes().await.map_err(classify_transport_error)?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::parse(e.to_string()))
    }

    fn clear_stored_session(&self) {
        if let Err(e) = clear_credentials(self.storage.as_ref()) {
            tracing::warn!("[HttpService] Failed to clear stored credential: {}", e);
        }
        tracing::info!("[HttpService] Credential rejected; stored session cleared");

        if let Some(handler) = &self.unauthorized_handler {
            handler.on_unauthorized();
        }
    }
}

/// Normalizes transport failures. Builder errors keep their own message.
fn classify_transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::timeout()
    } else if err.is_decode() {
        ApiError::parse(err.to_string())
    } else if err.is_builder() {
        ApiError::request(err.to_string())
    } else {
        tracing::debug!("[HttpService] Transport error: {}", err);
        ApiError::network()
    }
}

/// Returns the `message` field of an error body when it is truthy.
fn extract_message(body: &Value) -> Option<String> {
    match body.get("message")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

fn form_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
