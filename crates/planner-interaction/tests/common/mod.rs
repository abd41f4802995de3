//! Stub planner API used by the integration tests.

#![allow(dead_code)]

use axum::extract::{Multipart, Path, Query};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::routing::{any, get, post};
use axum::{Json, Router};
use planner_core::config::ApiConfig;
use planner_core::session::UnauthorizedHandler;
use planner_core::storage::{KeyValueStore, StorageKeys};
use planner_infrastructure::MemoryKeyValueStore;
use planner_interaction::HttpService;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;

pub const TOKEN: &str = "tok123";

pub fn example_user() -> Value {
    json!({"id": "u1", "email": "a@b.c", "name": "Ann"})
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Value> {
    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "authorization": header(&headers, "authorization"),
        "contentType": header(&headers, "content-type"),
        "body": serde_json::from_str::<Value>(&body).ok(),
    }))
}

async fn status(
    Path(code): Path<u16>,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let code = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = match query.get("message") {
        Some(message) => json!({ "message": message }),
        None => json!({ "error": "stub" }),
    };
    (code, Json(body))
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({}))
}

async fn not_json() -> &'static str {
    "<html>maintenance</html>"
}

async fn upload(headers: HeaderMap, mut multipart: Multipart) -> Json<Value> {
    let mut fields = serde_json::Map::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let text = field.text().await.unwrap();
        fields.insert(
            name,
            json!({"fileName": file_name, "contentType": content_type, "text": text}),
        );
    }

    Json(json!({
        "authorization": header(&headers, "authorization"),
        "contentType": header(&headers, "content-type"),
        "fields": fields,
    }))
}

async fn login(Json(form): Json<Value>) -> (StatusCode, Json<Value>) {
    if form["password"] == "secret" {
        (
            StatusCode::OK,
            Json(json!({ "user": example_user(), "token": TOKEN })),
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Invalid credentials" })),
        )
    }
}

async fn register(Json(form): Json<Value>) -> (StatusCode, Json<Value>) {
    if form["password"] != form["confirmPassword"] {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Passwords do not match" })),
        );
    }
    let user = json!({"id": "u2", "email": form["email"], "name": form["name"]});
    (StatusCode::OK, Json(json!({ "user": user, "token": "tok-new" })))
}

async fn verify(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let expected = format!("Bearer {}", TOKEN);
    if header(&headers, "authorization").as_deref() == Some(expected.as_str()) {
        (StatusCode::OK, Json(example_user()))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Token expired" })),
        )
    }
}

/// Starts the stub and returns its base URL (`http://127.0.0.1:<port>/api/`).
pub async fn spawn_stub() -> String {
    let app = Router::new()
        .route("/api/echo", any(echo))
        .route("/api/status/{code}", any(status))
        .route("/api/slow", any(slow))
        .route("/api/not-json", get(not_json))
        .route("/api/upload", post(upload))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/verify", get(verify));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/api/", address)
}

/// A base URL nothing listens on.
pub async fn closed_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api/", address)
}

pub fn store_with_session() -> Arc<MemoryKeyValueStore> {
    Arc::new(MemoryKeyValueStore::with_entries([
        (StorageKeys::AUTH_TOKEN, TOKEN.to_string()),
        (StorageKeys::USER_DATA, example_user().to_string()),
    ]))
}

pub fn gateway(base_url: &str, store: Arc<MemoryKeyValueStore>) -> HttpService {
    gateway_with_timeout(base_url, store, Duration::from_secs(5))
}

pub fn gateway_with_timeout(
    base_url: &str,
    store: Arc<MemoryKeyValueStore>,
    timeout: Duration,
) -> HttpService {
    let store: Arc<dyn KeyValueStore> = store;
    HttpService::new(ApiConfig::new(base_url, timeout), store)
}

/// Counts 401 notifications.
#[derive(Default)]
pub struct CountingHandler(AtomicUsize);

impl CountingHandler {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl UnauthorizedHandler for CountingHandler {
    fn on_unauthorized(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}
