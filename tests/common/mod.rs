//! In-process mock of the store's HTTP surface for integration tests.
//!
//! Every request is recorded so tests can assert on what the probe sent,
//! and the behaviour of each endpoint can be degraded to simulate a broken
//! or half-started store.

#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use verified_probe::config::Target;

/// How each endpoint of the mock behaves
#[derive(Debug, Clone)]
pub struct MockBehavior {
    pub login_returns_token: bool,
    /// Raw login body that replaces the JSON response when set
    pub login_raw_body: Option<String>,
    /// Token returned by database selection; `None` omits the field
    pub database_token: Option<String>,
    pub set_returns_id: bool,
    pub get_returns_tx: bool,
    /// Raw bodies that replace the JSON response of the named endpoint
    pub use_raw_body: Option<String>,
    pub set_raw_body: Option<String>,
    pub get_raw_body: Option<String>,
    /// Endpoint that answers only after [`STALL`]
    pub stalled_endpoint: Option<&'static str>,
}

/// Longer than any request timeout the tests configure
pub const STALL: Duration = Duration::from_secs(3);

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            login_returns_token: true,
            login_raw_body: None,
            database_token: Some("db-token".to_string()),
            set_returns_id: true,
            get_returns_tx: true,
            use_raw_body: None,
            set_raw_body: None,
            get_raw_body: None,
            stalled_endpoint: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub endpoint: &'static str,
    pub database: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<RecordedCall>,
    issued_sessions: Vec<String>,
    values: HashMap<(String, String), String>,
    next_tx: u64,
}

#[derive(Clone)]
struct AppState {
    behavior: Arc<MockBehavior>,
    inner: Arc<Mutex<MockState>>,
}

pub struct MockStore {
    addr: SocketAddr,
    state: Arc<Mutex<MockState>>,
    server: JoinHandle<()>,
}

impl MockStore {
    pub async fn start() -> Self {
        Self::start_with(MockBehavior::default()).await
    }

    pub async fn start_with(behavior: MockBehavior) -> Self {
        let inner = Arc::new(Mutex::new(MockState::default()));
        let app_state = AppState {
            behavior: Arc::new(behavior),
            inner: inner.clone(),
        };

        let app = Router::new()
            .route("/login", post(login))
            .route("/db/use/:db", get(use_database))
            .route("/db/:db/verified/set", post(verified_set))
            .route("/db/:db/verified/get", post(verified_get))
            .with_state(app_state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock store");
        let addr = listener.local_addr().expect("Failed to read mock address");
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock store crashed");
        });

        Self {
            addr,
            state: inner,
            server,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn target(&self, database: &str) -> Target {
        Target::new(&self.base_url(), database).expect("valid mock target")
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.endpoint == endpoint)
            .collect()
    }

    pub fn calls_to_database(&self, endpoint: &str, database: &str) -> usize {
        self.calls_to(endpoint)
            .iter()
            .filter(|c| c.database.as_deref() == Some(database))
            .count()
    }

    pub fn issued_sessions(&self) -> Vec<String> {
        self.state.lock().unwrap().issued_sessions.clone()
    }
}

impl Drop for MockStore {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn stall_if_configured(behavior: &MockBehavior, endpoint: &str) {
    if behavior.stalled_endpoint == Some(endpoint) {
        tokio::time::sleep(STALL).await;
    }
}

fn raw_response(raw: &str) -> Response {
    (StatusCode::OK, raw.to_string()).into_response()
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn login(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    stall_if_configured(&state.behavior, "login").await;
    let mut inner = state.inner.lock().unwrap();
    inner.calls.push(RecordedCall {
        endpoint: "login",
        database: None,
        authorization: None,
        body: body.clone(),
    });

    if let Some(raw) = &state.behavior.login_raw_body {
        return raw_response(raw);
    }

    let valid = body["user"] == "aW1tdWRi" && body["password"] == "aW1tdWRi";
    if !valid {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid user name or password"})),
        )
            .into_response();
    }

    if !state.behavior.login_returns_token {
        return Json(json!({"warning": "token field withheld"})).into_response();
    }

    let session = format!("session-{}", inner.issued_sessions.len() + 1);
    inner.issued_sessions.push(session.clone());
    Json(json!({"token": session})).into_response()
}

async fn use_database(
    State(state): State<AppState>,
    Path(db): Path<String>,
    headers: HeaderMap,
) -> Response {
    stall_if_configured(&state.behavior, "use").await;
    let auth = authorization(&headers);
    let mut inner = state.inner.lock().unwrap();
    inner.calls.push(RecordedCall {
        endpoint: "use",
        database: Some(db.clone()),
        authorization: auth.clone(),
        body: Value::Null,
    });

    if let Some(raw) = &state.behavior.use_raw_body {
        return raw_response(raw);
    }

    let known_session = auth
        .as_ref()
        .is_some_and(|a| inner.issued_sessions.contains(a));
    if !known_session {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid token", "code": 16})),
        )
            .into_response();
    }

    match &state.behavior.database_token {
        Some(token) => Json(json!({"token": token})).into_response(),
        None => Json(json!({})).into_response(),
    }
}

async fn verified_set(
    State(state): State<AppState>,
    Path(db): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    stall_if_configured(&state.behavior, "set").await;
    let auth = authorization(&headers);
    let mut inner = state.inner.lock().unwrap();
    inner.calls.push(RecordedCall {
        endpoint: "set",
        database: Some(db.clone()),
        authorization: auth,
        body: body.clone(),
    });

    if let Some(raw) = &state.behavior.set_raw_body {
        return raw_response(raw);
    }

    if !state.behavior.set_returns_id {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "write rejected"})),
        )
            .into_response();
    }

    if let Some(kvs) = body["setRequest"]["KVs"].as_array() {
        for kv in kvs {
            if let (Some(key), Some(value)) = (kv["key"].as_str(), kv["value"].as_str()) {
                inner
                    .values
                    .insert((db.clone(), key.to_string()), value.to_string());
            }
        }
    }
    inner.next_tx += 1;
    Json(json!({"id": inner.next_tx.to_string(), "nentries": 1})).into_response()
}

async fn verified_get(
    State(state): State<AppState>,
    Path(db): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    stall_if_configured(&state.behavior, "get").await;
    let auth = authorization(&headers);
    let mut inner = state.inner.lock().unwrap();
    inner.calls.push(RecordedCall {
        endpoint: "get",
        database: Some(db.clone()),
        authorization: auth,
        body: body.clone(),
    });

    if let Some(raw) = &state.behavior.get_raw_body {
        return raw_response(raw);
    }

    let key = body["keyRequest"]["key"].as_str().unwrap_or_default().to_string();
    let value = inner.values.get(&(db, key.clone())).cloned();

    match (state.behavior.get_returns_tx, value) {
        (true, Some(value)) => {
            Json(json!({"tx": inner.next_tx.to_string(), "key": key, "value": value}))
                .into_response()
        }
        _ => (StatusCode::NOT_FOUND, Json(json!({"error": "key not found"}))).into_response(),
    }
}
