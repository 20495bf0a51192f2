//! In-process mock of the dashboard backend, used by the integration tests.
//!
//! Serves the auth endpoints with a controllable token lifecycle (rotate the
//! valid access token, refuse refreshes, hand out bad tokens) plus enough of
//! the resource surface to exercise the typed bindings.

// not every test binary touches every helper
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

pub const ALICE_ID: &str = "9f2b7c46-3d1a-4e8b-b6a5-2c9d8e7f6a5b";
pub const SOURCE_ID: &str = "1a2b3c4d-5e6f-4a8b-9c0d-1e2f3a4b5c6d";

pub struct MockState {
    valid_access: Mutex<String>,
    valid_refresh: Mutex<String>,
    accept_refresh: AtomicBool,
    /// When set, refresh succeeds but grants this (possibly bogus) token.
    refresh_grant_override: Mutex<Option<String>>,
    pub refresh_calls: AtomicUsize,
    pub me_calls: AtomicUsize,
}

impl MockState {
    fn new() -> Self {
        Self {
            valid_access: Mutex::new("access-1".to_string()),
            valid_refresh: Mutex::new("refresh-1".to_string()),
            accept_refresh: AtomicBool::new(true),
            refresh_grant_override: Mutex::new(None),
            refresh_calls: AtomicUsize::new(0),
            me_calls: AtomicUsize::new(0),
        }
    }

    pub fn valid_access(&self) -> String {
        self.valid_access.lock().unwrap().clone()
    }

    pub fn valid_refresh(&self) -> String {
        self.valid_refresh.lock().unwrap().clone()
    }

    /// Rotate the server-side valid access token, leaving previously issued
    /// tokens stale (the mock's stand-in for expiry).
    pub fn rotate_access(&self, token: &str) {
        *self.valid_access.lock().unwrap() = token.to_string();
    }

    pub fn refuse_refresh(&self) {
        self.accept_refresh.store(false, Ordering::SeqCst);
    }

    pub fn grant_bogus_token_on_refresh(&self, token: &str) {
        *self.refresh_grant_override.lock().unwrap() = Some(token.to_string());
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn me_count(&self) -> usize {
        self.me_calls.load(Ordering::SeqCst)
    }

    fn user_body(&self) -> Value {
        json!({
            "id": ALICE_ID,
            "username": "alice",
            "email": "alice@example.com",
            "first_name": "Alice",
            "last_name": "Ng",
            "role": "admin",
            "is_active": true
        })
    }
}

pub struct MockBackend {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockBackend {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

pub async fn spawn() -> MockBackend {
    let state = Arc::new(MockState::new());
    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().expect("mock backend addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve mock backend");
    });

    MockBackend { addr, state }
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(me))
        .route("/auth/change-password", post(change_password))
        .route("/users/:id", put(update_user))
        .route("/datasources", get(list_datasources).post(create_datasource))
        .route("/datasources/:id", get(get_datasource).delete(delete_datasource))
        .route("/datasets/execute-query", post(execute_query))
        .route("/datasets/:id/preview", get(preview_dataset))
        .route("/charts/:id/data", get(chart_data))
        .with_state(state)
}

type Reply = (StatusCode, Json<Value>);

fn message(status: StatusCode, text: &str) -> Reply {
    (status, Json(json!({ "message": text })))
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn authed(state: &MockState, headers: &HeaderMap) -> Result<(), Reply> {
    match bearer(headers) {
        Some(token) if token == state.valid_access() => Ok(()),
        _ => Err(message(StatusCode::UNAUTHORIZED, "token expired")),
    }
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Reply {
    let username = body.get("username").and_then(Value::as_str);
    let password = body.get("password").and_then(Value::as_str);

    if username == Some("alice") && password == Some("pw") {
        (
            StatusCode::OK,
            Json(json!({
                "access_token": state.valid_access(),
                "refresh_token": state.valid_refresh(),
                "user": state.user_body()
            })),
        )
    } else {
        message(StatusCode::UNAUTHORIZED, "invalid credentials")
    }
}

async fn register(Json(body): Json<Value>) -> Reply {
    match body.get("username").and_then(Value::as_str) {
        Some("taken") => message(StatusCode::CONFLICT, "Username already exists"),
        Some(_) => message(StatusCode::CREATED, "User registered successfully"),
        None => message(StatusCode::BAD_REQUEST, "username is required"),
    }
}

async fn refresh(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Reply {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let presented = bearer(&headers);
    let valid = presented.as_deref() == Some(state.valid_refresh().as_str());
    if !valid || !state.accept_refresh.load(Ordering::SeqCst) {
        return message(StatusCode::UNAUTHORIZED, "invalid refresh token");
    }

    // hand out whatever the server currently considers valid, unless a test
    // asked for a bogus grant
    let granted = state
        .refresh_grant_override
        .lock()
        .unwrap()
        .clone()
        .unwrap_or_else(|| state.valid_access());

    (StatusCode::OK, Json(json!({ "access_token": granted })))
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Reply {
    state.me_calls.fetch_add(1, Ordering::SeqCst);

    if let Err(reply) = authed(&state, &headers) {
        return reply;
    }
    (StatusCode::OK, Json(state.user_body()))
}

async fn change_password(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Reply {
    if let Err(reply) = authed(&state, &headers) {
        return reply;
    }
    message(StatusCode::OK, "Password changed successfully")
}

async fn update_user(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if let Err(reply) = authed(&state, &headers) {
        return reply;
    }
    if id != ALICE_ID {
        return message(StatusCode::NOT_FOUND, "User not found");
    }

    let mut user = state.user_body();
    for field in ["first_name", "last_name", "email"] {
        if let Some(value) = body.get(field) {
            user[field] = value.clone();
        }
    }
    (StatusCode::OK, Json(user))
}

fn datasource_body() -> Value {
    json!({
        "id": SOURCE_ID,
        "name": "warehouse",
        "description": "main warehouse",
        "type": "postgresql",
        "created_by": ALICE_ID
    })
}

async fn list_datasources(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    if let Err(reply) = authed(&state, &headers) {
        return reply;
    }

    let page: i64 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    (
        StatusCode::OK,
        Json(json!({
            "data": [datasource_body()],
            "total": 1,
            "pages": 1,
            "page": page,
            "per_page": 20
        })),
    )
}

async fn create_datasource(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if let Err(reply) = authed(&state, &headers) {
        return reply;
    }
    let name = match body.get("name").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => name,
        _ => return message(StatusCode::BAD_REQUEST, "Name and type are required"),
    };

    let mut created = datasource_body();
    created["name"] = json!(name);
    if let Some(kind) = body.get("type") {
        created["type"] = kind.clone();
    }
    (StatusCode::CREATED, Json(created))
}

async fn get_datasource(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Reply {
    if let Err(reply) = authed(&state, &headers) {
        return reply;
    }
    if id == SOURCE_ID {
        (StatusCode::OK, Json(datasource_body()))
    } else {
        message(StatusCode::NOT_FOUND, "Data source not found")
    }
}

async fn delete_datasource(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Reply {
    if let Err(reply) = authed(&state, &headers) {
        return reply;
    }
    if id == SOURCE_ID {
        message(StatusCode::OK, "Data source deleted successfully")
    } else {
        message(StatusCode::NOT_FOUND, "Data source not found")
    }
}

fn table_body() -> Value {
    json!({
        "columns": ["id", "name", "value"],
        "rows": [[1, "Item 1", 100], [2, "Item 2", 200]]
    })
}

async fn execute_query(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if let Err(reply) = authed(&state, &headers) {
        return reply;
    }
    if body.get("query").and_then(Value::as_str).unwrap_or("").is_empty() {
        return message(StatusCode::BAD_REQUEST, "query is required");
    }
    (StatusCode::OK, Json(table_body()))
}

async fn preview_dataset(
    State(state): State<Arc<MockState>>,
    Path(_id): Path<String>,
    headers: HeaderMap,
    Query(_params): Query<HashMap<String, String>>,
) -> Reply {
    if let Err(reply) = authed(&state, &headers) {
        return reply;
    }
    (StatusCode::OK, Json(table_body()))
}

async fn chart_data(
    State(state): State<Arc<MockState>>,
    Path(_id): Path<String>,
    headers: HeaderMap,
) -> Reply {
    if let Err(reply) = authed(&state, &headers) {
        return reply;
    }
    (
        StatusCode::OK,
        Json(json!({
            "labels": ["Category 1", "Category 2", "Category 3"],
            "datasets": [{ "label": "Values", "data": [65, 59, 80] }]
        })),
    )
}
