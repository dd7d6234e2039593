//! In-process imitation of the WakaTime OAuth and resource endpoints.
//!
//! Tokens are opaque UUID strings. Every `/api/v1` route requires either the
//! fixed API key (Basic) or a live access token (Bearer). Control routes
//! under `/mock` let tests expire tokens and script the next API status.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const CLIENT_ID: &str = "mock-client-id";
pub const CLIENT_SECRET: &str = "mock-client-secret";
pub const AUTH_CODE: &str = "mock-auth-code";
pub const API_KEY: &str = "waka_mock_api_key";
pub const USERNAME: &str = "mock-user";
pub const EXPIRES_IN: u64 = 3600;

/// Server-side token bookkeeping and request counters.
#[derive(Debug, Default)]
pub struct MockState {
    pub access_tokens: HashSet<String>,
    pub refresh_tokens: HashSet<String>,
    pub token_requests: usize,
    pub revoke_requests: usize,
    pub api_requests: usize,
    pub heartbeats: Vec<Value>,
    /// Last `Authorization` header seen on an API route.
    pub last_authorization: Option<String>,
    scripted: VecDeque<(u16, String)>,
}

impl MockState {
    fn issue(&mut self) -> (String, String) {
        let access = format!("at_{}", Uuid::new_v4().simple());
        let refresh = format!("rt_{}", Uuid::new_v4().simple());
        self.access_tokens.insert(access.clone());
        self.refresh_tokens.insert(refresh.clone());
        (access, refresh)
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let Some(value) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
            return false;
        };
        if let Some(token) = value.strip_prefix("Bearer ") {
            return self.access_tokens.contains(token);
        }
        if let Some(encoded) = value.strip_prefix("Basic ") {
            return STANDARD
                .decode(encoded)
                .map(|raw| raw == API_KEY.as_bytes())
                .unwrap_or(false);
        }
        false
    }
}

pub type Db = Arc<RwLock<MockState>>;

pub fn app() -> Router {
    app_with_state(Db::default())
}

pub fn app_with_state(db: Db) -> Router {
    Router::new()
        .route("/oauth/token", post(token))
        .route("/oauth/revoke", post(revoke))
        .route("/api/v1/meta", get(meta))
        .route("/api/v1/users/{user}", get(user))
        .route("/api/v1/users/{user}/status_bar/today", get(status_bar_today))
        .route("/api/v1/users/{user}/heartbeats", get(list_heartbeats).post(create_heartbeat))
        .route("/api/v1/users/{user}/heartbeats.bulk", post(create_heartbeats_bulk))
        .route("/api/v1/users/{user}/goals", get(goals))
        .route("/mock/expire", post(expire_tokens))
        .route("/mock/next_status", post(script_status))
        .fallback(not_found)
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, Db::default()).await
}

pub async fn run_with_state(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock WakaTime server listening");
    }
    axum::serve(listener, app_with_state(db)).await
}

fn form_response(status: StatusCode, pairs: &[(&str, &str)]) -> Response {
    let body = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    (
        status,
        [(header::CONTENT_TYPE, "application/x-www-form-urlencoded")],
        body,
    )
        .into_response()
}

fn oauth_error(status: StatusCode, error: &str) -> Response {
    form_response(status, &[("error", error)])
}

async fn token(State(db): State<Db>, Form(form): Form<HashMap<String, String>>) -> Response {
    let mut state = db.write().await;
    state.token_requests += 1;

    let field = |name: &str| form.get(name).map(String::as_str).unwrap_or_default();
    if field("client_id") != CLIENT_ID || field("client_secret") != CLIENT_SECRET {
        return oauth_error(StatusCode::UNAUTHORIZED, "invalid_client");
    }

    match field("grant_type") {
        "authorization_code" => {
            if field("code") != AUTH_CODE || field("redirect_uri").is_empty() {
                return oauth_error(StatusCode::BAD_REQUEST, "invalid_grant");
            }
        }
        "refresh_token" => {
            let presented = field("refresh_token").to_string();
            if !state.refresh_tokens.remove(&presented) {
                return oauth_error(StatusCode::BAD_REQUEST, "invalid_grant");
            }
        }
        _ => return oauth_error(StatusCode::BAD_REQUEST, "unsupported_grant_type"),
    }

    let (access, refresh) = state.issue();
    debug!(grant_type = field("grant_type"), "issued tokens");
    let expires_in = EXPIRES_IN.to_string();
    form_response(
        StatusCode::OK,
        &[
            ("access_token", access.as_str()),
            ("refresh_token", refresh.as_str()),
            ("expires_in", expires_in.as_str()),
            ("token_type", "bearer"),
        ],
    )
}

async fn revoke(State(db): State<Db>, Form(form): Form<HashMap<String, String>>) -> StatusCode {
    let mut state = db.write().await;
    state.revoke_requests += 1;

    let field = |name: &str| form.get(name).map(String::as_str).unwrap_or_default();
    if field("client_id") != CLIENT_ID || field("client_secret") != CLIENT_SECRET {
        return StatusCode::UNAUTHORIZED;
    }
    if field("all") == "true" {
        state.access_tokens.clear();
        state.refresh_tokens.clear();
    } else if let Some(token) = form.get("token") {
        state.access_tokens.remove(token);
        state.refresh_tokens.remove(token);
    } else {
        return StatusCode::BAD_REQUEST;
    }
    StatusCode::OK
}

/// Bookkeeping shared by every API route: count, authenticate, and pop any
/// scripted status.
async fn gate(db: &Db, headers: &HeaderMap) -> Result<(), Response> {
    let mut state = db.write().await;
    state.api_requests += 1;
    state.last_authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if let Some((status, body)) = state.scripted.pop_front() {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return Err((status, body).into_response());
    }
    if !state.authorized(headers) {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "unauthorized"})),
        )
            .into_response());
    }
    Ok(())
}

async fn meta(State(db): State<Db>, headers: HeaderMap) -> Response {
    if let Err(response) = gate(&db, &headers).await {
        return response;
    }
    Json(json!({"data": {"ips": {"api": ["127.0.0.1"]}}})).into_response()
}

async fn user(State(db): State<Db>, headers: HeaderMap, Path(user): Path<String>) -> Response {
    if let Err(response) = gate(&db, &headers).await {
        return response;
    }
    if user != "current" && user != USERNAME {
        return not_found().await.into_response();
    }
    Json(json!({"data": {"id": "00000000-0000-0000-0000-000000000001", "username": USERNAME}}))
        .into_response()
}

async fn status_bar_today(State(db): State<Db>, headers: HeaderMap) -> Response {
    if let Err(response) = gate(&db, &headers).await {
        return response;
    }
    Json(json!({"data": {"grand_total": {"text": "1 hr 5 mins", "total_seconds": 3900.0}}}))
        .into_response()
}

#[derive(Deserialize)]
struct DateQuery {
    date: Option<String>,
}

async fn list_heartbeats(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<DateQuery>,
) -> Response {
    if let Err(response) = gate(&db, &headers).await {
        return response;
    }
    if query.date.is_none() {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "date is required"}))).into_response();
    }
    let state = db.read().await;
    Json(json!({"data": state.heartbeats})).into_response()
}

fn store_heartbeat(state: &mut MockState, mut heartbeat: Value) -> Value {
    if let Some(object) = heartbeat.as_object_mut() {
        object.insert("id".to_string(), json!(Uuid::new_v4().to_string()));
    }
    state.heartbeats.push(heartbeat.clone());
    heartbeat
}

async fn create_heartbeat(State(db): State<Db>, headers: HeaderMap, Json(heartbeat): Json<Value>) -> Response {
    if let Err(response) = gate(&db, &headers).await {
        return response;
    }
    let mut state = db.write().await;
    let stored = store_heartbeat(&mut state, heartbeat);
    (StatusCode::CREATED, Json(json!({"data": stored}))).into_response()
}

async fn create_heartbeats_bulk(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(heartbeats): Json<Vec<Value>>,
) -> Response {
    if let Err(response) = gate(&db, &headers).await {
        return response;
    }
    let mut state = db.write().await;
    let responses: Vec<Value> = heartbeats
        .into_iter()
        .map(|hb| json!([{"data": store_heartbeat(&mut state, hb)}, 201]))
        .collect();
    (StatusCode::ACCEPTED, Json(json!({"responses": responses}))).into_response()
}

async fn goals(State(db): State<Db>, headers: HeaderMap) -> Response {
    if let Err(response) = gate(&db, &headers).await {
        return response;
    }
    Json(json!({"data": [], "total": 0, "total_pages": 0})).into_response()
}

/// Invalidate every access token; refresh tokens stay valid.
async fn expire_tokens(State(db): State<Db>) -> StatusCode {
    db.write().await.access_tokens.clear();
    StatusCode::NO_CONTENT
}

#[derive(Deserialize)]
struct ScriptedStatus {
    status: u16,
    #[serde(default)]
    body: String,
}

/// Make the next API request answer with a fixed status and body.
async fn script_status(State(db): State<Db>, Form(input): Form<ScriptedStatus>) -> StatusCode {
    db.write().await.scripted.push_back((input.status, input.body));
    StatusCode::NO_CONTENT
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({"error": "not found"})))
}
