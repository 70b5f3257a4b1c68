//! In-memory stand-in for the Okta users API.
//!
//! # Design
//! Users live in a `Vec` behind a `RwLock` so listings come back in creation
//! order. Every route sits behind an SSWS token check, and failures use
//! Okta's error body (`errorCode`, `errorSummary`, ...). Two extra routes
//! exist for transport tests: `/redirect` answers `302 Found`, `/slow` sleeps
//! long enough to be cancelled.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use uuid::Uuid;

/// Token accepted by `app()`.
pub const DEFAULT_TOKEN: &str = "00mock-server-token";

/// Default page size for `GET /api/v1/users`.
pub const DEFAULT_LIMIT: usize = 200;

/// How long `/slow` waits before answering.
pub const SLOW_DELAY: Duration = Duration::from_secs(30);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Staged,
    Active,
    Deprovisioned,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub status: UserStatus,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub profile: Map<String, Value>,
}

impl User {
    fn login(&self) -> Option<&str> {
        self.profile.get("login").and_then(Value::as_str)
    }

    /// Prefix match on login, email, first and last name, ignoring case.
    fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        ["login", "email", "firstName", "lastName"].iter().any(|field| {
            self.profile
                .get(*field)
                .and_then(Value::as_str)
                .is_some_and(|v| v.to_lowercase().starts_with(&query))
        })
    }
}

/// Body of `POST /api/v1/users` and `PUT /api/v1/users/{id}`.
#[derive(Deserialize)]
pub struct UserInput {
    #[serde(default)]
    pub profile: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct CreateParams {
    pub activate: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorCause {
    pub error_summary: String,
}

/// Okta's error payload.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_code: String,
    pub error_summary: String,
    pub error_link: String,
    pub error_id: String,
    pub error_causes: Vec<ErrorCause>,
}

/// A failed request, rendered as `ErrorBody`.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    code: &'static str,
    summary: String,
    causes: Vec<String>,
}

impl ApiFailure {
    fn new(status: StatusCode, code: &'static str, summary: impl Into<String>) -> Self {
        Self {
            status,
            code,
            summary: summary.into(),
            causes: Vec::new(),
        }
    }

    fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    fn invalid_token() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "E0000011", "Invalid token provided")
    }

    fn not_found(id: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "E0000007",
            format!("Not found: Resource not found: {id} (User)"),
        )
    }

    fn validation(cause: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "E0000001", "Api validation failed: login").with_cause(cause)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error_code: self.code.to_string(),
            error_summary: self.summary,
            error_link: self.code.to_string(),
            error_id: format!("oae{}", Uuid::new_v4().simple()),
            error_causes: self
                .causes
                .into_iter()
                .map(|error_summary| ErrorCause { error_summary })
                .collect(),
        };
        (self.status, Json(body)).into_response()
    }
}

pub type Db = Arc<RwLock<Vec<User>>>;

#[derive(Clone)]
struct AppState {
    users: Db,
    authorization: Arc<str>,
}

pub fn app() -> Router {
    app_with_token(DEFAULT_TOKEN)
}

/// Router that accepts only `Authorization: SSWS <token>`.
pub fn app_with_token(token: &str) -> Router {
    let state = AppState {
        users: Arc::new(RwLock::new(Vec::new())),
        authorization: format!("SSWS {token}").into(),
    };
    Router::new()
        .route("/api/v1/users", get(list_users).post(create_user))
        .route("/api/v1/users/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/api/v1/users/{id}/lifecycle/deactivate", post(deactivate_user))
        .route("/redirect", get(redirect))
        .route("/slow", get(slow))
        .layer(middleware::from_fn_with_state(state.clone(), require_token))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if presented != Some(&*state.authorization) {
        debug!(uri = %request.uri(), "rejected request without a valid token");
        return ApiFailure::invalid_token().into_response();
    }
    next.run(request).await
}

fn new_user_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("00u{}", &uuid[..17])
}

/// Find a user by id or login.
fn position(users: &[User], key: &str) -> Option<usize> {
    users
        .iter()
        .position(|u| u.id == key || u.login().is_some_and(|l| l.eq_ignore_ascii_case(key)))
}

fn check_login(users: &[User], profile: &Map<String, Value>, except: Option<&str>) -> Result<(), ApiFailure> {
    let login = match profile.get("login").and_then(Value::as_str) {
        Some(login) if !login.trim().is_empty() => login,
        _ => return Err(ApiFailure::validation("login: The field cannot be left blank")),
    };
    let taken = users.iter().any(|u| {
        Some(u.id.as_str()) != except && u.login().is_some_and(|l| l.eq_ignore_ascii_case(login))
    });
    if taken {
        return Err(ApiFailure::validation(
            "login: An object with this field already exists in the current organization",
        ));
    }
    Ok(())
}

async fn list_users(State(state): State<AppState>, Query(params): Query<ListParams>) -> Json<Vec<User>> {
    let users = state.users.read().await;
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let found = users
        .iter()
        .filter(|u| params.q.as_deref().map_or(true, |q| u.matches(q)))
        .take(limit)
        .cloned()
        .collect();
    Json(found)
}

async fn create_user(
    State(state): State<AppState>,
    Query(params): Query<CreateParams>,
    Json(input): Json<UserInput>,
) -> Result<Json<User>, ApiFailure> {
    let mut users = state.users.write().await;
    check_login(&users, &input.profile, None)?;

    let now = Utc::now();
    let status = if params.activate.unwrap_or(true) {
        UserStatus::Active
    } else {
        UserStatus::Staged
    };
    let user = User {
        id: new_user_id(),
        status,
        created: now,
        last_updated: now,
        profile: input.profile,
    };
    info!(id = %user.id, ?status, "created user");
    users.push(user.clone());
    Ok(Json(user))
}

async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<User>, ApiFailure> {
    let users = state.users.read().await;
    let index = position(&users, &id).ok_or_else(|| ApiFailure::not_found(&id))?;
    Ok(Json(users[index].clone()))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UserInput>,
) -> Result<Json<User>, ApiFailure> {
    let mut users = state.users.write().await;
    let index = position(&users, &id).ok_or_else(|| ApiFailure::not_found(&id))?;
    let own_id = users[index].id.clone();
    check_login(&users, &input.profile, Some(&own_id))?;

    let user = &mut users[index];
    user.profile = input.profile;
    user.last_updated = Utc::now();
    info!(id = %user.id, "updated user");
    Ok(Json(user.clone()))
}

async fn deactivate_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiFailure> {
    let mut users = state.users.write().await;
    let index = position(&users, &id).ok_or_else(|| ApiFailure::not_found(&id))?;
    let user = &mut users[index];
    user.status = UserStatus::Deprovisioned;
    user.last_updated = Utc::now();
    info!(id = %user.id, "deactivated user");
    Ok(Json(json!({})))
}

/// The first delete of a live user deactivates it; deleting a deactivated
/// user removes it.
async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiFailure> {
    let mut users = state.users.write().await;
    let index = position(&users, &id).ok_or_else(|| ApiFailure::not_found(&id))?;
    if users[index].status == UserStatus::Deprovisioned {
        let removed = users.remove(index);
        info!(id = %removed.id, "deleted user");
    } else {
        let user = &mut users[index];
        user.status = UserStatus::Deprovisioned;
        user.last_updated = Utc::now();
        info!(id = %user.id, "deactivated user on delete");
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn redirect() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/api/v1/users")])
}

async fn slow() -> StatusCode {
    tokio::time::sleep(SLOW_DELAY).await;
    StatusCode::OK
}
