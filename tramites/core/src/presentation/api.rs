// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP API
//!
//! axum router served by `tramites serve`. The browser signs in with its own
//! Graph bearer token and then identifies itself with the `x-session-id`
//! header. Errors are returned as `{ "error": <category>, "message": <text> }`.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::{
    AdminError, CalendarError, CalendarRequest, CsvFile, FormError, HistoryError, Portal, Session, SessionError,
    SubmissionError,
};
use crate::domain::error::{ErrorCategory, UserFacingError};
use crate::domain::request::{FieldMap, StatusUpdate};
use crate::infrastructure::csv_export::ExportError;
use crate::infrastructure::templates::RenderError;

pub const SESSION_HEADER: &str = "x-session-id";

const NOT_SIGNED_IN: &str = "No hay una sesión iniciada";

/// Registered session and when a request last used it
pub struct SessionEntry {
    session: Arc<Session>,
    last_used: Mutex<Instant>,
}

impl SessionEntry {
    fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            last_used: Mutex::new(Instant::now()),
        }
    }

    fn is_idle(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(*self.last_used.lock()) >= ttl
    }
}

pub struct AppState {
    pub portal: Arc<Portal>,
    pub sessions: DashMap<Uuid, SessionEntry>,
    pub idle_ttl: Duration,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(portal: Arc<Portal>) -> Self {
        let idle_ttl = Duration::from_secs(portal.config().spec.network.session_idle_minutes * 60);
        Self {
            portal,
            sessions: DashMap::new(),
            idle_ttl,
            start_time: Instant::now(),
        }
    }

    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    fn register(&self, session: Arc<Session>) {
        self.evict_idle();
        self.sessions.insert(session.id(), SessionEntry::new(session));
    }

    /// Drops sessions idle for longer than the TTL; returns how many
    pub fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|id, entry| {
            let keep = !entry.is_idle(now, self.idle_ttl);
            if !keep {
                entry.session.sign_out();
                debug!(session_id = %id, "Idle session evicted");
            }
            keep
        });
        before.saturating_sub(self.sessions.len())
    }

    fn session(&self, headers: &HeaderMap) -> Result<Arc<Session>, ApiError> {
        let id = headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .ok_or_else(ApiError::unauthenticated)?;

        let now = Instant::now();
        let session = {
            let entry = self.sessions.get(&id).ok_or_else(ApiError::unauthenticated)?;
            if entry.is_idle(now, self.idle_ttl) {
                None
            } else {
                *entry.last_used.lock() = now;
                Some(entry.session.clone())
            }
        };

        match session {
            Some(session) => Ok(session),
            None => {
                if let Some((_, entry)) = self.sessions.remove(&id) {
                    entry.session.sign_out();
                }
                Err(ApiError::unauthenticated())
            }
        }
    }

    /// Session when the header is present and known
    fn optional_session(&self, headers: &HeaderMap) -> Option<Arc<Session>> {
        self.session(headers).ok()
    }
}

pub fn app(portal: Arc<Portal>) -> Router {
    router(Arc::new(AppState::new(portal)))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/forms", get(list_forms_handler))
        .route("/api/forms/{key}", get(get_form_handler))
        .route(
            "/api/session",
            post(sign_in_handler).get(session_handler).delete(sign_out_handler),
        )
        .route("/api/session/token", put(replace_token_handler))
        .route("/forms/{key}", get(form_page_handler))
        .route("/api/requests/mine", get(my_requests_handler))
        .route("/api/requests/{key}", post(submit_handler))
        .route("/mine", get(my_requests_page_handler))
        .route("/api/admin/requests", get(admin_requests_handler))
        .route("/api/admin/requests/{item_id}", patch(update_status_handler))
        .route("/api/admin/export", get(export_handler).post(filtered_export_handler))
        .route("/admin", get(admin_page_handler))
        .route("/api/calendar", post(calendar_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: UserFacingError,
}

impl ApiError {
    fn new(status: StatusCode, category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            status,
            body: UserFacingError {
                category,
                message: message.into(),
            },
        }
    }

    /// Classified by the keyword table; status follows the category
    fn classified(err: &dyn std::error::Error) -> Self {
        let body = UserFacingError::from_error(err);
        let status = match body.category {
            ErrorCategory::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCategory::Permission => StatusCode::FORBIDDEN,
            ErrorCategory::AuthExpired => StatusCode::UNAUTHORIZED,
            ErrorCategory::Network | ErrorCategory::Document => StatusCode::BAD_GATEWAY,
            ErrorCategory::Generic => StatusCode::BAD_REQUEST,
        };
        Self { status, body }
    }

    fn local(status: StatusCode, err: &dyn std::error::Error) -> Self {
        Self::new(status, ErrorCategory::Generic, err.to_string())
    }

    fn unauthenticated() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ErrorCategory::AuthExpired, NOT_SIGNED_IN)
    }

    fn forbidden(err: &dyn std::error::Error) -> Self {
        Self::new(StatusCode::FORBIDDEN, ErrorCategory::Permission, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": self.body.category,
                "message": self.body.message,
            })),
        )
            .into_response()
    }
}

impl From<SubmissionError> for ApiError {
    fn from(err: SubmissionError) -> Self {
        match &err {
            SubmissionError::NotSignedIn => Self::unauthenticated(),
            SubmissionError::AlreadyInProgress => Self::local(StatusCode::CONFLICT, &err),
            SubmissionError::UnknownRequestType(_) => Self::local(StatusCode::NOT_FOUND, &err),
            SubmissionError::Validation(_) => Self::local(StatusCode::UNPROCESSABLE_ENTITY, &err),
            SubmissionError::Document(_) | SubmissionError::Upload(_) | SubmissionError::Persist(_) => {
                Self::classified(&err)
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match &err {
            SessionError::NotSignedIn => Self::unauthenticated(),
            SessionError::DomainNotAllowed(_) => Self::forbidden(&err),
            SessionError::TokenNotReplaceable => Self::local(StatusCode::BAD_REQUEST, &err),
            SessionError::Identity(_) => Self::classified(&err),
        }
    }
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        match &err {
            AdminError::NotSignedIn => Self::unauthenticated(),
            AdminError::Forbidden => Self::forbidden(&err),
            AdminError::InvalidAmount => Self::local(StatusCode::UNPROCESSABLE_ENTITY, &err),
            AdminError::Export(ExportError::Empty) => Self::local(StatusCode::NOT_FOUND, &err),
            AdminError::Export(_) => Self::local(StatusCode::INTERNAL_SERVER_ERROR, &err),
            AdminError::Gateway(_) => Self::classified(&err),
        }
    }
}

impl From<HistoryError> for ApiError {
    fn from(err: HistoryError) -> Self {
        match &err {
            HistoryError::NotSignedIn => Self::unauthenticated(),
            HistoryError::Gateway(_) => Self::classified(&err),
        }
    }
}

impl From<CalendarError> for ApiError {
    fn from(err: CalendarError) -> Self {
        match &err {
            CalendarError::UnknownRequestType(_) => Self::local(StatusCode::NOT_FOUND, &err),
            CalendarError::Template(_) => Self::local(StatusCode::INTERNAL_SERVER_ERROR, &err),
        }
    }
}

impl From<FormError> for ApiError {
    fn from(err: FormError) -> Self {
        match &err {
            FormError::UnknownRequestType(_) => Self::local(StatusCode::NOT_FOUND, &err),
            FormError::Template(_) => Self::local(StatusCode::INTERNAL_SERVER_ERROR, &err),
        }
    }
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        Self::local(StatusCode::INTERNAL_SERVER_ERROR, &err)
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// Handlers
// ============================================================================

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
        "sessions": state.sessions.len(),
    }))
}

#[derive(Serialize)]
struct FormSummary {
    key: &'static str,
    title: String,
    subtitle: String,
    fields: usize,
}

async fn list_forms_handler(State(state): State<Arc<AppState>>) -> Json<Vec<FormSummary>> {
    let summaries = state
        .portal
        .forms()
        .catalog()
        .forms()
        .iter()
        .map(|f| FormSummary {
            key: f.request_type.key(),
            title: f.title.clone(),
            subtitle: f.subtitle.clone(),
            fields: f.fields.len(),
        })
        .collect();
    Json(summaries)
}

async fn get_form_handler(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let profile = state.optional_session(&headers).and_then(|s| s.profile());
    let view = state
        .portal
        .forms()
        .describe(&key, profile.as_ref(), &FieldMap::new())
        .map_err(FormError::from)?;
    Ok(Json(view))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

async fn sign_in_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<impl IntoResponse> {
    let token = bearer_token(&headers).ok_or_else(|| {
        ApiError::new(
            StatusCode::UNAUTHORIZED,
            ErrorCategory::AuthExpired,
            "Token de acceso requerido (Authorization: Bearer)",
        )
    })?;

    let session = Arc::new(Session::delegated(token));
    state.portal.sign_in(&session).await?;

    let snapshot = session.snapshot();
    state.register(session);
    info!(session_id = %snapshot.session_id, "Session created");

    Ok((StatusCode::CREATED, Json(snapshot)))
}

async fn session_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<impl IntoResponse> {
    let session = state.session(&headers)?;
    Ok(Json(session.snapshot()))
}

#[derive(Deserialize)]
struct TokenBody {
    token: String,
}

async fn replace_token_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TokenBody>,
) -> ApiResult<StatusCode> {
    let session = state.session(&headers)?;
    session.replace_token(body.token)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn sign_out_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<StatusCode> {
    let session = state.session(&headers)?;
    session.sign_out();
    state.sessions.remove(&session.id());
    info!(session_id = %session.id(), "Session closed");
    Ok(StatusCode::NO_CONTENT)
}

async fn form_page_handler(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Html<String>> {
    let session = state.optional_session(&headers);
    let profile = session.as_ref().and_then(|s| s.profile());
    let user = session.as_deref().and_then(Portal::page_user);
    let html = state
        .portal
        .forms()
        .render_html(&key, profile.as_ref(), user.as_ref())?;
    Ok(Html(html))
}

/// JSON scalars become strings; nulls are dropped
fn field_map(raw: BTreeMap<String, serde_json::Value>) -> FieldMap {
    raw.into_iter()
        .filter_map(|(k, v)| match v {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((k, s)),
            other => Some((k, other.to_string())),
        })
        .collect()
}

async fn submit_handler(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(raw): Json<BTreeMap<String, serde_json::Value>>,
) -> ApiResult<impl IntoResponse> {
    let session = state.session(&headers)?;
    let receipt = state.portal.submit(&session, &key, field_map(raw)).await.map_err(|e| {
        warn!(request_type = %key, error = %e, "Submission failed");
        ApiError::from(e)
    })?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn my_requests_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let session = state.session(&headers)?;
    let records = state.portal.history(&session).my_requests(&session).await?;
    Ok(Json(records))
}

async fn my_requests_page_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Html<String>> {
    let session = state.session(&headers)?;
    let records = state.portal.history(&session).my_requests(&session).await?;
    Ok(Html(state.portal.history_page(&session, &records)?))
}

async fn admin_requests_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let session = state.session(&headers)?;
    let dashboard = state.portal.admin(&session).dashboard(&session).await?;
    Ok(Json(dashboard))
}

async fn admin_page_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<Html<String>> {
    let session = state.session(&headers)?;
    let dashboard = state.portal.admin(&session).dashboard(&session).await?;
    Ok(Html(state.portal.admin_page(&session, &dashboard)?))
}

async fn update_status_handler(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
    headers: HeaderMap,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<StatusCode> {
    let session = state.session(&headers)?;
    state
        .portal
        .admin(&session)
        .update_status(&session, &item_id, &update)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

fn csv_response(file: CsvFile) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, CsvFile::CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.file_name),
            ),
        ],
        file.bytes,
    )
        .into_response()
}

async fn export_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<Response> {
    let session = state.session(&headers)?;
    let file = state.portal.admin(&session).export_csv(&session).await?;
    Ok(csv_response(file))
}

#[derive(Deserialize)]
struct ExportSelection {
    folios: Vec<String>,
}

async fn filtered_export_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(selection): Json<ExportSelection>,
) -> ApiResult<Response> {
    let session = state.session(&headers)?;
    let file = state
        .portal
        .admin(&session)
        .export_filtered(&session, &selection.folios)
        .await?;
    Ok(csv_response(file))
}

async fn calendar_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CalendarRequest>,
) -> ApiResult<impl IntoResponse> {
    let session = state.session(&headers)?;
    let outcome = state.portal.calendar(&session).add_to_calendar(&request).await?;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_map_stringifies_scalars() {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_value(json!({
            "monto_total": 1500.5,
            "semestre": 3,
            "nombre_completo": "Ana",
            "vacio": null
        }))
        .unwrap();

        let fields = field_map(raw);
        assert_eq!(fields["monto_total"], "1500.5");
        assert_eq!(fields["semestre"], "3");
        assert_eq!(fields["nombre_completo"], "Ana");
        assert!(!fields.contains_key("vacio"));
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());
        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn test_submission_error_status() {
        assert_eq!(
            ApiError::from(SubmissionError::AlreadyInProgress).status,
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(SubmissionError::NotSignedIn).status,
            StatusCode::UNAUTHORIZED
        );
    }
}
