//! HTTP routes for synchronous and tracked archive operations

use crate::error::ApiError;
use crate::state::AppState;
use archivarius_core::jobs::{JobStatus, SessionId};
use archivarius_core::{ArchiveRequest, Operation, OperationResult};
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

pub const API_PREFIX: &str = "/api/v1";

/// Body of every synchronous reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// "ok" or "nok"
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: None,
        }
    }

    pub fn nok(message: impl Into<String>) -> Self {
        Self {
            status: "nok".to_string(),
            message: Some(message.into()),
        }
    }

    fn from_result(result: &OperationResult) -> Self {
        if result.is_success() {
            return Self::ok();
        }
        match &result.message {
            Some(message) => Self::nok(message.clone()),
            None => Self::nok(result.status_class.to_string()),
        }
    }
}

/// Reply to an accepted background request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsyncPostResponse {
    pub session_id: SessionId,
    pub status: String,
}

/// Outcome of a finished background job, shaped like a synchronous reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsyncResult {
    pub status_code: u16,
    pub response: Response,
}

/// Reply to a session poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsyncGetResponse {
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AsyncResult>,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_id: Option<String>,
}

/// Build the service router
pub fn router(state: AppState) -> Router {
    let body_limit = state.body_limit;

    Router::new()
        .route(&format!("{API_PREFIX}/compress"), post(compress_sync))
        .route(&format!("{API_PREFIX}/extract"), post(extract_sync))
        .route(
            &format!("{API_PREFIX}/compress/async"),
            post(compress_async).get(poll_session).delete(delete_session),
        )
        .route(
            &format!("{API_PREFIX}/extract/async"),
            post(extract_async).get(poll_session).delete(delete_session),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn compress_sync(
    state: State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<Response>), ApiError> {
    run_sync(state, body, Operation::Compress).await
}

async fn extract_sync(
    state: State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<Response>), ApiError> {
    run_sync(state, body, Operation::Extract).await
}

async fn compress_async(
    state: State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<AsyncPostResponse>, ApiError> {
    start_async(state, body, Operation::Compress).await
}

async fn extract_async(
    state: State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<AsyncPostResponse>, ApiError> {
    start_async(state, body, Operation::Extract).await
}

fn parse_request(body: &[u8]) -> Result<ArchiveRequest, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}

async fn run_sync(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
    operation: Operation,
) -> Result<(StatusCode, Json<Response>), ApiError> {
    let request = parse_request(&body?)?;
    let options = state.build_options.clone();

    let result = tokio::task::spawn_blocking(move || operation.run(&request, &options))
        .await
        .map_err(|e| ApiError::Internal(format!("{operation} worker failed: {e}")))?;

    let status = StatusCode::from_u16(result.status_class.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Ok((status, Json(Response::from_result(&result))))
}

async fn start_async(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
    operation: Operation,
) -> Result<Json<AsyncPostResponse>, ApiError> {
    let request = parse_request(&body?)?;

    let (id, session) = state.sessions.create_session();
    info!("Session {} created for {}", id, operation);
    state.launch(session, request, operation);

    Ok(Json(AsyncPostResponse {
        session_id: id,
        status: "ok".to_string(),
    }))
}

async fn poll_session(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<AsyncGetResponse>, ApiError> {
    let id = SessionId::from(query.session_id.unwrap_or_default());
    let session = state
        .sessions
        .get(&id)
        .ok_or(ApiError::SessionNotFound)?;

    let job_state = session.state();
    let result = job_state.result().map(|result| AsyncResult {
        status_code: result.status_class.http_status(),
        response: Response::from_result(result),
    });

    Ok(Json(AsyncGetResponse {
        status: job_state.status(),
        result,
    }))
}

async fn delete_session(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Json<Response> {
    if let Some(id) = query.session_id {
        let id = SessionId::from(id);
        if state.sessions.delete(&id) {
            info!("Session {} deleted", id);
        }
    }
    Json(Response::ok())
}
