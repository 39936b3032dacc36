//! HTTP error responses

use crate::api::Response as ApiResponse;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Failure of a request before or outside the archive operation
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body was not a valid request descriptor
    #[error("incorrect request format ({0})")]
    BadRequest(String),
    /// Body could not be read, e.g. it exceeds the configured limit
    #[error("unable to read request body ({0})")]
    Body(#[from] BytesRejection),
    /// Unknown or missing session id
    #[error("session not found")]
    SessionNotFound,
    /// The blocking worker could not deliver a result
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Body(rejection) => rejection.status(),
            ApiError::SessionNotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::nok(self.to_string());
        (self.status(), Json(body)).into_response()
    }
}
