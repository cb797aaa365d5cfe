//! Error types for tam-server
//!
//! Every failure leaves the API as `{"status": "failure", "message": ...}`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::{LibraryError, ReconcileError};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Identifiers matched nothing (400)
    #[error("{0}")]
    NotFound(String),

    /// Request cannot be carried out as asked (400)
    #[error("{0}")]
    InvalidRequest(String),

    /// Remote content service failed (502)
    #[error("{0}")]
    Remote(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),
}

impl From<ReconcileError> for ApiError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::NotFound(msg) => ApiError::NotFound(msg),
            ReconcileError::InvalidRequest(msg) => ApiError::InvalidRequest(msg),
            ReconcileError::RemoteFailure(_) => ApiError::Remote(err.to_string()),
            ReconcileError::Library(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<LibraryError> for ApiError {
    fn from(err: LibraryError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<crate::cloud::CloudError> for ApiError {
    fn from(err: crate::cloud::CloudError) -> Self {
        ReconcileError::RemoteFailure(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) | ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Remote(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let body = Json(json!({
            "status": "failure",
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
