//! HTTP error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use internhub_lifecycle::LifecycleError;
use internhub_storage::StorageError;
use thiserror::Error;

/// Error returned by request handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed request
    #[error("{0}")]
    BadRequest(String),

    /// Missing or unparsable caller identity
    #[error("Missing or invalid X-User-Id header")]
    Unauthorized,

    /// Lifecycle operation failed
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Store failed outside a lifecycle operation
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Lifecycle(e) => match e {
                LifecycleError::Validation(_) | LifecycleError::InvalidTransition(_) => {
                    StatusCode::BAD_REQUEST
                }
                LifecycleError::NotFound(_) => StatusCode::NOT_FOUND,
                LifecycleError::UnassignedMentor(_) | LifecycleError::AlreadyEvaluated(_) => {
                    StatusCode::CONFLICT
                }
                LifecycleError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
                LifecycleError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        (status, Json(serde_json::json!({ "message": self.to_string() }))).into_response()
    }
}
