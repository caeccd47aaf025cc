use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::core::client::error_classifier::ReplicaStoreError;

/// HTTP-facing error. The variant decides the status code; the payload is
/// internal context and is logged, never sent to the client (except for
/// validation errors, which only describe the client's own input).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

/// Helper for mapping any unknown error into internal error
pub fn internal_error<E: ToString>(err: E) -> AppError {
    AppError::InternalServerError(err.to_string())
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(detail) => format!("Invalid request: {}", detail),
            AppError::NotFound(_) => "Deployment not found".to_string(),
            AppError::Conflict(_) => {
                "Deployment was modified concurrently, retry the request".to_string()
            }
            AppError::InternalServerError(_) => "Internal server error".to_string(),
        }
    }
}

impl From<ReplicaStoreError> for AppError {
    fn from(err: ReplicaStoreError) -> Self {
        match err {
            ReplicaStoreError::NamespaceNotFound { .. }
            | ReplicaStoreError::DeploymentNotFound { .. } => AppError::NotFound(err.to_string()),
            ReplicaStoreError::Conflict { .. } => AppError::Conflict(err.to_string()),
            ReplicaStoreError::Unknown { .. } => internal_error(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();

        if status.is_server_error() {
            error!("{}", self);
        }

        let body = Json(json!({
            "message": self.public_message()
        }));

        (status, body).into_response()
    }
}
