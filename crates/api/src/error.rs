//! API error responses

use alerting::AlertError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use event_intake::IntakeError;
use serde_json::json;
use storage::StorageError;
use thiserror::Error;
use tracing::{error, warn};

/// Errors returned by handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing token")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Alert(#[from] AlertError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingToken => StatusCode::UNAUTHORIZED,
            ApiError::InvalidToken => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) | ApiError::Intake(_) => StatusCode::BAD_REQUEST,
            ApiError::Alert(AlertError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            ApiError::Alert(AlertError::Config(_)) | ApiError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Alert(AlertError::InvalidRequest(reason)) => reason.clone(),
            other => other.to_string(),
        };

        if status.is_server_error() {
            error!("Request failed: {}", message);
        } else {
            warn!("Request rejected ({}): {}", status.as_u16(), message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
