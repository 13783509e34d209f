use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::services::TranscriptionServiceError;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Request failures, mapped one-to-one onto HTTP statuses: the caller can
/// fix a `Validation` error by resubmitting; everything that goes wrong
/// past validation collapses into one generic 500.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Transcription(#[from] TranscriptionServiceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Transcription(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        match status {
            StatusCode::BAD_REQUEST => tracing::warn!(error = %message, "Rejected request"),
            _ => tracing::error!(error = %message, "Transcription request failed"),
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
