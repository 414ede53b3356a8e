//! HTTP error mapping for the upload API.
//!
//! Every failure renders as `{"detail": "<message>"}` with the status code
//! chosen here, so browser clients can show `detail` directly.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid file type. Please upload a PDF.")]
    InvalidUploadType,

    #[error("Missing form field: {0}")]
    MissingField(&'static str),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Malformed or oversized multipart body; keeps axum's status code.
    #[error("Invalid upload: {message}")]
    Multipart { status: StatusCode, message: String },

    #[error("{0} not found.")]
    MissingStaticAsset(String),

    /// Message is the converter's own, shown to the user as-is.
    #[error("{0}")]
    ConversionFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidUploadType | ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Multipart { status, .. } => *status,
            ApiError::MissingStaticAsset(_) => StatusCode::NOT_FOUND,
            ApiError::ConversionFailed(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::Multipart {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                "Internal error".to_string()
            }
            ApiError::ConversionFailed(e) => {
                tracing::warn!("Conversion failed: {}", e);
                e.clone()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
