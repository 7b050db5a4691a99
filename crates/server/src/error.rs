use std::any::Any;

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use flowlog::query::QueryErrors;
use flowlog::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Please upload a .tgz file")]
    MissingUpload,

    #[error("Error reading upload: {0}")]
    Upload(#[from] MultipartError),

    #[error("{0}")]
    Search(#[from] QueryErrors),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Response for a handler that panicked, installed via `CatchPanicLayer`.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::Internal(details).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MissingUpload => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": ApiError::MissingUpload.to_string() })),
            )
                .into_response(),
            ApiError::Upload(e) => {
                tracing::warn!("Rejected upload: {}", e);
                (
                    e.status(),
                    Json(json!({ "error": "Error processing TGZ file", "details": e.body_text() })),
                )
                    .into_response()
            }
            ApiError::Search(errors) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "error", "message": errors })),
            )
                .into_response(),
            ApiError::Internal(details) => {
                tracing::error!("Internal error: {}", details);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error", "details": details })),
                )
                    .into_response()
            }
            ApiError::Store(e) => {
                tracing::error!("Store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "status": "error", "message": e.to_string() })),
                )
                    .into_response()
            }
        }
    }
}
