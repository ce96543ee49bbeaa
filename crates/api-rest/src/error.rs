//! Mapping of failures to HTTP responses.
//!
//! | Failure | Status |
//! |---|---|
//! | no file, wrong MIME type, bad JSON, structural violation, bad id | 400 |
//! | unknown bundle id | 404 |
//! | semantic violation | 422 |
//! | store or processing failure | 500 |
//!
//! Every error body is `{"error": "<message>"}`.

use api_shared::ErrorRes;
use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dualcode_core::StoreError;
use fhir::{PrecheckError, SemanticError, StructuralError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No file provided")]
    MissingFile,

    #[error("Only JSON files are accepted")]
    NotJson,

    #[error("Invalid JSON format")]
    InvalidJson,

    #[error("Invalid FHIR Bundle: {0}")]
    Structural(#[from] StructuralError),

    #[error("{0}")]
    Semantic(#[from] SemanticError),

    #[error("{0}")]
    Precheck(#[from] PrecheckError),

    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Invalid bundle id")]
    InvalidBundleId,

    #[error("Bundle not found")]
    NotFound,

    #[error("Failed to process bundle")]
    ProcessingFailed,

    #[error("Internal server error")]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFile
            | ApiError::NotJson
            | ApiError::InvalidJson
            | ApiError::Structural(_)
            | ApiError::Precheck(_)
            | ApiError::InvalidBundleId => StatusCode::BAD_REQUEST,
            ApiError::Multipart(e) => e.status(),
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Semantic(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ProcessingFailed | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            ApiError::Store(e) => tracing::error!("Bundle store error: {:?}", e),
            ApiError::Multipart(e) if status == StatusCode::PAYLOAD_TOO_LARGE => {
                tracing::warn!("Rejected oversized upload: {}", e)
            }
            _ if status.is_client_error() => tracing::info!("Bundle request rejected: {}", self),
            _ => tracing::error!("Bundle request failed: {}", self),
        }

        (
            status,
            Json(ErrorRes {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
