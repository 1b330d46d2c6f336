use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinError;

use crate::detection::DetectError;

pub const MISSING_IMAGE_MESSAGE: &str = "No image provided.";
pub const PROCESSING_FAILED_MESSAGE: &str = "Video frame processing failed.";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("request has no image field")]
    MissingImage,
    #[error("request body is not a valid multipart form: {0}")]
    NotMultipart(#[from] MultipartRejection),
    #[error("failed to read multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Detect(#[from] DetectError),
    #[error("inference task failed: {0}")]
    Task(#[from] JoinError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            UploadError::MissingImage => {
                tracing::debug!("upload rejected: no image field");
                (StatusCode::BAD_REQUEST, MISSING_IMAGE_MESSAGE)
            }
            err => {
                tracing::error!(error = %err, detail = ?err, "video frame processing failed");
                (StatusCode::INTERNAL_SERVER_ERROR, PROCESSING_FAILED_MESSAGE)
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
