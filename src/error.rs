use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::dto::upload::MessageResponse;

const MIB: u64 = 1024 * 1024;

/// Every way an upload, download or delete request can fail.
///
/// The `Display` text is the `message` returned to the client.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("File size is too large. Maximum size is {}MB.", .limit_bytes / MIB)]
    FileTooLarge { limit_bytes: u64 },

    #[error("Too many files uploaded.")]
    TooManyFiles,

    #[error("Unexpected file field.")]
    UnexpectedField(String),

    #[error("Please upload an image")]
    InvalidFileType,

    /// Malformed multipart body or any other failure of the multipart layer.
    #[error("{0}")]
    Multipart(String),

    #[error("No file uploaded")]
    NoFile,

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Wraps a multipart parsing error, recognising a body that tripped the
    /// request size limit.
    pub fn from_multipart(err: MultipartError, limit_bytes: u64) -> Self {
        let message = err.body_text();
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE || message.contains("length limit exceeded") {
            UploadError::FileTooLarge { limit_bytes }
        } else {
            UploadError::Multipart(message)
        }
    }

    /// A request without a usable multipart boundary (no body, JSON,
    /// urlencoded) carries no file field at all.
    pub fn from_rejection(rejection: MultipartRejection) -> Self {
        match rejection {
            MultipartRejection::InvalidBoundary(_) => UploadError::NoFile,
            other => UploadError::Multipart(other.body_text()),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            UploadError::FileTooLarge { .. }
            | UploadError::TooManyFiles
            | UploadError::UnexpectedField(_)
            | UploadError::InvalidFileType
            | UploadError::Multipart(_)
            | UploadError::NoFile
            | UploadError::InvalidFileName(_) => StatusCode::BAD_REQUEST,
            UploadError::NotFound(_) => StatusCode::NOT_FOUND,
            UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        let body = Json(MessageResponse {
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}
