//! Error types for the merge service.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the merge pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// The upload contained no files
    #[error("no files provided")]
    NoFilesProvided,

    /// A file's extension is outside the configured allowlist
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    /// The external converter failed for one input
    #[error("conversion failed for {filename}: {diagnostics}")]
    ConversionFailed { filename: String, diagnostics: String },

    /// PDF concatenation failed
    #[error("merge failed: {0}")]
    MergeFailed(String),

    /// The multipart payload could not be decoded
    #[error("invalid upload: {0}")]
    BadUpload(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NoFilesProvided | Error::UnsupportedType(_) | Error::BadUpload(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::ConversionFailed { .. } | Error::MergeFailed(_) | Error::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::NoFilesProvided | Error::UnsupportedType(_) | Error::BadUpload(_) => {
                tracing::debug!("Client error: {}", self);
            }
            Error::ConversionFailed { .. } | Error::MergeFailed(_) | Error::Io(_) => {
                tracing::error!("Pipeline error: {:#}", self);
            }
        }

        (self.status_code(), self.to_string()).into_response()
    }
}
