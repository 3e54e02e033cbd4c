//! Request rejections

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use orderscan_core::OrderScanError;
use thiserror::Error;

/// Why an upload request could not be analyzed
#[derive(Debug, Error)]
pub enum WebError {
    /// No `file` part in the form
    #[error("No file was uploaded. Choose a PDF file and try again.")]
    MissingFile,

    /// Uploaded file is not a PDF
    #[error("'{0}' is not a PDF file. Only .pdf uploads are accepted.")]
    NotPdf(String),

    /// Malformed or oversized multipart body
    #[error("Upload failed: {message}")]
    Upload {
        /// Status reported by the multipart parser
        status: StatusCode,
        /// Parser message
        message: String,
    },

    /// Server-side failure before the pipeline could run
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebError {
    /// HTTP status for this rejection
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::MissingFile | WebError::NotPdf(_) => StatusCode::BAD_REQUEST,
            WebError::Upload { status, .. } => *status,
            WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MultipartError> for WebError {
    fn from(e: MultipartError) -> Self {
        WebError::Upload {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

impl From<OrderScanError> for WebError {
    fn from(e: OrderScanError) -> Self {
        WebError::Internal(e.to_string())
    }
}

impl From<std::io::Error> for WebError {
    fn from(e: std::io::Error) -> Self {
        WebError::Internal(e.to_string())
    }
}
