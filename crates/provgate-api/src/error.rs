//! # API Error Types
//!
//! Maps pipeline failures to status codes: client faults are 400 (408 for
//! a stalled body), server faults are 500. The response body is only the
//! canonical reason phrase; the detailed message goes to the log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use provgate_pipeline::{Fault, PipelineError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// The pipeline refused or failed the upload.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The declared `Content-Length` is above the upload cap.
    #[error("declared length {declared} exceeds upload limit of {limit} bytes")]
    PayloadTooLarge { declared: u64, limit: u64 },

    /// Anything that went wrong outside the pipeline (500).
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn fault(&self) -> Fault {
        match self {
            Self::Pipeline(e) => e.fault(),
            Self::PayloadTooLarge { .. } => Fault::Client,
            Self::Internal(_) => Fault::Server,
        }
    }

    fn stage(&self) -> &'static str {
        match self {
            Self::Pipeline(e) => e.stage(),
            Self::PayloadTooLarge { .. } => "receive",
            Self::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        if matches!(self, Self::Pipeline(e) if e.is_timeout()) {
            return StatusCode::REQUEST_TIMEOUT;
        }
        match self.fault() {
            Fault::Client => StatusCode::BAD_REQUEST,
            Fault::Server => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self.fault() {
            Fault::Client => tracing::warn!(stage = self.stage(), error = %self, "upload rejected"),
            Fault::Server => tracing::error!(stage = self.stage(), error = %self, "upload failed"),
        }
        (status, status.canonical_reason().unwrap_or_default()).into_response()
    }
}
