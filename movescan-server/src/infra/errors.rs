use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use movescan_core::PipelineError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub kind: &'static str,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            kind: "error",
        }
    }

    pub fn with_kind(mut self, kind: &'static str) -> Self {
        self.kind = kind;
        self
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message).with_kind("internal")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message).with_kind("bad_request")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message).with_kind("not_found")
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "status": self.status.as_u16(),
                "kind": self.kind,
            }
        }));

        (self.status, body).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let status = match &err {
            PipelineError::InvalidUpload(_) | PipelineError::InvalidResultId(_) => {
                StatusCode::BAD_REQUEST
            }
            PipelineError::Extraction { .. } | PipelineError::LocatorNotFound { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PipelineError::ResultNotFound(_) => StatusCode::NOT_FOUND,
            PipelineError::ScanTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            PipelineError::ScanExecution { output, .. } => {
                tracing::error!(error = %err, diagnostics = %output, "scan failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            PipelineError::Io(io) => {
                tracing::error!(error = ?io, "storage operation failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        Self::new(status, err.to_string()).with_kind(err.kind())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        Self::new(err.status(), err.body_text()).with_kind("invalid_upload")
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string())
    }
}
