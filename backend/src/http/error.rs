//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::engine::EngineError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
    Engine(EngineError),
}

fn engine_status(err: &EngineError) -> StatusCode {
    match err {
        EngineError::NotLoaded | EngineError::WorkerUnavailable(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        EngineError::InAnalysis { .. } | EngineError::CatalogNotInitiated => StatusCode::CONFLICT,
        EngineError::CatalogLoad(_)
        | EngineError::ObserverRejected
        | EngineError::InvalidStep(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::RecordingRejected | EngineError::Service(_) | EngineError::Codec(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
            AppError::Engine(e) => {
                let status = engine_status(&e);
                let mut body = ApiError::new(e.code(), e.to_string());
                if let EngineError::InAnalysis { operation } = &e {
                    body = body.with_details(format!("rejected operation: {}", operation));
                }
                (status, body)
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError::Engine(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
