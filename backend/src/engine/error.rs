//! Engine error type.

use super::events::WorkerRole;
use crate::catalog::CatalogError;
use crate::codec::CodecError;
use crate::propagation::ServiceError;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The propagation service has not finished loading
    #[error("Propagation service is not loaded yet")]
    NotLoaded,

    /// An analysis run owns the session
    #[error("Cannot {operation} while an analysis is running")]
    InAnalysis { operation: &'static str },

    #[error("Catalog load failed: {0}")]
    CatalogLoad(String),

    #[error("No catalog has been initialized")]
    CatalogNotInitiated,

    #[error("Observer rejected by the propagation service")]
    ObserverRejected,

    #[error("Propagation service refused to start recording")]
    RecordingRejected,

    #[error("Analysis step must be positive, got {0} ms")]
    InvalidStep(i64),

    /// A whole service call failed
    #[error("Propagation service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Result encoding failed: {0}")]
    Codec(#[from] CodecError),

    #[error("The {0} worker is not running")]
    WorkerUnavailable(WorkerRole),
}

impl EngineError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::NotLoaded => "ERROR_NOT_LOADED",
            EngineError::InAnalysis { .. } => "ERROR_CANNOT_BECAUSE_IN_ANALYZING",
            EngineError::CatalogLoad(_) => "ERROR_CATALOG_LOAD",
            EngineError::CatalogNotInitiated => "ERROR_CATALOG_NOT_INITIATED",
            EngineError::ObserverRejected => "ERROR_OBSERVER_REJECTED",
            EngineError::RecordingRejected => "ERROR_RECORDING_REJECTED",
            EngineError::InvalidStep(_) => "ERROR_INVALID_STEP",
            EngineError::Service(_) => "ERROR_SERVICE",
            EngineError::Codec(_) => "ERROR_CODEC",
            EngineError::WorkerUnavailable(_) => "ERROR_WORKER_UNAVAILABLE",
        }
    }
}

impl From<CatalogError> for EngineError {
    fn from(err: CatalogError) -> Self {
        EngineError::CatalogLoad(err.to_string())
    }
}
