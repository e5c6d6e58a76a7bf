//! Data Transfer Objects for the HTTP API.
//!
//! Engine types that already derive Serialize/Deserialize are re-exported
//! rather than mirrored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::engine::{AnalysisRequest, EngineEvent};
pub use crate::models::{AnalysisResult, Observer};
pub use crate::runtime::WorkerStates;
pub use crate::services::job_tracker::{JobFailure, JobProgress, JobStatus, LogEntry};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub engine: WorkerStates,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub object_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickQuery {
    /// RFC 3339 instant. Defaults to now.
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
}

/// Response for analysis dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisAccepted {
    pub job_id: String,
    pub message: String,
}

/// Job status response for background analysis runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: Option<JobProgress>,
    pub logs: Vec<LogEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<JobFailure>,
}
