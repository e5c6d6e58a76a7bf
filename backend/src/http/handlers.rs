//! HTTP handlers for the REST API.
//!
//! Each handler maps one endpoint onto an [`EngineHandle`](crate::runtime::EngineHandle)
//! operation or onto the job tracker.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

use super::dto::{
    AnalysisAccepted, AnalysisRequest, CatalogResponse, HealthResponse, JobStatusResponse,
    Observer, TickQuery, WorkerStates,
};
use super::error::AppError;
use super::state::AppState;
use crate::services::{self, JobStatus};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health and state
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        engine: state.engine.state(),
    }))
}

/// GET /v1/state
pub async fn get_state(State(state): State<AppState>) -> HandlerResult<WorkerStates> {
    Ok(Json(state.engine.state()))
}

/// GET /v1/observatories
pub async fn list_observatories() -> HandlerResult<Vec<Observer>> {
    Ok(Json(Observer::presets()))
}

// =============================================================================
// Engine operations
// =============================================================================

/// POST /v1/catalog
///
/// Body is raw catalog text (two- or three-line element records).
pub async fn initialize_catalog(
    State(state): State<AppState>,
    body: String,
) -> HandlerResult<CatalogResponse> {
    if body.trim().is_empty() {
        return Err(AppError::BadRequest("Catalog body is empty".to_string()));
    }
    let object_count = state.engine.initialize_catalog(&body).await?;
    Ok(Json(CatalogResponse { object_count }))
}

/// PUT /v1/observer
pub async fn set_observer(
    State(state): State<AppState>,
    Json(observer): Json<Observer>,
) -> Result<StatusCode, AppError> {
    state.engine.set_observer(observer).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/tick?time=<RFC3339>
///
/// Responds with the raw little-endian `f32` tick buffer.
pub async fn tick(
    State(state): State<AppState>,
    Query(query): Query<TickQuery>,
) -> Result<Response, AppError> {
    let instant = query.time.unwrap_or_else(Utc::now);
    let buffer = state.engine.tick(instant).await?;
    let object_count = buffer.object_count();

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::HeaderName::from_static("x-object-count"),
                object_count.to_string(),
            ),
        ],
        buffer.into_le_bytes(),
    )
        .into_response())
}

/// POST /v1/analysis
///
/// Dispatches a run and returns a job id. A run already in flight is
/// rejected here with 409 rather than queued.
pub async fn start_analysis(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<(StatusCode, Json<AnalysisAccepted>), AppError> {
    let job_id = services::start_analysis_job(&state.engine, &state.job_tracker, request)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(AnalysisAccepted {
            message: format!("Analysis started. Track progress at /v1/jobs/{}", job_id),
            job_id,
        }),
    ))
}

// =============================================================================
// Jobs and events
// =============================================================================

/// GET /v1/jobs/{job_id}
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> HandlerResult<JobStatusResponse> {
    let job = state
        .job_tracker
        .get_job(&job_id)
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", job_id)))?;

    Ok(Json(JobStatusResponse {
        job_id: job.job_id,
        status: job.status,
        progress: job.progress,
        logs: job.logs,
        result: job.result,
        failure: job.failure,
    }))
}

/// GET /v1/jobs/{job_id}/logs
///
/// Stream job logs via Server-Sent Events, ending with a `complete` event.
pub async fn stream_job_logs(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    if state.job_tracker.get_job(&job_id).is_none() {
        return Err(AppError::NotFound(format!("Job {} not found", job_id)));
    }

    let tracker = state.job_tracker.clone();
    let stream = async_stream::stream! {
        let mut sent = 0;
        loop {
            let logs = tracker.get_logs(&job_id);
            for entry in logs.iter().skip(sent) {
                let data = serde_json::to_string(entry).unwrap_or_default();
                yield Ok(Event::default().data(data));
            }
            sent = logs.len();

            match tracker.get_job(&job_id) {
                Some(job) if job.status != JobStatus::Running => {
                    let summary = serde_json::json!({
                        "status": job.status,
                        "count": job.result.as_ref().map(|r| r.count),
                        "failure": job.failure,
                    });
                    yield Ok(Event::default()
                        .event("complete")
                        .data(serde_json::to_string(&summary).unwrap_or_default()));
                    break;
                }
                Some(_) => {}
                None => break,
            }

            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(1))
            .text("keep-alive"),
    ))
}

/// GET /v1/events
///
/// Server-Sent Events stream of engine events (state changes, analysis
/// progress and completion). Each event is named after its `type`.
pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut events = state.engine.subscribe();
    let stream = async_stream::stream! {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let value = serde_json::to_value(&event).unwrap_or_default();
                    let name = value
                        .get("type")
                        .and_then(|t| t.as_str())
                        .unwrap_or("message")
                        .to_string();
                    yield Ok(Event::default().event(name).data(value.to_string()));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "SSE subscriber lagged behind engine events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
