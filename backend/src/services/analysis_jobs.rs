//! Background analysis runs tracked as jobs.

use super::job_tracker::{JobTracker, LogLevel};
use crate::engine::{AnalysisRequest, EngineError, EngineEvent};
use crate::models::AnalysisResult;
use crate::runtime::{EngineHandle, PendingAnalysis};
use log::{debug, info};
use tokio::sync::broadcast::{self, error::RecvError};

/// Dispatch `request` to the analysis worker and track it as a job.
///
/// Rejections known at dispatch time (a run already in flight, a stopped
/// worker) are returned directly and no job is created.
pub fn start_analysis_job(
    engine: &EngineHandle,
    tracker: &JobTracker,
    request: AnalysisRequest,
) -> Result<String, EngineError> {
    let events = engine.subscribe();
    let summary = format!(
        "Analysis for '{}' from {} to {}",
        request.observer.name(),
        request.from,
        request.to
    );
    let pending = engine.dispatch_analysis(request)?;

    let job_id = tracker.create_job();
    tracker.log(&job_id, LogLevel::Info, format!("{} dispatched", summary));
    info!("Job {} started: {}", job_id, summary);

    tokio::spawn(track_analysis(
        job_id.clone(),
        tracker.clone(),
        pending,
        events,
    ));
    Ok(job_id)
}

fn finish(tracker: &JobTracker, job_id: &str, outcome: Result<AnalysisResult, EngineError>) {
    match outcome {
        Ok(result) => {
            info!("Job {} completed with {} transits", job_id, result.count);
            tracker.complete_job(job_id, result);
        }
        Err(e) => {
            info!("Job {} failed: {}", job_id, e);
            tracker.fail_job(job_id, e.code(), e.to_string());
        }
    }
}

async fn track_analysis(
    job_id: String,
    tracker: JobTracker,
    pending: PendingAnalysis,
    mut events: broadcast::Receiver<EngineEvent>,
) {
    let outcome = pending.wait();
    tokio::pin!(outcome);
    let mut events_open = true;

    loop {
        tokio::select! {
            result = &mut outcome => {
                finish(&tracker, &job_id, result);
                break;
            }
            event = events.recv(), if events_open => match event {
                Ok(EngineEvent::AnalysisProgress { done, total }) => {
                    tracker.update_progress(&job_id, done, total);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Job {} skipped {} engine events", job_id, skipped);
                }
                Err(RecvError::Closed) => {
                    tracker.log(&job_id, LogLevel::Warning, "Progress updates unavailable");
                    events_open = false;
                }
            }
        }
    }
}
