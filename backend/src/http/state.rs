//! Application state for the HTTP server.

use crate::runtime::EngineHandle;
use crate::services::JobTracker;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Front door to the real-time and analysis workers
    pub engine: EngineHandle,
    /// Background analysis jobs
    pub job_tracker: JobTracker,
}

impl AppState {
    pub fn new(engine: EngineHandle) -> Self {
        Self {
            engine,
            job_tracker: JobTracker::new(),
        }
    }
}
