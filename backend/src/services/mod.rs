//! Background job services used by the HTTP layer.

pub mod analysis_jobs;
pub mod job_tracker;

pub use analysis_jobs::start_analysis_job;
pub use job_tracker::{Job, JobStatus, JobTracker, LogEntry, LogLevel};
