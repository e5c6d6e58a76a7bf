//! Job tracking for background analysis runs.
//!
//! Runs dispatched over HTTP return immediately with a job id. The job record
//! collects progress, log lines and, once finished, the owned analysis result.

use crate::models::AnalysisResult;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Finished jobs kept before the oldest are evicted.
pub const DEFAULT_JOB_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    pub done: u64,
    pub total: u64,
}

/// Machine code and message of a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: Option<JobProgress>,
    pub logs: Vec<LogEntry>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<AnalysisResult>,
    pub failure: Option<JobFailure>,
}

/// In-memory job tracker shared between handlers and background tasks.
#[derive(Clone)]
pub struct JobTracker {
    jobs: Arc<RwLock<HashMap<String, Job>>>,
    capacity: usize,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_JOB_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Create a running job and return its id.
    pub fn create_job(&self) -> String {
        let job_id = Uuid::new_v4().to_string();
        let job = Job {
            job_id: job_id.clone(),
            status: JobStatus::Running,
            progress: None,
            logs: vec![],
            created_at: Utc::now(),
            completed_at: None,
            result: None,
            failure: None,
        };
        let mut jobs = self.jobs.write();
        evict_finished(&mut jobs, self.capacity);
        jobs.insert(job_id.clone(), job);
        job_id
    }

    pub fn log(&self, job_id: &str, level: LogLevel, message: impl Into<String>) {
        if let Some(job) = self.jobs.write().get_mut(job_id) {
            job.logs.push(LogEntry {
                timestamp: Utc::now(),
                level,
                message: message.into(),
            });
        }
    }

    pub fn update_progress(&self, job_id: &str, done: u64, total: u64) {
        if let Some(job) = self.jobs.write().get_mut(job_id) {
            job.progress = Some(JobProgress { done, total });
        }
    }

    pub fn complete_job(&self, job_id: &str, result: AnalysisResult) {
        if let Some(job) = self.jobs.write().get_mut(job_id) {
            job.status = JobStatus::Completed;
            job.completed_at = Some(Utc::now());
            job.logs.push(LogEntry {
                timestamp: Utc::now(),
                level: LogLevel::Success,
                message: format!(
                    "Analysis finished: {} transits, {} histogram buckets",
                    result.count,
                    result.histogram.len()
                ),
            });
            job.result = Some(result);
        }
    }

    pub fn fail_job(&self, job_id: &str, code: impl Into<String>, message: impl Into<String>) {
        if let Some(job) = self.jobs.write().get_mut(job_id) {
            let message = message.into();
            job.status = JobStatus::Failed;
            job.completed_at = Some(Utc::now());
            job.logs.push(LogEntry {
                timestamp: Utc::now(),
                level: LogLevel::Error,
                message: message.clone(),
            });
            job.failure = Some(JobFailure {
                code: code.into(),
                message,
            });
        }
    }

    pub fn get_job(&self, job_id: &str) -> Option<Job> {
        self.jobs.read().get(job_id).cloned()
    }

    pub fn get_logs(&self, job_id: &str) -> Vec<LogEntry> {
        self.jobs
            .read()
            .get(job_id)
            .map(|job| job.logs.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }
}

impl Default for JobTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop the oldest finished jobs until there is room for one more.
fn evict_finished(jobs: &mut HashMap<String, Job>, capacity: usize) {
    while jobs.len() >= capacity {
        let oldest = jobs
            .values()
            .filter(|job| job.status != JobStatus::Running)
            .min_by_key(|job| job.completed_at)
            .map(|job| job.job_id.clone());
        match oldest {
            Some(id) => {
                jobs.remove(&id);
            }
            None => break,
        }
    }
}
