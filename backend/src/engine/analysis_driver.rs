//! Batch evaluation of an interval with recording enabled.

use super::error::{EngineError, Result};
use super::tick_driver::tick_once;
use crate::codec::{reshape_histogram, reshape_rows};
use crate::models::{AnalysisResult, Observer};
use crate::propagation::{PropagationService, ServiceObserver};
use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub observer: Observer,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    /// Milliseconds between ticks. `None` uses the session default.
    #[serde(default)]
    pub step_ms: Option<i64>,
}

impl AnalysisRequest {
    pub fn new(observer: Observer, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            observer,
            from,
            to,
            step_ms: None,
        }
    }

    pub fn with_step_ms(mut self, step_ms: i64) -> Self {
        self.step_ms = Some(step_ms);
        self
    }
}

/// Number of ticks a run over `[from, to]` performs. Always at least one.
pub fn tick_count(from: DateTime<Utc>, to: DateTime<Utc>, step_ms: i64) -> u64 {
    if to <= from || step_ms <= 0 {
        return 1;
    }
    let span_ms = to.signed_duration_since(from).num_milliseconds().max(0);
    (span_ms / step_ms) as u64 + 1
}

/// Apply the observer, record the interval tick by tick, and reshape the
/// service's table.
///
/// `on_tick(done, total)` is called after every tick. Recording is always
/// stopped before returning, including on error.
pub fn run<S, F>(
    service: &mut S,
    observer: &Observer,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    step_ms: i64,
    mut on_tick: F,
) -> Result<AnalysisResult>
where
    S: PropagationService + ?Sized,
    F: FnMut(u64, u64),
{
    if step_ms <= 0 {
        return Err(EngineError::InvalidStep(step_ms));
    }

    if !service.set_observer(&ServiceObserver::from(observer)) {
        return Err(EngineError::ObserverRejected);
    }
    if !service.start_recording() {
        return Err(EngineError::RecordingRejected);
    }

    let total = tick_count(from, to, step_ms);
    let step = Duration::milliseconds(step_ms);
    let mut current = from;
    let mut done = 0u64;

    loop {
        if let Err(e) = tick_once(service, &current) {
            warn!("Analysis aborted at {}: {}", current, e);
            service.stop_recording();
            return Err(e.into());
        }
        done += 1;
        on_tick(done, total);

        // the last representable instant also ends the run
        current = match current.checked_add_signed(step) {
            Some(next) if next <= to => next,
            _ => break,
        };
    }

    service.stop_recording();
    debug!("Analysis recorded {} ticks", done);

    let rows = reshape_rows(service.analysis_rows())?;
    let histogram = reshape_histogram(service.histogram())?;
    Ok(AnalysisResult::new(rows, histogram))
}
