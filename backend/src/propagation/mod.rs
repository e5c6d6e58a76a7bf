//! # Propagation service seam
//!
//! The engine never evaluates orbital mechanics itself. It talks to a
//! [`PropagationService`] that owns the loaded catalog and answers per-instant
//! queries. [`Sgp4Service`] is the bundled implementation backed by the
//! `sgp4` crate.
//!
//! A service is stateful:
//!
//! - `load` replaces the catalog
//! - `set_observer` defines the ground point used for look angles and flags
//! - `start_recording` / `stop_recording` bracket an analysis run during which
//!   every `tick` also feeds a transit table and a histogram
//!
//! The table returned by `analysis_rows` is a single slot. The next
//! `start_recording` or `set_observer` clears it, so callers copy what they
//! need before issuing another `&mut` call.

mod geometry;
mod recorder;
mod sgp4_service;
mod solar;

pub use recorder::TransitRecorder;
pub use sgp4_service::{Sgp4Service, DEFAULT_TWILIGHT_SUN_ELEVATION, ERROR_DECAYED, ERROR_MODEL};

use crate::models::{TickSample, TimeFields};
use thiserror::Error;

/// Result type for propagation service calls
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Whole-call failures of a propagation service.
///
/// Per-object failures are not errors; they travel as a negative
/// `error_code` inside [`TickSample`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Catalog text could not be parsed
    #[error("Malformed catalog: {0}")]
    MalformedCatalog(String),

    /// Catalog parsed but holds no objects
    #[error("Catalog is empty")]
    EmptyCatalog,

    /// The instant handed to `tick` is not a valid calendar time
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    /// Anything else the implementation could not recover from
    #[error("Propagation failed: {0}")]
    Failed(String),
}

/// Observer as the service sees it. Units match [`crate::models::Observer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceObserver {
    pub longitude: f64,
    pub latitude: f64,
    /// Kilometres
    pub height: f64,
    pub min_elevation: f64,
}

impl From<&crate::models::Observer> for ServiceObserver {
    fn from(observer: &crate::models::Observer) -> Self {
        Self {
            longitude: observer.longitude(),
            latitude: observer.latitude(),
            height: observer.altitude(),
            min_elevation: observer.min_elevation(),
        }
    }
}

/// Result of one service tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutput {
    pub sun_latitude: f64,
    pub sun_longitude: f64,
    /// One sample per loaded object, in catalog load order
    pub objects: Vec<TickSample>,
}

/// Per-tick series of one recorded transit, as stored by the service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitSeries {
    pub azimuth: Vec<f64>,
    pub eclipse_depth: Vec<f64>,
    pub elevation: Vec<f64>,
    pub range_sat: Vec<f64>,
    pub sunlit: Vec<bool>,
    pub time: Vec<TimeFields>,
}

impl TransitSeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// One row of the service's analysis table.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRowRaw {
    pub id: String,
    pub transit: u32,
    pub starting_time: TimeFields,
    pub ending_time: TimeFields,
    pub max_elevation: f64,
    pub apex_azimuth: f64,
    pub sunlit_ratio: f64,
    pub detailed: TransitSeries,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBucketRaw {
    pub time: TimeFields,
    pub overfly: u32,
    pub sunlit: u32,
    pub visible: u32,
}

/// Stateful propagation engine consumed by [`crate::engine::Engine`].
///
/// Implementations are driven from one thread at a time; `Send` lets a
/// worker move the service onto a blocking thread.
pub trait PropagationService: Send + 'static {
    /// Replace the loaded catalog with `catalog_text` (two-line records) and
    /// return the number of objects now loaded.
    fn load(&mut self, catalog_text: &str) -> Result<usize>;

    fn object_count(&self) -> usize;

    /// Evaluate every loaded object at `time`.
    fn tick(&mut self, time: &TimeFields) -> Result<TickOutput>;

    /// Returns `false` when the observer is rejected.
    fn set_observer(&mut self, observer: &ServiceObserver) -> bool;

    /// Returns `false` when recording cannot start (no observer, or already
    /// recording). Clears the previous table on success.
    fn start_recording(&mut self) -> bool;

    fn stop_recording(&mut self);

    fn analysis_rows(&self) -> &[AnalysisRowRaw];

    fn histogram(&self) -> &[HistogramBucketRaw];
}
