//! Batch analysis output handed to consumers.
//!
//! These are owned copies reshaped from the propagation service's table, so
//! they stay valid after the service starts its next run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-tick series recorded for one transit. All vectors have equal length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitDetail {
    pub azimuth: Vec<f64>,
    pub eclipse_depth: Vec<f64>,
    pub elevation: Vec<f64>,
    pub range_sat: Vec<f64>,
    pub sunlit: Vec<bool>,
    pub time: Vec<DateTime<Utc>>,
}

impl TransitDetail {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Summary of one transit of one object over the observer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRow {
    /// `"<satnum>:<index>"`
    pub id: String,
    pub transit_count: u32,
    pub starting_event: DateTime<Utc>,
    pub ending_event: DateTime<Utc>,
    pub max_elevation: f64,
    pub apex_azimuth: f64,
    pub sunlit_ratio: f64,
    pub detailed: TransitDetail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBucket {
    pub time: DateTime<Utc>,
    pub overfly_count: u32,
    pub sunlit_count: u32,
    pub visible_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub rows: Vec<AnalysisRow>,
    pub histogram: Vec<HistogramBucket>,
    pub count: usize,
}

impl AnalysisResult {
    pub fn new(rows: Vec<AnalysisRow>, histogram: Vec<HistogramBucket>) -> Self {
        let count = rows.len();
        Self {
            rows,
            histogram,
            count,
        }
    }
}
