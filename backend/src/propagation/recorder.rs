//! Transit table and histogram accumulated while a service is recording.

use super::{AnalysisRowRaw, HistogramBucketRaw, TransitSeries};
use crate::models::TimeFields;
use std::collections::HashMap;

/// Observer-relative state of one object at one recorded tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitPoint {
    pub time: TimeFields,
    pub azimuth: f64,
    pub elevation: f64,
    pub range: f64,
    pub sunlit: bool,
    pub eclipse_depth: f64,
}

#[derive(Debug, Default)]
struct ObjectLog {
    transit_index: u32,
    previous_elevation: f64,
    rising: bool,
    current: TransitSeries,
}

/// Splits each object's in-view samples into transits.
///
/// A transit closes when the object starts rising again after falling, when
/// it leaves the observer's view, or on [`TransitRecorder::flush`].
#[derive(Debug, Default)]
pub struct TransitRecorder {
    logs: HashMap<String, ObjectLog>,
    rows: Vec<AnalysisRowRaw>,
    histogram: Vec<HistogramBucketRaw>,
}

impl TransitRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.logs.clear();
        self.rows.clear();
        self.histogram.clear();
    }

    /// Record an in-view sample of `satnum`.
    pub fn observe(&mut self, satnum: &str, point: TransitPoint) {
        let log = self.logs.entry(satnum.to_string()).or_default();

        if log.current.is_empty() {
            log.rising = true;
            log.previous_elevation = point.elevation;
        }

        let rising_now = point.elevation >= log.previous_elevation;
        log.previous_elevation = point.elevation;

        if !log.rising && rising_now {
            if let Some(row) = close_transit(satnum, log) {
                self.rows.push(row);
            }
        }
        log.rising = rising_now;

        let series = &mut log.current;
        series.time.push(point.time);
        series.azimuth.push(point.azimuth);
        series.elevation.push(point.elevation);
        series.range_sat.push(point.range);
        series.sunlit.push(point.sunlit);
        series.eclipse_depth.push(point.eclipse_depth);
    }

    /// `satnum` is out of view (or failed to propagate) at this tick.
    pub fn leave(&mut self, satnum: &str) {
        if let Some(log) = self.logs.get_mut(satnum) {
            if let Some(row) = close_transit(satnum, log) {
                self.rows.push(row);
            }
        }
    }

    pub fn push_bucket(&mut self, bucket: HistogramBucketRaw) {
        self.histogram.push(bucket);
    }

    /// Close every open transit. Objects are flushed in catalog-number
    /// order; non-numeric designators follow the numeric ones.
    pub fn flush(&mut self) {
        let mut open: Vec<&String> = self
            .logs
            .iter()
            .filter(|(_, log)| !log.current.is_empty())
            .map(|(satnum, _)| satnum)
            .collect();
        open.sort_by_key(|satnum| (satnum.parse::<u64>().unwrap_or(u64::MAX), *satnum));
        let open: Vec<String> = open.into_iter().cloned().collect();

        for satnum in open {
            self.leave(&satnum);
        }
    }

    pub fn rows(&self) -> &[AnalysisRowRaw] {
        &self.rows
    }

    pub fn histogram(&self) -> &[HistogramBucketRaw] {
        &self.histogram
    }
}

fn close_transit(satnum: &str, log: &mut ObjectLog) -> Option<AnalysisRowRaw> {
    if log.current.is_empty() {
        return None;
    }
    let series = std::mem::take(&mut log.current);
    let index = log.transit_index;
    log.transit_index += 1;
    log.rising = true;

    let (apex, max_elevation) = series
        .elevation
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, e)| {
            if e > best.1 {
                (i, e)
            } else {
                best
            }
        });
    let sunlit = series.sunlit.iter().filter(|s| **s).count();
    let sunlit_ratio = sunlit as f64 / series.len() as f64;

    Some(AnalysisRowRaw {
        id: format!("{satnum}:{index}"),
        transit: index + 1,
        starting_time: series.time[0],
        ending_time: series.time[series.len() - 1],
        max_elevation,
        apex_azimuth: series.azimuth[apex],
        sunlit_ratio,
        detailed: series,
    })
}
