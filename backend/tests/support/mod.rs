#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use orbitrack::catalog;
use orbitrack::config::EngineConfig;
use orbitrack::models::{TickSample, TimeFields};
use orbitrack::propagation::{
    AnalysisRowRaw, HistogramBucketRaw, PropagationService, Result as ServiceResult, ServiceError,
    ServiceObserver, TickOutput, TransitSeries,
};

pub const ISS_2008_LINE1: &str =
    "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
pub const ISS_2008_LINE2: &str =
    "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

pub const ISS_2020_LINE1: &str =
    "1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992";
pub const ISS_2020_LINE2: &str =
    "2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008";

/// Epoch of the 2008 ISS element set (day 264.51782528 of 2008).
pub fn iss_2008_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2008, 9, 20, 12, 25, 40).unwrap()
        + chrono::Duration::milliseconds(104)
}

/// Replace the last column of an element line with its modulo-10 checksum.
pub fn with_checksum(line: &str) -> String {
    let body: String = line.chars().take(68).collect();
    let sum: u32 = body
        .chars()
        .map(|c| match c {
            '-' => 1,
            c => c.to_digit(10).unwrap_or(0),
        })
        .sum();
    format!("{}{}", body, sum % 10)
}

/// ISS element set renumbered to `satnum`, checksums fixed up.
pub fn renumbered_iss(satnum: u32) -> (String, String) {
    let id = format!("{:05}", satnum);
    let line1 = format!("1 {}{}", id, &ISS_2008_LINE1[7..]);
    let line2 = format!("2 {}{}", id, &ISS_2008_LINE2[7..]);
    (with_checksum(&line1), with_checksum(&line2))
}

/// Three-line catalog blob from `(name, line1, line2)` triples.
pub fn catalog_text(records: &[(&str, &str, &str)]) -> String {
    records
        .iter()
        .map(|(name, l1, l2)| format!("{}\n{}\n{}\n", name, l1, l2))
        .collect()
}

/// Config that keeps every catalog record.
pub fn unfiltered_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.catalog.name_prefixes.clear();
    config
}

/// Call counters shared between a test and the service it moved into an engine.
#[derive(Debug, Default)]
pub struct Calls {
    pub load: AtomicUsize,
    pub tick: AtomicUsize,
    pub set_observer: AtomicUsize,
    pub start_recording: AtomicUsize,
    pub stop_recording: AtomicUsize,
}

impl Calls {
    pub fn total(&self) -> usize {
        self.load.load(Ordering::SeqCst)
            + self.tick.load(Ordering::SeqCst)
            + self.set_observer.load(Ordering::SeqCst)
            + self.start_recording.load(Ordering::SeqCst)
            + self.stop_recording.load(Ordering::SeqCst)
    }

    pub fn ticks(&self) -> usize {
        self.tick.load(Ordering::SeqCst)
    }
}

/// Propagation service returning the same scripted samples on every tick.
///
/// While recording, every overflying sample extends one open transit per
/// satnum and every tick pushes a histogram bucket.
pub struct ScriptedService {
    calls: Arc<Calls>,
    samples: Vec<TickSample>,
    sun: (f64, f64),
    accept_observer: bool,
    tick_delay: Duration,
    fail_after: Option<usize>,
    loaded: usize,
    observer: Option<ServiceObserver>,
    recording: bool,
    open: Vec<(String, AnalysisRowRaw)>,
    rows: Vec<AnalysisRowRaw>,
    histogram: Vec<HistogramBucketRaw>,
}

impl ScriptedService {
    pub fn new(samples: Vec<TickSample>) -> Self {
        Self {
            calls: Arc::new(Calls::default()),
            samples,
            sun: (0.0, 0.0),
            accept_observer: true,
            tick_delay: Duration::ZERO,
            fail_after: None,
            loaded: 0,
            observer: None,
            recording: false,
            open: Vec::new(),
            rows: Vec::new(),
            histogram: Vec::new(),
        }
    }

    pub fn with_sun(mut self, latitude: f64, longitude: f64) -> Self {
        self.sun = (latitude, longitude);
        self
    }

    pub fn rejecting_observer(mut self) -> Self {
        self.accept_observer = false;
        self
    }

    pub fn with_tick_delay(mut self, delay: Duration) -> Self {
        self.tick_delay = delay;
        self
    }

    /// Serve `ticks` ticks, then fail every tick after them.
    pub fn failing_after(mut self, ticks: usize) -> Self {
        self.fail_after = Some(ticks);
        self
    }

    pub fn calls(&self) -> Arc<Calls> {
        Arc::clone(&self.calls)
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    fn record(&mut self, time: &TimeFields) {
        let mut bucket = HistogramBucketRaw {
            time: *time,
            overfly: 0,
            sunlit: 0,
            visible: 0,
        };
        for sample in self.samples.iter().filter(|s| s.is_valid() && s.overfly) {
            bucket.overfly += 1;
            bucket.sunlit += sample.sunlit as u32;
            bucket.visible += sample.visible as u32;

            let index = match self.open.iter().position(|(id, _)| *id == sample.satnum) {
                Some(index) => index,
                None => {
                    self.open.push((
                        sample.satnum.clone(),
                        AnalysisRowRaw {
                            id: format!("{}:0", sample.satnum),
                            transit: 1,
                            starting_time: *time,
                            ending_time: *time,
                            max_elevation: 45.0,
                            apex_azimuth: 180.0,
                            sunlit_ratio: if sample.sunlit { 1.0 } else { 0.0 },
                            detailed: TransitSeries::default(),
                        },
                    ));
                    self.open.len() - 1
                }
            };
            let row = &mut self.open[index].1;
            row.ending_time = *time;
            row.detailed.azimuth.push(180.0);
            row.detailed.eclipse_depth.push(if sample.sunlit { -1.0 } else { 1.0 });
            row.detailed.elevation.push(45.0);
            row.detailed.range_sat.push(1_000.0);
            row.detailed.sunlit.push(sample.sunlit);
            row.detailed.time.push(*time);
        }
        self.histogram.push(bucket);
    }
}

impl PropagationService for ScriptedService {
    fn load(&mut self, catalog_text: &str) -> ServiceResult<usize> {
        self.calls.load.fetch_add(1, Ordering::SeqCst);
        let parsed = catalog::parse_records(catalog_text);
        if parsed.records.is_empty() {
            return Err(ServiceError::EmptyCatalog);
        }
        self.loaded = parsed.records.len();
        self.observer = None;
        Ok(self.loaded)
    }

    fn object_count(&self) -> usize {
        self.loaded
    }

    fn tick(&mut self, time: &TimeFields) -> ServiceResult<TickOutput> {
        let served = self.calls.tick.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|limit| served >= limit) {
            return Err(ServiceError::Failed(format!("scripted failure at tick {}", served + 1)));
        }
        if !self.tick_delay.is_zero() {
            std::thread::sleep(self.tick_delay);
        }
        if self.recording {
            self.record(time);
        }
        Ok(TickOutput {
            sun_latitude: self.sun.0,
            sun_longitude: self.sun.1,
            objects: self.samples.clone(),
        })
    }

    fn set_observer(&mut self, observer: &ServiceObserver) -> bool {
        self.calls.set_observer.fetch_add(1, Ordering::SeqCst);
        if !self.accept_observer {
            return false;
        }
        self.observer = Some(*observer);
        true
    }

    fn start_recording(&mut self) -> bool {
        self.calls.start_recording.fetch_add(1, Ordering::SeqCst);
        if self.observer.is_none() || self.recording {
            return false;
        }
        self.rows.clear();
        self.histogram.clear();
        self.recording = true;
        true
    }

    fn stop_recording(&mut self) {
        self.calls.stop_recording.fetch_add(1, Ordering::SeqCst);
        self.recording = false;
        self.rows.extend(self.open.drain(..).map(|(_, row)| row));
    }

    fn analysis_rows(&self) -> &[AnalysisRowRaw] {
        &self.rows
    }

    fn histogram(&self) -> &[HistogramBucketRaw] {
        &self.histogram
    }
}
