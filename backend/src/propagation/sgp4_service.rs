//! [`PropagationService`] backed by the `sgp4` crate.

use super::geometry::{self, Geodetic, EARTH_RADIUS_KM};
use super::recorder::{TransitPoint, TransitRecorder};
use super::{
    solar, AnalysisRowRaw, HistogramBucketRaw, PropagationService, Result, ServiceError,
    ServiceObserver, TickOutput,
};
use crate::catalog;
use crate::models::{TickSample, TimeFields};
use chrono::NaiveDateTime;
use log::{debug, info};
use sgp4::{Constants, Elements, MinutesSinceEpoch};

/// Code reported when the `sgp4` crate refuses to propagate an object.
pub const ERROR_MODEL: i32 = -1;
/// Code reported when the propagated position lies inside the Earth.
pub const ERROR_DECAYED: i32 = -6;

/// Sun elevation, in degrees, at or below which the observer's sky counts as dark.
pub const DEFAULT_TWILIGHT_SUN_ELEVATION: f64 = -6.0;

struct Satellite {
    satnum: String,
    epoch: NaiveDateTime,
    constants: Constants,
}

/// Real SGP4 propagation over a two-line element catalog.
pub struct Sgp4Service {
    satellites: Vec<Satellite>,
    observer: Option<ServiceObserver>,
    twilight_sun_elevation: f64,
    recording: bool,
    recorder: TransitRecorder,
}

impl Default for Sgp4Service {
    fn default() -> Self {
        Self::new(DEFAULT_TWILIGHT_SUN_ELEVATION)
    }
}

impl Sgp4Service {
    pub fn new(twilight_sun_elevation: f64) -> Self {
        Self {
            satellites: Vec::new(),
            observer: None,
            twilight_sun_elevation,
            recording: false,
            recorder: TransitRecorder::new(),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn observer(&self) -> Option<&ServiceObserver> {
        self.observer.as_ref()
    }

    fn propagate(satellite: &Satellite, instant: &NaiveDateTime) -> std::result::Result<[f64; 3], i32> {
        let minutes = (*instant - satellite.epoch).num_milliseconds() as f64 / 60_000.0;
        match satellite.constants.propagate(MinutesSinceEpoch(minutes)) {
            Ok(prediction) if geometry::norm(&prediction.position) < EARTH_RADIUS_KM => {
                Err(ERROR_DECAYED)
            }
            Ok(prediction) => Ok(prediction.position),
            Err(e) => {
                debug!("sgp4 failed for {}: {:?}", satellite.satnum, e);
                Err(ERROR_MODEL)
            }
        }
    }
}

fn validate_observer(observer: &ServiceObserver) -> bool {
    let finite = observer.latitude.is_finite()
        && observer.longitude.is_finite()
        && observer.height.is_finite()
        && observer.min_elevation.is_finite();
    finite
        && (-90.0..=90.0).contains(&observer.latitude)
        && (-90.0..=90.0).contains(&observer.min_elevation)
}

impl PropagationService for Sgp4Service {
    fn load(&mut self, catalog_text: &str) -> Result<usize> {
        let parsed = catalog::parse_records(catalog_text);
        if parsed.skipped > 0 {
            return Err(ServiceError::MalformedCatalog(format!(
                "{} incomplete record(s)",
                parsed.skipped
            )));
        }
        if parsed.records.is_empty() {
            return Err(ServiceError::EmptyCatalog);
        }

        let mut satellites = Vec::with_capacity(parsed.records.len());
        for (i, record) in parsed.records.iter().enumerate() {
            let elements = Elements::from_tle(
                record.name.clone(),
                record.line1.as_bytes(),
                record.line2.as_bytes(),
            )
            .map_err(|e| ServiceError::MalformedCatalog(format!("record {}: {:?}", i, e)))?;
            let constants = Constants::from_elements(&elements)
                .map_err(|e| ServiceError::MalformedCatalog(format!("record {}: {:?}", i, e)))?;
            satellites.push(Satellite {
                satnum: elements.norad_id.to_string(),
                epoch: elements.datetime,
                constants,
            });
        }

        self.satellites = satellites;
        self.observer = None;
        self.recording = false;
        self.recorder.clear();
        info!("Loaded {} objects into SGP4 service", self.satellites.len());
        Ok(self.satellites.len())
    }

    fn object_count(&self) -> usize {
        self.satellites.len()
    }

    fn tick(&mut self, time: &TimeFields) -> Result<TickOutput> {
        let instant = time
            .to_naive()
            .ok_or_else(|| ServiceError::InvalidTime(format!("{:?}", time)))?;
        let jd = time.julian_date();
        let gmst = geometry::gmst(jd);
        let sun = solar::sun_ra_dec(jd);
        let (sun_latitude, sun_longitude) = solar::subsolar_point(&sun, gmst);

        let site = self.observer.map(|o| {
            let geodetic = Geodetic::from_degrees(o.latitude, o.longitude, o.height);
            let sky_dark = solar::sun_elevation(&sun, gmst, &geodetic) <= self.twilight_sun_elevation;
            (o, geodetic, sky_dark)
        });
        let sun_eci = solar::sun_position_eci(&sun);

        let mut objects = Vec::with_capacity(self.satellites.len());
        let (mut overfly_count, mut sunlit_count, mut visible_count) = (0u32, 0u32, 0u32);

        for satellite in &self.satellites {
            let position = match Self::propagate(satellite, &instant) {
                Ok(position) => position,
                Err(code) => {
                    if self.recording {
                        self.recorder.leave(&satellite.satnum);
                    }
                    objects.push(TickSample::failed(satellite.satnum.clone(), code));
                    continue;
                }
            };

            let geodetic = geometry::eci_to_geodetic(&position, gmst);
            let mut sample = TickSample::at(
                satellite.satnum.clone(),
                geodetic.latitude.to_degrees(),
                geodetic.longitude.to_degrees(),
                geodetic.height / EARTH_RADIUS_KM,
            );

            if let Some((observer, site_geodetic, sky_dark)) = &site {
                let ecf = geometry::eci_to_ecf(&position, gmst);
                let look = geometry::look_angles(site_geodetic, &ecf);

                if look.elevation_deg >= observer.min_elevation {
                    let depth = solar::eclipse_depth(&position, &sun_eci);
                    let sunlit = depth <= 0.0;
                    let visible = sunlit && *sky_dark;
                    sample = sample.with_flags(true, sunlit, visible);

                    overfly_count += 1;
                    sunlit_count += sunlit as u32;
                    visible_count += visible as u32;

                    if self.recording {
                        self.recorder.observe(
                            &satellite.satnum,
                            TransitPoint {
                                time: *time,
                                azimuth: look.azimuth_deg,
                                elevation: look.elevation_deg,
                                range: look.range_km,
                                sunlit,
                                eclipse_depth: depth,
                            },
                        );
                    }
                } else if self.recording {
                    self.recorder.leave(&satellite.satnum);
                }
            }

            objects.push(sample);
        }

        if self.recording {
            self.recorder.push_bucket(HistogramBucketRaw {
                time: *time,
                overfly: overfly_count,
                sunlit: sunlit_count,
                visible: visible_count,
            });
        }

        Ok(TickOutput {
            sun_latitude,
            sun_longitude,
            objects,
        })
    }

    fn set_observer(&mut self, observer: &ServiceObserver) -> bool {
        if !validate_observer(observer) {
            debug!("Rejected observer {:?}", observer);
            return false;
        }
        self.observer = Some(*observer);
        self.recording = false;
        self.recorder.clear();
        true
    }

    fn start_recording(&mut self) -> bool {
        if self.observer.is_none() || self.recording {
            return false;
        }
        self.recorder.clear();
        self.recording = true;
        true
    }

    fn stop_recording(&mut self) {
        if self.recording {
            self.recorder.flush();
            self.recording = false;
        }
    }

    fn analysis_rows(&self) -> &[AnalysisRowRaw] {
        self.recorder.rows()
    }

    fn histogram(&self) -> &[HistogramBucketRaw] {
        self.recorder.histogram()
    }
}
