//! Frame conversions between TEME/ECI, Earth-fixed and geodetic coordinates.
//!
//! Distances in kilometres, angles in radians unless a name says otherwise.

use std::f64::consts::{PI, TAU};

pub const EARTH_RADIUS_KM: f64 = 6378.137; // WGS-84 equatorial
pub const EARTH_FLATTENING: f64 = 1.0 / 298.257_223_563;

pub type Vec3 = [f64; 3];

/// Greenwich mean sidereal time (IAU 1982) for a UT1 Julian date.
pub fn gmst(jd_ut1: f64) -> f64 {
    let t = (jd_ut1 - 2451545.0) / 36525.0;
    let seconds = -6.2e-6 * t * t * t
        + 0.093104 * t * t
        + (876600.0 * 3600.0 + 8640184.812866) * t
        + 67310.54841;
    let angle = (seconds * PI / 180.0 / 240.0) % TAU;
    if angle < 0.0 {
        angle + TAU
    } else {
        angle
    }
}

pub fn eci_to_ecf(r: &Vec3, gmst: f64) -> Vec3 {
    let (s, c) = gmst.sin_cos();
    [r[0] * c + r[1] * s, -r[0] * s + r[1] * c, r[2]]
}

/// Geodetic point on the WGS-84 ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geodetic {
    pub latitude: f64,
    pub longitude: f64,
    /// km
    pub height: f64,
}

impl Geodetic {
    pub fn from_degrees(latitude_deg: f64, longitude_deg: f64, height_km: f64) -> Self {
        Self {
            latitude: latitude_deg.to_radians(),
            longitude: longitude_deg.to_radians(),
            height: height_km,
        }
    }

    pub fn to_ecf(&self) -> Vec3 {
        let e2 = EARTH_FLATTENING * (2.0 - EARTH_FLATTENING);
        let (sin_lat, cos_lat) = self.latitude.sin_cos();
        let n = EARTH_RADIUS_KM / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        [
            (n + self.height) * cos_lat * self.longitude.cos(),
            (n + self.height) * cos_lat * self.longitude.sin(),
            (n * (1.0 - e2) + self.height) * sin_lat,
        ]
    }
}

/// Iterative geodetic solution of an inertial position at `gmst`.
pub fn eci_to_geodetic(r: &Vec3, gmst: f64) -> Geodetic {
    let e2 = EARTH_FLATTENING * (2.0 - EARTH_FLATTENING);
    let rxy = (r[0] * r[0] + r[1] * r[1]).sqrt();

    let mut longitude = r[1].atan2(r[0]) - gmst;
    while longitude < -PI {
        longitude += TAU;
    }
    while longitude > PI {
        longitude -= TAU;
    }

    let mut latitude = r[2].atan2(rxy);
    let mut c = 1.0;
    for _ in 0..20 {
        let previous = latitude;
        let sin_lat = latitude.sin();
        c = 1.0 / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        latitude = (r[2] + EARTH_RADIUS_KM * c * e2 * sin_lat).atan2(rxy);
        if (latitude - previous).abs() < 1e-12 {
            break;
        }
    }
    let height = rxy / latitude.cos() - EARTH_RADIUS_KM * c;

    Geodetic {
        latitude,
        longitude,
        height,
    }
}

/// Azimuth/elevation/range of a target seen from a ground point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAngles {
    /// Degrees clockwise from north, [0, 360)
    pub azimuth_deg: f64,
    /// Degrees above the horizon
    pub elevation_deg: f64,
    /// km
    pub range_km: f64,
}

pub fn look_angles(observer: &Geodetic, target_ecf: &Vec3) -> LookAngles {
    let origin = observer.to_ecf();
    let d = [
        target_ecf[0] - origin[0],
        target_ecf[1] - origin[1],
        target_ecf[2] - origin[2],
    ];
    let (sin_lat, cos_lat) = observer.latitude.sin_cos();
    let (sin_lon, cos_lon) = observer.longitude.sin_cos();

    let south = sin_lat * cos_lon * d[0] + sin_lat * sin_lon * d[1] - cos_lat * d[2];
    let east = -sin_lon * d[0] + cos_lon * d[1];
    let zenith = cos_lat * cos_lon * d[0] + cos_lat * sin_lon * d[1] + sin_lat * d[2];

    let range_km = (south * south + east * east + zenith * zenith).sqrt();
    let elevation = if range_km > 0.0 {
        (zenith / range_km).asin()
    } else {
        PI / 2.0
    };
    let mut azimuth = east.atan2(-south);
    if azimuth < 0.0 {
        azimuth += TAU;
    }

    LookAngles {
        azimuth_deg: azimuth.to_degrees(),
        elevation_deg: elevation.to_degrees(),
        range_km,
    }
}

pub fn norm(v: &Vec3) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

pub fn dot(a: &Vec3, b: &Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}
