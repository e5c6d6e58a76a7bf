//! Low-precision solar ephemeris (about 0.01 degrees) and shadow geometry.

use super::geometry::{dot, norm, Geodetic, Vec3, EARTH_RADIUS_KM};
use std::f64::consts::{PI, TAU};

const AU_KM: f64 = 149_597_870.7;
const SUN_RADIUS_KM: f64 = 695_700.0;

/// Apparent right ascension and declination of the Sun, radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaDec {
    pub ra: f64,
    pub dec: f64,
}

/// Julian centuries since J2000.0 (2000-01-01 12:00).
fn centuries_since_j2000(jd: f64) -> f64 {
    (jd - 2451545.0) / 36525.0
}

fn ecliptic_longitude(t: f64) -> f64 {
    let mean_anomaly =
        (357.52910 + 35999.05030 * t - 0.0001559 * t * t - 0.00000048 * t * t * t).to_radians();
    let mean_longitude = 280.46645 + 36000.76983 * t + 0.0003032 * t * t;
    let center = (1.914600 - 0.004817 * t - 0.000014 * t * t) * mean_anomaly.sin()
        + (0.019993 - 0.000101 * t) * (2.0 * mean_anomaly).sin()
        + 0.000290 * (3.0 * mean_anomaly).sin();
    (mean_longitude + center).to_radians()
}

pub fn sun_ra_dec(jd: f64) -> RaDec {
    let t = centuries_since_j2000(jd);
    let obliquity = (23.0 + 26.0 / 60.0 + 21.448 / 3600.0
        - (46.8150 * t + 0.00059 * t * t - 0.001813 * t * t * t) / 3600.0)
        .to_radians();
    let longitude = ecliptic_longitude(t);

    let x = longitude.cos();
    let y = obliquity.cos() * longitude.sin();
    let z = obliquity.sin() * longitude.sin();
    let r = (1.0 - z * z).sqrt();

    RaDec {
        ra: 2.0 * y.atan2(x + r),
        dec: z.atan2(r),
    }
}

/// Geographic point where the Sun is at the zenith, degrees.
///
/// Longitude is wrapped to [-180, 180).
pub fn subsolar_point(sun: &RaDec, gmst: f64) -> (f64, f64) {
    let mut longitude = (sun.ra - gmst) % TAU;
    if longitude < -PI {
        longitude += TAU;
    } else if longitude >= PI {
        longitude -= TAU;
    }
    (sun.dec.to_degrees(), longitude.to_degrees())
}

/// Sun position in the inertial frame, km, at a mean distance of 1 AU.
pub fn sun_position_eci(sun: &RaDec) -> Vec3 {
    let (sin_dec, cos_dec) = sun.dec.sin_cos();
    let (sin_ra, cos_ra) = sun.ra.sin_cos();
    [
        AU_KM * cos_dec * cos_ra,
        AU_KM * cos_dec * sin_ra,
        AU_KM * sin_dec,
    ]
}

/// Depth of a satellite inside Earth's umbra, degrees.
///
/// Positive when the satellite is eclipsed, zero or negative when any part of
/// the solar disc is visible from it.
pub fn eclipse_depth(satellite_eci: &Vec3, sun_eci: &Vec3) -> f64 {
    let to_sun = [
        sun_eci[0] - satellite_eci[0],
        sun_eci[1] - satellite_eci[1],
        sun_eci[2] - satellite_eci[2],
    ];
    let to_earth = [-satellite_eci[0], -satellite_eci[1], -satellite_eci[2]];

    let earth_distance = norm(&to_earth);
    let sun_distance = norm(&to_sun);
    if earth_distance <= EARTH_RADIUS_KM {
        return 90.0;
    }

    let rho_earth = (EARTH_RADIUS_KM / earth_distance).asin();
    let rho_sun = (SUN_RADIUS_KM / sun_distance).asin();
    let cos_theta = (dot(&to_earth, &to_sun) / (earth_distance * sun_distance)).clamp(-1.0, 1.0);
    let theta = cos_theta.acos();

    (rho_earth - rho_sun - theta).to_degrees()
}

/// Elevation of the Sun above an observer's horizon, degrees.
pub fn sun_elevation(sun: &RaDec, gmst: f64, observer: &Geodetic) -> f64 {
    let hour_angle = gmst + observer.longitude - sun.ra;
    let (sin_lat, cos_lat) = observer.latitude.sin_cos();
    let cos_zenith = sin_lat * sun.dec.sin() + cos_lat * sun.dec.cos() * hour_angle.cos();
    cos_zenith.clamp(-1.0, 1.0).asin().to_degrees()
}
