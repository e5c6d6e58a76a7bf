//! Per-object tick samples and their visibility classification.

use serde::{Deserialize, Serialize};

/// One object's state at one instant, as reported by the propagation service.
///
/// `error_code == 0` means the geometric fields are valid. Any other value is
/// a negative propagation-failure code and the geometry must be ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSample {
    pub satnum: String,
    /// Geodetic latitude, degrees
    pub latitude: f64,
    /// Geodetic longitude, degrees
    pub longitude: f64,
    /// Height above the ellipsoid, in Earth radii
    pub height: f64,
    pub error_code: i32,
    /// Above the observer's minimum elevation
    pub overfly: bool,
    /// Overfly and outside Earth's shadow
    pub sunlit: bool,
    /// Sunlit and the observer's sky is dark enough
    pub visible: bool,
}

impl TickSample {
    /// A valid sample with no observer-relative flags set.
    pub fn at(satnum: impl Into<String>, latitude: f64, longitude: f64, height: f64) -> Self {
        Self {
            satnum: satnum.into(),
            latitude,
            longitude,
            height,
            error_code: 0,
            overfly: false,
            sunlit: false,
            visible: false,
        }
    }

    /// A failed sample carrying the service's (negative) error code.
    pub fn failed(satnum: impl Into<String>, error_code: i32) -> Self {
        Self {
            satnum: satnum.into(),
            latitude: 0.0,
            longitude: 0.0,
            height: 0.0,
            error_code,
            overfly: false,
            sunlit: false,
            visible: false,
        }
    }

    pub fn with_flags(mut self, overfly: bool, sunlit: bool, visible: bool) -> Self {
        self.overfly = overfly;
        self.sunlit = sunlit;
        self.visible = visible;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.error_code == 0
    }

    pub fn status(&self) -> VisibilityStatus {
        VisibilityStatus::classify(self.overfly, self.sunlit, self.visible)
    }
}

/// Visibility classification of a valid sample.
///
/// Negative values on the wire are reserved for propagation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum VisibilityStatus {
    None = 0,
    Overfly = 1001,
    /// Implies overfly
    Sunlit = 1011,
    /// Implies overfly and sunlit
    Visible = 1111,
}

impl VisibilityStatus {
    /// Highest-precedence flag wins. The flags are treated as independent:
    /// `visible` without `overfly` still classifies as `Visible`.
    pub fn classify(overfly: bool, sunlit: bool, visible: bool) -> Self {
        if visible {
            VisibilityStatus::Visible
        } else if sunlit {
            VisibilityStatus::Sunlit
        } else if overfly {
            VisibilityStatus::Overfly
        } else {
            VisibilityStatus::None
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(VisibilityStatus::None),
            1001 => Some(VisibilityStatus::Overfly),
            1011 => Some(VisibilityStatus::Sunlit),
            1111 => Some(VisibilityStatus::Visible),
            _ => None,
        }
    }
}
