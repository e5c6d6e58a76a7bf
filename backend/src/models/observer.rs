use serde::{Deserialize, Serialize};

/// A ground reference point with a minimum-elevation threshold.
///
/// Immutable once built. Replacing the observer of a session means building a
/// new value and handing it to [`crate::engine::Engine::set_observer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observer {
    #[serde(default)]
    name: String,
    /// Degrees, north positive
    #[serde(alias = "lat")]
    latitude: f64,
    /// Degrees, east positive
    #[serde(alias = "lng")]
    longitude: f64,
    /// Kilometres above the ellipsoid
    #[serde(alias = "alt", default)]
    altitude: f64,
    /// Degrees above the horizon, 90 = zenith
    #[serde(alias = "elv", default = "default_min_elevation")]
    min_elevation: f64,
}

fn default_min_elevation() -> f64 {
    20.0
}

impl Observer {
    pub fn new(
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        altitude: f64,
        min_elevation: f64,
    ) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            altitude,
            min_elevation,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn altitude(&self) -> f64 {
        self.altitude
    }

    pub fn min_elevation(&self) -> f64 {
        self.min_elevation
    }

    /// Static list of known observatories.
    ///
    /// The first entry is a blank template for a user-defined site.
    pub fn presets() -> Vec<Observer> {
        PRESETS
            .iter()
            .map(|&(name, lat, lng, alt, elv)| Observer::new(name, lat, lng, alt, elv))
            .collect()
    }

    pub fn preset(name: &str) -> Option<Observer> {
        Self::presets().into_iter().find(|o| o.name == name)
    }
}

const PRESETS: &[(&str, f64, f64, f64, f64)] = &[
    ("*New", 0.0, 0.0, 0.0, 20.0),
    ("Ckoirama", -24.08913333, -69.93058889, 0.966, 20.0),
    ("ESO, Paranal", -24.6275, -70.4044, 2.65, 20.0),
    ("Mauna Kea", 19.82222, -155.47494, 4.207, 20.0),
    ("Canarias", 28.756611, -17.892028, 2.3, 20.0),
    ("SAAO", -32.379444, 20.810556, 1.798, 20.0),
    ("Tianyan", 25.65289, 106.85678, 0.0, 20.0),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_order_and_values() {
        let presets = Observer::presets();
        assert_eq!(presets.len(), 7);
        assert_eq!(presets[0].name(), "*New");

        let paranal = Observer::preset("ESO, Paranal").unwrap();
        assert_eq!(paranal.latitude(), -24.6275);
        assert_eq!(paranal.longitude(), -70.4044);
        assert_eq!(paranal.altitude(), 2.65);
        assert_eq!(paranal.min_elevation(), 20.0);
    }

    #[test]
    fn test_deserialize_short_names() {
        let json = r#"{"name":"SAAO","lat":-32.379444,"lng":20.810556,"alt":1.798,"elv":20}"#;
        let observer: Observer = serde_json::from_str(json).unwrap();
        assert_eq!(observer, Observer::preset("SAAO").unwrap());
    }

    #[test]
    fn test_deserialize_long_names_with_defaults() {
        let json = r#"{"latitude":10.0,"longitude":-20.0}"#;
        let observer: Observer = serde_json::from_str(json).unwrap();
        assert_eq!(observer.name(), "");
        assert_eq!(observer.altitude(), 0.0);
        assert_eq!(observer.min_elevation(), 20.0);
    }

    #[test]
    fn test_serialize_camel_case() {
        let value = serde_json::to_value(Observer::new("x", 1.0, 2.0, 3.0, 4.0)).unwrap();
        assert_eq!(value["minElevation"], 4.0);
    }
}
