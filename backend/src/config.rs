//! Engine configuration file support.
//!
//! Settings are read from `orbitrack.toml`. Every section and field is
//! optional; missing values fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::catalog::DEFAULT_NAME_PREFIXES;
use crate::propagation::DEFAULT_TWILIGHT_SUN_ELEVATION;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("No orbitrack.toml found in standard locations")]
    NotFound,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub visibility: VisibilitySettings,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Object names must start with one of these. Empty keeps everything.
    #[serde(default = "default_name_prefixes")]
    pub name_prefixes: Vec<String>,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            name_prefixes: default_name_prefixes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    #[serde(default = "default_step_ms")]
    pub default_step_ms: i64,
    /// Emit a progress event every N ticks. 0 disables progress events.
    #[serde(default = "default_progress_every")]
    pub progress_every: u64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            default_step_ms: default_step_ms(),
            progress_every: default_progress_every(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilitySettings {
    #[serde(default = "default_twilight")]
    pub twilight_sun_elevation_deg: f64,
}

impl Default for VisibilitySettings {
    fn default() -> Self {
        Self {
            twilight_sun_elevation_deg: default_twilight(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Capacity of the engine event broadcast channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            event_capacity: default_event_capacity(),
        }
    }
}

fn default_name_prefixes() -> Vec<String> {
    DEFAULT_NAME_PREFIXES.iter().map(|p| p.to_string()).collect()
}

fn default_step_ms() -> i64 {
    10_000
}

fn default_progress_every() -> u64 {
    100
}

fn default_twilight() -> f64 {
    DEFAULT_TWILIGHT_SUN_ELEVATION
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_event_capacity() -> usize {
    256
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `orbitrack.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let search_paths = [
            PathBuf::from("orbitrack.toml"),
            PathBuf::from("backend/orbitrack.toml"),
            PathBuf::from("../orbitrack.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(ConfigError::NotFound)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analysis.default_step_ms <= 0 {
            return Err(ConfigError::Invalid(format!(
                "analysis.default_step_ms must be positive, got {}",
                self.analysis.default_step_ms
            )));
        }
        let twilight = self.visibility.twilight_sun_elevation_deg;
        if !twilight.is_finite() || !(-90.0..=90.0).contains(&twilight) {
            return Err(ConfigError::Invalid(format!(
                "visibility.twilight_sun_elevation_deg out of range: {}",
                twilight
            )));
        }
        if self.server.event_capacity == 0 {
            return Err(ConfigError::Invalid(
                "server.event_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
