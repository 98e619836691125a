use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::geometry::ObserverLocation;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid observer coordinates: {0}")]
    Coordinates(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub observer: ObserverConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub defaults: Defaults,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObserverConfig {
    pub coordinates: Option<String>,
    #[serde(default)]
    pub altitude_m: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_tle_path")]
    pub tle_path: PathBuf,
    pub satcat_file: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            tle_path: default_tle_path(),
            satcat_file: None,
        }
    }
}

fn default_tle_path() -> PathBuf {
    config_dir().join("tle")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub min_elevation_deg: f64,
    pub max_elevation_deg: f64,
    #[serde(with = "duration_text")]
    pub step: Duration,
    #[serde(with = "duration_text")]
    pub window: Duration,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            min_elevation_deg: 10.0,
            max_elevation_deg: 90.0,
            step: Duration::from_secs(30),
            window: Duration::from_secs(24 * 3600),
        }
    }
}

mod duration_text {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
    }
}

/// `$HOME/.satwatch`, or the working directory when no home is set.
pub fn config_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".satwatch")
}

pub fn default_config_path() -> PathBuf {
    config_dir().join("config.yaml")
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Configured observer, or `None` when it was never set.
    pub fn observer(&self) -> Result<Option<ObserverLocation>, ConfigError> {
        let Some(coordinates) = self.observer.coordinates.as_deref() else {
            return Ok(None);
        };
        let location =
            ObserverLocation::from_coordinates(coordinates, Some(self.observer.altitude_m))
                .ok_or_else(|| ConfigError::Coordinates(coordinates.to_string()))?;
        Ok(location.is_configured().then_some(location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let yaml = r#"
observer:
  coordinates: "40.7128, -74.0060"
  altitude_m: 10
catalog:
  tle_path: /var/lib/satwatch/active.tle
  satcat_file: /var/lib/satwatch/satcat.json
defaults:
  min_elevation_deg: 15
  step: 10s
  window: 12h
"#;
        let config = Config::from_str(yaml).unwrap();
        let observer = config.observer().unwrap().unwrap();
        assert_eq!(observer.latitude_deg, 40.7128);
        assert_eq!(observer.altitude_m, 10.0);
        assert_eq!(
            config.catalog.tle_path,
            PathBuf::from("/var/lib/satwatch/active.tle")
        );
        assert_eq!(config.defaults.min_elevation_deg, 15.0);
        assert_eq!(config.defaults.max_elevation_deg, 90.0);
        assert_eq!(config.defaults.step, Duration::from_secs(10));
        assert_eq!(config.defaults.window, Duration::from_secs(12 * 3600));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_str("{}").unwrap();
        assert!(config.observer().unwrap().is_none());
        assert_eq!(config.defaults.step, Duration::from_secs(30));
        assert!(config.catalog.satcat_file.is_none());
    }

    #[test]
    fn origin_observer_counts_as_unset() {
        let config = Config::from_str("observer:\n  coordinates: \"0, 0\"\n").unwrap();
        assert!(config.observer().unwrap().is_none());
    }

    #[test]
    fn bad_coordinates_are_rejected() {
        let config = Config::from_str("observer:\n  coordinates: \"north\"\n").unwrap();
        assert!(matches!(
            config.observer(),
            Err(ConfigError::Coordinates(_))
        ));
    }

    #[test]
    fn missing_file_falls_back() {
        let config =
            Config::load_or_default(Path::new("/nonexistent/satwatch/config.yaml")).unwrap();
        assert_eq!(config.defaults.min_elevation_deg, 10.0);
    }
}
