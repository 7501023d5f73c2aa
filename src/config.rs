use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::orbit::{CatalogSource, LocationError, Observer};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid dashboard location: {0}")]
    Location(#[from] LocationError),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub iss: IssConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Load element sets from disk instead of CelesTrak.
    #[serde(default)]
    pub tle_folder: Option<PathBuf>,
    #[serde(default = "default_celestrak_url")]
    pub celestrak_url: String,
    #[serde(default = "default_group")]
    pub group: String,
    #[serde(default = "default_cache_for", deserialize_with = "deserialize_duration")]
    pub cache_for: Duration,
    #[serde(default = "default_catalog_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            tle_folder: None,
            celestrak_url: default_celestrak_url(),
            group: default_group(),
            cache_for: default_cache_for(),
            timeout: default_catalog_timeout(),
        }
    }
}

impl CatalogConfig {
    pub fn source(&self) -> CatalogSource {
        match &self.tle_folder {
            Some(dir) => CatalogSource::Folder(dir.clone()),
            None => CatalogSource::Celestrak {
                url: self.celestrak_url.clone(),
                group: self.group.clone(),
            },
        }
    }
}

fn default_celestrak_url() -> String {
    "https://celestrak.org/NORAD/elements/gp.php".to_string()
}

fn default_group() -> String {
    "active".to_string()
}

fn default_cache_for() -> Duration {
    Duration::from_secs(3600)
}

fn default_catalog_timeout() -> Duration {
    Duration::from_secs(10)
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssConfig {
    #[serde(default = "default_iss_url")]
    pub url: String,
    #[serde(default = "default_iss_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    /// Propagate NORAD 25544 from the catalog when the feed is down.
    #[serde(default = "default_true")]
    pub catalog_fallback: bool,
}

impl Default for IssConfig {
    fn default() -> Self {
        Self {
            url: default_iss_url(),
            timeout: default_iss_timeout(),
            catalog_fallback: true,
        }
    }
}

fn default_iss_url() -> String {
    "http://api.open-notify.org/iss-now.json".to_string()
}

fn default_iss_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_refresh_every", deserialize_with = "deserialize_duration")]
    pub refresh_every: Duration,
    /// Also refresh on a plain fixed interval, independent of the countdown.
    #[serde(default)]
    pub fixed_interval_refresh: bool,
    #[serde(default = "default_debounce", deserialize_with = "deserialize_duration")]
    pub search_debounce: Duration,
    #[serde(default = "default_radius")]
    pub radius: u32,
    #[serde(default = "default_request_timeout", deserialize_with = "deserialize_duration")]
    pub request_timeout: Duration,
    #[serde(default)]
    pub location: Option<LocationConfig>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            refresh_every: default_refresh_every(),
            fixed_interval_refresh: false,
            search_debounce: default_debounce(),
            radius: default_radius(),
            request_timeout: default_request_timeout(),
            location: None,
        }
    }
}

impl DashboardConfig {
    /// Countdown period in whole seconds.
    pub fn refresh_secs(&self) -> u32 {
        self.refresh_every.as_secs().clamp(1, u32::MAX as u64) as u32
    }

    pub fn observer(&self) -> Result<Option<Observer>, LocationError> {
        self.location
            .as_ref()
            .map(|l| Observer::new(l.latitude, l.longitude, l.altitude_m))
            .transpose()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude_m: f64,
}

fn default_server_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_refresh_every() -> Duration {
    Duration::from_secs(10)
}

fn default_debounce() -> Duration {
    Duration::from_millis(500)
}

fn default_radius() -> u32 {
    10
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(15)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.dashboard.observer()?;
        if self.dashboard.radius > 90 {
            return Err(ConfigError::Invalid(format!(
                "dashboard.radius must be within 0..=90, got {}",
                self.dashboard.radius
            )));
        }
        if self.dashboard.refresh_every < Duration::from_secs(1) {
            return Err(ConfigError::Invalid(
                "dashboard.refresh_every must be at least 1s".into(),
            ));
        }
        Ok(())
    }
}
