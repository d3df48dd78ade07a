// Runtime configuration: defaults, optional TOML file, then env overrides.

use crate::domain::style::IconSettings;
use crate::domain::{GeoBounds, MapView, TrackError};
use crate::use_cases::EngineSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, time::Duration};
use url::Url;

pub const CONFIG_PATH_VAR: &str = "LIVE_TRACK_CONFIG";
pub const API_URL_VAR: &str = "LIVE_TRACK_API_URL";
pub const POLL_INTERVAL_VAR: &str = "LIVE_TRACK_POLL_INTERVAL_MS";
pub const MAX_INTERPOLATION_VAR: &str = "LIVE_TRACK_MAX_INTERPOLATION_MS";
pub const CACHE_DIR_VAR: &str = "LIVE_TRACK_CACHE_DIR";
pub const CACHE_PERSIST_VAR: &str = "LIVE_TRACK_CACHE_PERSIST";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
    /// Sent as `requestorFactionId` on detail lookups.
    pub requestor_faction_id: Option<i64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000/api".to_string(),
            request_timeout_ms: 1500,
            requestor_faction_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub initial_view: MapView,
    pub bounds: GeoBounds,
}

impl Default for MapConfig {
    fn default() -> Self {
        let engine = EngineSettings::default();
        Self {
            initial_view: engine.initial_view,
            bounds: engine.initial_bounds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub poll_interval_ms: u64,
    pub frame_interval_ms: u64,
    /// Extrapolation ceiling; unset means "one poll interval".
    pub max_interpolation_ms: Option<u64>,
    pub click_suppression_ms: u64,
    pub event_capacity: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        let engine = EngineSettings::default();
        Self {
            poll_interval_ms: engine.poll_interval.as_millis() as u64,
            frame_interval_ms: engine.frame_interval.as_millis() as u64,
            max_interpolation_ms: None,
            click_suppression_ms: engine.click_suppression.as_millis() as u64,
            event_capacity: engine.event_capacity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub dir: PathBuf,
    /// When false the last-good payloads live in memory only.
    pub persist: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".live_track_cache"),
            persist: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    pub api: ApiConfig,
    pub map: MapConfig,
    pub timing: TimingConfig,
    pub icons: IconSettings,
    pub cache: CacheConfig,
}

impl TrackConfig {
    /// Defaults, then the file named by `LIVE_TRACK_CONFIG`, then env overrides.
    pub fn load() -> Result<Self, TrackError> {
        let mut config = match env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, TrackError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| TrackError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, TrackError> {
        toml::from_str(raw).map_err(|e| TrackError::Config(e.to_string()))
    }

    /// Applies `LIVE_TRACK_*` overrides; unparsable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_VAR) {
            self.api.base_url = url;
        }
        if let Some(ms) = lookup(POLL_INTERVAL_VAR).and_then(|v| v.parse().ok()) {
            self.timing.poll_interval_ms = ms;
        }
        if let Some(ms) = lookup(MAX_INTERPOLATION_VAR).and_then(|v| v.parse().ok()) {
            self.timing.max_interpolation_ms = Some(ms);
        }
        if let Some(dir) = lookup(CACHE_DIR_VAR) {
            self.cache.dir = PathBuf::from(dir);
        }
        if let Some(persist) = lookup(CACHE_PERSIST_VAR).and_then(|v| v.parse().ok()) {
            self.cache.persist = persist;
        }
    }

    pub fn validate(&self) -> Result<(), TrackError> {
        let url = Url::parse(&self.api.base_url)
            .map_err(|e| TrackError::Config(format!("api.base_url {:?}: {e}", self.api.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TrackError::Config(format!(
                "api.base_url must be http(s), got {}",
                url.scheme()
            )));
        }
        if self.timing.poll_interval_ms == 0 {
            return Err(TrackError::Config("timing.poll_interval_ms must be > 0".to_string()));
        }
        if self.timing.frame_interval_ms == 0 {
            return Err(TrackError::Config("timing.frame_interval_ms must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.api.request_timeout_ms)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            poll_interval: Duration::from_millis(self.timing.poll_interval_ms),
            frame_interval: Duration::from_millis(self.timing.frame_interval_ms),
            max_interpolation: self.timing.max_interpolation_ms.map(Duration::from_millis),
            click_suppression: Duration::from_millis(self.timing.click_suppression_ms),
            icons: self.icons.clone(),
            initial_view: self.map.initial_view,
            initial_bounds: self.map.bounds,
            event_capacity: self.timing.event_capacity,
        }
    }
}
