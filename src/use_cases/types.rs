// Use-case level settings, events and UI-facing state.

use crate::domain::style::IconSettings;
use crate::domain::{GeoBounds, MapView};
use std::time::Duration;

/// Runtime settings for the engine, built by the frameworks layer.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Period of the snapshot poll loop.
    pub poll_interval: Duration,
    /// Period of the render loop (one animation frame).
    pub frame_interval: Duration,
    /// Explicit extrapolation ceiling; falls back to `poll_interval`.
    pub max_interpolation: Option<Duration>,
    /// Background clicks are ignored for this long after a marker click.
    pub click_suppression: Duration,
    pub icons: IconSettings,
    pub initial_view: MapView,
    pub initial_bounds: GeoBounds,
    /// Capacity for the broadcast event channel.
    pub event_capacity: usize,
}

impl EngineSettings {
    /// Ceiling applied to the render-loop elapsed time, in seconds.
    pub fn interpolation_cap_secs(&self) -> f64 {
        self.max_interpolation
            .unwrap_or(self.poll_interval)
            .as_secs_f64()
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
            frame_interval: Duration::from_millis(1000 / 60),
            max_interpolation: None,
            click_suppression: Duration::from_millis(250),
            icons: IconSettings::default(),
            initial_view: MapView {
                latitude: 42.5,
                longitude: 42.0,
                zoom: 7.0,
            },
            initial_bounds: GeoBounds {
                min_latitude: 41.0,
                max_latitude: 45.5,
                min_longitude: 37.0,
                max_longitude: 45.0,
            },
            event_capacity: 64,
        }
    }
}

/// Events emitted for external displays (footer, notifications).
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    // Viewport settled after pan/zoom.
    ViewChanged(MapView),
    // A snapshot was applied.
    StatsChanged {
        unit_count: usize,
        projectile_count: usize,
    },
    // Short user-facing notice, rendered by a toast collaborator.
    Notice(Notice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    FactionsLoaded,
    CachedFactions,
    FailedFactions,
    BackOnline,
    Offline,
}

impl Notice {
    /// Translation key understood by the UI.
    pub fn key(&self) -> &'static str {
        match self {
            Notice::FactionsLoaded => "FACTIONS_LOADED",
            Notice::CachedFactions => "CACHED_FACTIONS",
            Notice::FailedFactions => "FAILED_FACTIONS",
            Notice::BackOnline => "BACK_ONLINE",
            Notice::Offline => "OFFLINE",
        }
    }
}

/// Map overlay message shown when live data is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayMessage {
    // Fetch "succeeded" with no units while offline: nothing cached to show.
    OfflineNoCache,
    // Fetch failed while offline and no cache exists.
    OfflineFailed,
    // Backend reachable but failing and no cache exists.
    ErrorLoading,
}

impl OverlayMessage {
    pub fn key(&self) -> &'static str {
        match self {
            OverlayMessage::OfflineNoCache => "OFFLINE_NO_CACHE",
            OverlayMessage::OfflineFailed => "OFFLINE_FAILED",
            OverlayMessage::ErrorLoading => "ERROR_LOADING",
        }
    }
}
