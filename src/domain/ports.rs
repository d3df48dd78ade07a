use async_trait::async_trait;

use crate::domain::entities::{Faction, GeoBounds, LatLon, MapView, Snapshot, UnitDetails};
use crate::domain::errors::TrackError;
use crate::domain::style::MarkerStyle;

// Port for the backend serving snapshots, factions and unit details.
// Implementations must map failures onto TransportUnavailable vs ServerError.
#[async_trait]
pub trait TrackBackend: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<Snapshot, TrackError>;
    async fn fetch_factions(&self) -> Result<Vec<Faction>, TrackError>;
    async fn fetch_unit_details(&self, unit_id: &str) -> Result<UnitDetails, TrackError>;
}

// Port for last-good payload persistence (key -> serialized string).
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, TrackError>;
    async fn set(&self, key: &str, value: String) -> Result<(), TrackError>;
}

// Port for the "are we online" signal.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

// Port for retrieving wall-clock time.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Opaque marker handle issued by the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(pub u64);

/// Whether a marker draws a unit (clickable) or a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Unit,
    Projectile,
}

// Port for the map canvas. Calls are synchronous and must not block.
pub trait MapCanvas: Send {
    fn add_marker(
        &mut self,
        kind: MarkerKind,
        entity_id: &str,
        position: LatLon,
        style: &MarkerStyle,
    ) -> MarkerHandle;
    fn move_marker(&mut self, handle: MarkerHandle, position: LatLon);
    fn restyle_marker(&mut self, handle: MarkerHandle, style: &MarkerStyle);
    fn remove_marker(&mut self, handle: MarkerHandle);

    fn set_view(&mut self, view: MapView);
    fn fit_bounds(&mut self, bounds: GeoBounds);
    fn current_view(&self) -> MapView;
}
