// Domain layer: entity kinematics, taxonomy, projection and styling rules.

pub mod entities;
pub mod errors;
pub mod geo;
pub mod ports;
pub mod style;
pub mod taxonomy;

pub use entities::{
    Faction, FactionTable, GeoBounds, LatLon, MapView, ProjectileKinematics, Snapshot,
    UnitDetails, UnitKinematics,
};
pub use errors::TrackError;
pub use taxonomy::{MainCategory, UnitClass};
