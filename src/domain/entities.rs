// Domain-level kinematic records, faction metadata and unit detail payloads.
//
// These derive serde because the last-good payload is cached as JSON. The wire
// shape lives in `interface_adapters::protocol`; this is the cached shape.

use crate::domain::taxonomy::UnitClass;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLon {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Map viewport reported by the canvas after pan/zoom settles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl GeoBounds {
    pub fn center(&self) -> LatLon {
        LatLon::new(
            (self.min_latitude + self.max_latitude) / 2.0,
            (self.min_longitude + self.max_longitude) / 2.0,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitKinematics {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    /// Degrees clockwise from north.
    pub heading: f64,
    pub speed_mps: f64,
    pub status: Option<String>,
    pub faction_id: Option<i64>,
    pub class: UnitClass,
    pub health: f64,
    pub ammo_percentage: f64,
    pub vision_range: f64,
    /// Unit direction vector, +y north.
    pub direction: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileKinematics {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub heading: f64,
    pub speed_mps: f64,
    pub projectile_type: Option<String>,
    pub owner_unit_id: Option<String>,
}

/// One point-in-time batch of every entity's kinematic state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub timestamp: String,
    pub units: Vec<UnitKinematics>,
    pub projectiles: Vec<ProjectileKinematics>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            tick: 0,
            timestamp: String::new(),
            units: Vec::new(),
            projectiles: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    pub id: i64,
    pub name: String,
    /// Hex colour from the backend, e.g. "#FF0000".
    pub color: String,
    #[serde(default)]
    pub allies: Vec<i64>,
}

/// Read-only faction lookup loaded once per session.
#[derive(Debug, Clone, Default)]
pub struct FactionTable {
    by_id: HashMap<i64, Faction>,
}

impl FactionTable {
    pub fn new(factions: impl IntoIterator<Item = Faction>) -> Self {
        Self {
            by_id: factions.into_iter().map(|f| (f.id, f)).collect(),
        }
    }

    pub fn get(&self, id: i64) -> Option<&Faction> {
        self.by_id.get(&id)
    }

    pub fn color_of(&self, id: Option<i64>) -> Option<&str> {
        id.and_then(|id| self.get(id)).map(|f| f.color.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

// Detail payload shown for the selected unit.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDetails {
    pub id: String,
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub status: String,
    pub position: DetailPosition,
    pub speed_mps: f64,
    pub health: DetailHealth,
    pub faction: DetailFaction,
    pub vision: DetailVision,
    pub weapons: Vec<WeaponStatus>,
    pub ammo: AmmoStatus,
    pub ai_state: Option<AiState>,
    pub base_location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub heading: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailHealth {
    pub current: f64,
    pub maximum: f64,
    pub percentage: f64,
    pub armor: f64,
    pub is_destroyed: bool,
    pub is_damaged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailFaction {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub is_ally: bool,
    pub is_enemy: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailVision {
    pub range_meters: f64,
    pub detection_range_meters: f64,
    pub visible_enemies: Vec<String>,
    pub visible_allies: Vec<String>,
    pub radar_range_meters: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponStatus {
    pub weapon_id: String,
    pub name: String,
    pub count: u32,
    pub projectile_type: String,
    pub current_ammo: u32,
    pub max_ammo: u32,
    pub is_reloading: bool,
    pub can_fire: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmmoStatus {
    pub total_ammo_percentage: f64,
    pub total_rounds_remaining: u32,
    pub is_low_ammo: bool,
    pub is_out_of_ammo: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiState {
    pub current_state: String,
    pub last_state: Option<String>,
    pub time_in_state: f64,
    pub target_unit_id: Option<String>,
    pub target_name: Option<String>,
}
