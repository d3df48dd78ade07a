// Wire DTOs for the tracking backend (camelCase JSON) and their conversion
// into domain records. Everything is lenient: missing optional fields fall
// back to defaults, and entities without usable coordinates are dropped.

use crate::domain::entities::{
    AiState, AmmoStatus, DetailFaction, DetailHealth, DetailPosition, DetailVision, WeaponStatus,
};
use crate::domain::taxonomy::RawCategory;
use crate::domain::{
    Faction, ProjectileKinematics, Snapshot, UnitClass, UnitDetails, UnitKinematics,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Joins a base URL and a path with exactly one slash between them.
pub fn build_api_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MovementSnapshotDto {
    pub tick: u64,
    pub timestamp: String,
    pub units: Vec<UnitMovementDto>,
    pub projectiles: Vec<ProjectileMovementDto>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnitMovementDto {
    pub id: String,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub heading: Option<f64>,
    pub speed_mps: Option<f64>,
    pub status: Option<String>,
    pub faction_id: Option<i64>,
    pub health: Option<f64>,
    pub vision_range: Option<f64>,
    pub direction_x: Option<f64>,
    pub direction_y: Option<f64>,
    pub ammo_percentage: Option<f64>,
    // Rich shape.
    pub main_category: Option<String>,
    pub sub_category: Option<String>,
    // Flat shape.
    pub category: Option<String>,
    pub subcategory: Option<String>,
    #[serde(rename = "type")]
    pub legacy_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectileMovementDto {
    pub id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub heading: Option<f64>,
    pub speed_mps: Option<f64>,
    #[serde(rename = "type")]
    pub projectile_type: Option<String>,
    pub owner_unit_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactionDto {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub allies: Option<Vec<i64>>,
}

impl From<FactionDto> for Faction {
    fn from(dto: FactionDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            color: dto.color,
            allies: dto.allies.unwrap_or_default(),
        }
    }
}

fn finite_pair(latitude: Option<f64>, longitude: Option<f64>) -> Option<(f64, f64)> {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
        _ => None,
    }
}

fn finite_or(value: Option<f64>, fallback: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(fallback)
}

impl UnitMovementDto {
    /// None when the unit has no usable position.
    pub fn into_kinematics(self) -> Option<UnitKinematics> {
        let (latitude, longitude) = finite_pair(self.latitude, self.longitude)?;
        let heading = finite_or(self.heading, 0.0);

        let class = UnitClass::resolve(RawCategory {
            main_category: self.main_category.as_deref(),
            category: self.category.as_deref(),
            sub_category: self.sub_category.as_deref(),
            subcategory: self.subcategory.as_deref(),
            legacy_type: self.legacy_type.as_deref(),
        });

        // Older payloads carry no direction vector; derive it from heading.
        let direction = match (self.direction_x, self.direction_y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => (x, y),
            _ => {
                let radians = heading.to_radians();
                (radians.sin(), radians.cos())
            }
        };

        Some(UnitKinematics {
            id: self.id,
            name: self.name,
            latitude,
            longitude,
            altitude: self.altitude.filter(|a| a.is_finite()),
            heading,
            speed_mps: finite_or(self.speed_mps, 0.0),
            status: self.status,
            faction_id: self.faction_id,
            class,
            health: finite_or(self.health, 0.0),
            ammo_percentage: finite_or(self.ammo_percentage, 0.0),
            vision_range: finite_or(self.vision_range, 0.0),
            direction,
        })
    }
}

impl ProjectileMovementDto {
    pub fn into_kinematics(self) -> Option<ProjectileKinematics> {
        let (latitude, longitude) = finite_pair(self.latitude, self.longitude)?;
        Some(ProjectileKinematics {
            id: self.id,
            latitude,
            longitude,
            heading: finite_or(self.heading, 0.0),
            speed_mps: finite_or(self.speed_mps, 0.0),
            projectile_type: self.projectile_type,
            owner_unit_id: self.owner_unit_id,
        })
    }
}

impl MovementSnapshotDto {
    pub fn into_snapshot(self) -> Snapshot {
        let tick = self.tick;
        let units = self
            .units
            .into_iter()
            .filter_map(|dto| {
                let id = dto.id.clone();
                let unit = dto.into_kinematics();
                if unit.is_none() {
                    warn!(tick, unit_id = %id, "dropping unit without finite coordinates");
                }
                unit
            })
            .collect();
        let projectiles = self
            .projectiles
            .into_iter()
            .filter_map(|dto| {
                let id = dto.id.clone();
                let projectile = dto.into_kinematics();
                if projectile.is_none() {
                    warn!(tick, projectile_id = %id, "dropping projectile without finite coordinates");
                }
                projectile
            })
            .collect();

        Snapshot {
            tick,
            timestamp: self.timestamp,
            units,
            projectiles,
        }
    }
}

// Detail payload. Only the parts the selection panel shows are mapped.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetailedUnitDto {
    pub id: String,
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub status: String,
    pub position: PositionDto,
    pub velocity: VelocityDto,
    pub health: HealthDto,
    pub faction: FactionInfoDto,
    pub vision: VisionDto,
    pub weapons: Vec<WeaponStatusDto>,
    pub ammo: AmmoStatusDto,
    pub ai_state: Option<AiStateDto>,
    pub base_location: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionDto {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub heading: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VelocityDto {
    pub speed: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthDto {
    pub current: f64,
    pub maximum: f64,
    pub percentage: f64,
    pub armor: f64,
    pub is_destroyed: bool,
    pub is_damaged: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FactionInfoDto {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub is_ally: bool,
    pub is_enemy: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisionDto {
    pub range_meters: f64,
    pub detection_range_meters: f64,
    pub visible_enemies: Vec<String>,
    pub visible_allies: Vec<String>,
    pub has_radar: bool,
    pub radar_range_meters: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeaponStatusDto {
    pub weapon_id: String,
    pub name: String,
    pub count: u32,
    pub projectile_type: String,
    pub current_ammo: u32,
    pub max_ammo: u32,
    pub is_reloading: bool,
    pub can_fire: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AmmoStatusDto {
    pub total_ammo_percentage: f64,
    pub total_rounds_remaining: u32,
    pub is_low_ammo: bool,
    pub is_out_of_ammo: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiStateDto {
    pub current_state: String,
    pub last_state: Option<String>,
    pub time_in_state: f64,
    pub current_target: Option<TargetInfoDto>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetInfoDto {
    pub unit_id: String,
    pub name: String,
}

impl From<WeaponStatusDto> for WeaponStatus {
    fn from(dto: WeaponStatusDto) -> Self {
        Self {
            weapon_id: dto.weapon_id,
            name: dto.name,
            count: dto.count,
            projectile_type: dto.projectile_type,
            current_ammo: dto.current_ammo,
            max_ammo: dto.max_ammo,
            is_reloading: dto.is_reloading,
            can_fire: dto.can_fire,
        }
    }
}

impl From<AiStateDto> for AiState {
    fn from(dto: AiStateDto) -> Self {
        let (target_unit_id, target_name) = match dto.current_target {
            Some(target) => (Some(target.unit_id), Some(target.name)),
            None => (None, None),
        };
        Self {
            current_state: dto.current_state,
            last_state: dto.last_state,
            time_in_state: dto.time_in_state,
            target_unit_id,
            target_name,
        }
    }
}

impl From<DetailedUnitDto> for UnitDetails {
    fn from(dto: DetailedUnitDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            category: dto.category,
            subcategory: dto.subcategory,
            status: dto.status,
            position: DetailPosition {
                latitude: dto.position.latitude,
                longitude: dto.position.longitude,
                altitude: dto.position.altitude,
                heading: dto.position.heading,
            },
            speed_mps: dto.velocity.speed,
            health: DetailHealth {
                current: dto.health.current,
                maximum: dto.health.maximum,
                percentage: dto.health.percentage,
                armor: dto.health.armor,
                is_destroyed: dto.health.is_destroyed,
                is_damaged: dto.health.is_damaged,
            },
            faction: DetailFaction {
                id: dto.faction.id,
                name: dto.faction.name,
                color: dto.faction.color,
                is_ally: dto.faction.is_ally,
                is_enemy: dto.faction.is_enemy,
            },
            vision: DetailVision {
                range_meters: dto.vision.range_meters,
                detection_range_meters: dto.vision.detection_range_meters,
                visible_enemies: dto.vision.visible_enemies,
                visible_allies: dto.vision.visible_allies,
                radar_range_meters: dto
                    .vision
                    .radar_range_meters
                    .filter(|_| dto.vision.has_radar),
            },
            weapons: dto.weapons.into_iter().map(WeaponStatus::from).collect(),
            ammo: AmmoStatus {
                total_ammo_percentage: dto.ammo.total_ammo_percentage,
                total_rounds_remaining: dto.ammo.total_rounds_remaining,
                is_low_ammo: dto.ammo.is_low_ammo,
                is_out_of_ammo: dto.ammo.is_out_of_ammo,
            },
            ai_state: dto.ai_state.map(AiState::from),
            base_location: dto.base_location,
        }
    }
}
