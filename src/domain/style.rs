// Style classification for map markers.
//
// Tag order is part of the contract: canvases diff marker classes by string
// comparison, so the same entity state must always produce the same sequence.

use crate::domain::entities::{FactionTable, ProjectileKinematics, UnitKinematics};
use serde::{Deserialize, Serialize};

pub const UNIT_BASE_TAG: &str = "map-unit";
pub const PROJECTILE_BASE_TAG: &str = "map-projectile";

/// Marker icon sizing and label fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconSettings {
    pub unit_size_px: u32,
    pub unit_label_fallback: String,
    pub projectile_size_px: u32,
}

impl Default for IconSettings {
    fn default() -> Self {
        Self {
            unit_size_px: 24,
            unit_label_fallback: "U".to_string(),
            projectile_size_px: 8,
        }
    }
}

/// Everything the canvas needs to draw a marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerStyle {
    pub tags: Vec<String>,
    pub border_color: Option<String>,
    pub label: Option<String>,
    pub size_px: u32,
    /// End point of the heading vector inside the icon box, y down.
    pub direction_tip: Option<(f64, f64)>,
}

impl MarkerStyle {
    pub fn class_name(&self) -> String {
        self.tags.join(" ")
    }
}

/// Converts free text into a css-friendly slug, e.g. `MovingToTarget` ->
/// `moving-to-target`, `SAM Short Range` -> `sam-short-range`.
pub fn slugify(value: &str) -> String {
    let chars: Vec<char> = value.trim().chars().collect();

    let mut split = String::with_capacity(chars.len() + 8);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let after_lower_or_digit = prev.is_ascii_lowercase() || prev.is_ascii_digit();
            let ends_upper_run = prev.is_ascii_uppercase() && next_is_lower;
            if after_lower_or_digit || ends_upper_run {
                split.push('-');
            }
        }
        split.push(c);
    }

    let mut slug = String::with_capacity(split.len());
    let mut pending_hyphen = false;
    for c in split.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

fn push_tag(tags: &mut Vec<String>, prefix: &str, value: Option<&str>) {
    if let Some(value) = value {
        let slug = slugify(value);
        if !slug.is_empty() {
            tags.push(format!("{prefix}{slug}"));
        }
    }
}

pub fn classify_unit(unit: &UnitKinematics, selected_id: Option<&str>) -> Vec<String> {
    let mut tags = vec![UNIT_BASE_TAG.to_string()];
    if selected_id == Some(unit.id.as_str()) {
        tags.push(format!("{UNIT_BASE_TAG}--selected"));
    }
    push_tag(&mut tags, "map-unit--status-", unit.status.as_deref());
    push_tag(&mut tags, "map-unit--cat-", Some(unit.class.main.as_str()));
    push_tag(&mut tags, "map-unit--sub-", unit.class.subcategory_label());
    tags
}

pub fn classify_projectile(projectile: &ProjectileKinematics) -> Vec<String> {
    let mut tags = vec![PROJECTILE_BASE_TAG.to_string()];
    push_tag(&mut tags, "map-projectile--", projectile.projectile_type.as_deref());
    tags
}

pub fn unit_marker_style(
    unit: &UnitKinematics,
    selected_id: Option<&str>,
    factions: &FactionTable,
    icons: &IconSettings,
) -> MarkerStyle {
    let label = unit
        .name
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect::<String>())
        .unwrap_or_else(|| icons.unit_label_fallback.clone());

    let size = f64::from(icons.unit_size_px);
    let center = size / 2.0;
    let vector_length = size * 0.6;
    let (dx, dy) = unit.direction;
    let direction_tip = (dx.is_finite() && dy.is_finite())
        .then(|| (center + dx * vector_length, center - dy * vector_length));

    MarkerStyle {
        tags: classify_unit(unit, selected_id),
        border_color: factions.color_of(unit.faction_id).map(str::to_string),
        label: Some(label),
        size_px: icons.unit_size_px,
        direction_tip,
    }
}

pub fn projectile_marker_style(
    projectile: &ProjectileKinematics,
    icons: &IconSettings,
) -> MarkerStyle {
    MarkerStyle {
        tags: classify_projectile(projectile),
        border_color: None,
        label: None,
        size_px: icons.projectile_size_px,
        direction_tip: None,
    }
}
