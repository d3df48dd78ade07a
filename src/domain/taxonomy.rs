// Unit taxonomy: closed main categories, per-category subcategory tables and the
// legacy alias table used to resolve older snapshot shapes at ingestion.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MainCategory {
    Airplane,
    Helicopter,
    GroundUnit,
    Ship,
    Structure,
    Unknown,
}

pub const MAIN_CATEGORIES: [MainCategory; 5] = [
    MainCategory::Airplane,
    MainCategory::Helicopter,
    MainCategory::GroundUnit,
    MainCategory::Ship,
    MainCategory::Structure,
];

const AIRPLANE_SUBCATEGORIES: &[&str] = &[
    "Fighter",
    "Interceptor",
    "Multirole",
    "Strike",
    "Attack",
    "Bomber",
    "AWACS",
    "Tanker",
    "Transport",
    "Trainer",
    "Reconnaissance",
    "UAV",
];

const HELICOPTER_SUBCATEGORIES: &[&str] = &[
    "Attack helicopter",
    "Transport helicopter",
    "Utility helicopter",
    "Scout helicopter",
    "Naval helicopter",
];

const GROUND_UNIT_SUBCATEGORIES: &[&str] = &[
    "Main Battle Tank",
    "Infantry Fighting Vehicle",
    "Armored Personnel Carrier",
    "Recon vehicle",
    "Self-Propelled Artillery",
    "Towed artillery",
    "MLRS",
    "AAA",
    "SAM Short Range",
    "SAM Medium Range",
    "SAM Long Range",
    "EWR",
    "Command Post",
    "Logistics",
    "Engineer",
    "Infantry",
    "Civilian vehicles",
    "Trains",
];

const SHIP_SUBCATEGORIES: &[&str] = &[
    "Aircraft carrier",
    "Helicopter carrier",
    "Destroyer",
    "Frigate",
    "Corvette",
    "Patrol boat",
    "Submarine",
    "Missile boat",
    "Landing craft",
    "Civilian ship",
    "Tanker ship",
    "Cargo ship",
];

const STRUCTURE_SUBCATEGORIES: &[&str] = &[
    "Military building",
    "Command bunker",
    "Ammo depot",
    "Fuel depot",
    "Radar tower",
    "Communication tower",
    "Airfield structure",
    "Hangar",
    "Hardened aircraft shelter",
    "Runway object",
    "Bridge",
    "Civilian building",
    "Industrial building",
    "Power plant",
    "Static SAM",
    "Static AAA",
    "Static vehicle",
    "Fortification",
];

// Older backends sent free-form category names. Matched case-insensitively.
const LEGACY_ALIASES: &[(&str, MainCategory)] = &[
    ("aircraft", MainCategory::Airplane),
    ("plane", MainCategory::Airplane),
    ("fixed_wing", MainCategory::Airplane),
    ("fixed-wing", MainCategory::Airplane),
    ("jet", MainCategory::Airplane),
    ("helo", MainCategory::Helicopter),
    ("heli", MainCategory::Helicopter),
    ("rotary", MainCategory::Helicopter),
    ("rotary_wing", MainCategory::Helicopter),
    ("ground", MainCategory::GroundUnit),
    ("vehicle", MainCategory::GroundUnit),
    ("armor", MainCategory::GroundUnit),
    ("armour", MainCategory::GroundUnit),
    ("land", MainCategory::GroundUnit),
    ("naval", MainCategory::Ship),
    ("vessel", MainCategory::Ship),
    ("boat", MainCategory::Ship),
    ("sea", MainCategory::Ship),
    ("building", MainCategory::Structure),
    ("static", MainCategory::Structure),
    ("installation", MainCategory::Structure),
];

impl MainCategory {
    /// Canonical wire name, e.g. `GROUND_UNIT`.
    pub fn as_str(&self) -> &'static str {
        match self {
            MainCategory::Airplane => "AIRPLANE",
            MainCategory::Helicopter => "HELICOPTER",
            MainCategory::GroundUnit => "GROUND_UNIT",
            MainCategory::Ship => "SHIP",
            MainCategory::Structure => "STRUCTURE",
            MainCategory::Unknown => "UNKNOWN",
        }
    }

    pub fn subcategories(&self) -> &'static [&'static str] {
        match self {
            MainCategory::Airplane => AIRPLANE_SUBCATEGORIES,
            MainCategory::Helicopter => HELICOPTER_SUBCATEGORIES,
            MainCategory::GroundUnit => GROUND_UNIT_SUBCATEGORIES,
            MainCategory::Ship => SHIP_SUBCATEGORIES,
            MainCategory::Structure => STRUCTURE_SUBCATEGORIES,
            MainCategory::Unknown => &[],
        }
    }

    fn from_canonical(value: &str) -> Option<Self> {
        MAIN_CATEGORIES
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(value))
    }

    fn from_alias(value: &str) -> Option<Self> {
        LEGACY_ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(value))
            .map(|(_, category)| *category)
    }

    /// Resolves a raw category string: canonical names first, then legacy aliases.
    pub fn resolve(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        Self::from_canonical(value).or_else(|| Self::from_alias(value))
    }
}

/// Category data resolved once at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitClass {
    pub main: MainCategory,
    /// Canonical subcategory from the taxonomy table.
    pub subcategory: Option<String>,
    /// Raw subcategory text that did not match the table.
    pub legacy_subcategory: Option<String>,
}

/// Raw category fields as they appear across snapshot shapes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCategory<'a> {
    pub main_category: Option<&'a str>,
    pub category: Option<&'a str>,
    pub sub_category: Option<&'a str>,
    pub subcategory: Option<&'a str>,
    pub legacy_type: Option<&'a str>,
}

impl UnitClass {
    pub fn unknown() -> Self {
        Self {
            main: MainCategory::Unknown,
            subcategory: None,
            legacy_subcategory: None,
        }
    }

    /// Subcategory text for styling: canonical when known, raw otherwise.
    pub fn subcategory_label(&self) -> Option<&str> {
        self.subcategory
            .as_deref()
            .or(self.legacy_subcategory.as_deref())
    }

    pub fn resolve(raw: RawCategory<'_>) -> Self {
        fn non_empty(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|v| !v.is_empty())
        }

        let main_raw = non_empty(raw.main_category).or(non_empty(raw.category));
        let sub_raw = non_empty(raw.sub_category)
            .or(non_empty(raw.subcategory))
            .or(non_empty(raw.legacy_type));

        let mut main = main_raw.and_then(MainCategory::resolve);

        // Flat shape: the category field sometimes carried a subcategory name.
        let sub_raw = match (main, sub_raw, main_raw) {
            (None, None, Some(value)) if find_subcategory(value).is_some() => Some(value),
            _ => sub_raw,
        };

        let mut subcategory = None;
        let mut legacy_subcategory = None;
        if let Some(sub) = sub_raw {
            let found = match main {
                Some(category) => lookup(category, sub).map(|name| (category, name)),
                None => find_subcategory(sub),
            };
            match found {
                Some((category, name)) => {
                    main.get_or_insert(category);
                    subcategory = Some(name.to_string());
                }
                None => legacy_subcategory = Some(sub.to_string()),
            }
        }

        Self {
            main: main.unwrap_or(MainCategory::Unknown),
            subcategory,
            legacy_subcategory,
        }
    }
}

fn lookup(category: MainCategory, value: &str) -> Option<&'static str> {
    category
        .subcategories()
        .iter()
        .copied()
        .find(|name| name.eq_ignore_ascii_case(value))
}

fn find_subcategory(value: &str) -> Option<(MainCategory, &'static str)> {
    MAIN_CATEGORIES
        .into_iter()
        .find_map(|category| lookup(category, value).map(|name| (category, name)))
}
