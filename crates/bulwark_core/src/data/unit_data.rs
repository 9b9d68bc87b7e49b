//! Unit stat records for data-driven unit definitions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::components::TrajectoryKind;
use crate::data::StatProvider;
use crate::error::{Result, SimError};
use crate::math::{option_fixed_serde, Fixed};

/// Data-driven stat record for one unit kind.
///
/// Every field is optional: the spawn factory substitutes a hard-coded
/// per-kind default for any field that is absent or non-positive. Fixed
/// values serialize as their raw bit representation to preserve exact
/// precision.
///
/// # Example JSON
///
/// ```json
/// {
///     "hp": 60,
///     "damage": 8,
///     "max_range": 42949672960,
///     "aim_time": 4294967296
/// }
/// ```
/// (`42949672960` is the raw-bit encoding of fixed-point 10.0.)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitStats {
    /// Maximum hit points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<u32>,

    /// Movement speed, units per second.
    #[serde(default, with = "option_fixed_serde")]
    pub speed: Option<Fixed>,

    /// Damage per shot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<u32>,

    /// Line-of-sight radius.
    #[serde(default, with = "option_fixed_serde")]
    pub line_of_sight: Option<Fixed>,

    /// Population cost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<u32>,

    /// Projectile speed, units per second.
    #[serde(default, with = "option_fixed_serde")]
    pub projectile_speed: Option<Fixed>,

    /// Seconds of aim required before a shot.
    #[serde(default, with = "option_fixed_serde")]
    pub aim_time: Option<Fixed>,

    /// Seconds between shots.
    #[serde(default, with = "option_fixed_serde")]
    pub cooldown: Option<Fixed>,

    /// Minimum engagement range.
    #[serde(default, with = "option_fixed_serde")]
    pub min_range: Option<Fixed>,

    /// Maximum engagement range.
    #[serde(default, with = "option_fixed_serde")]
    pub max_range: Option<Fixed>,

    /// Range bonus per unit of height advantage.
    #[serde(default, with = "option_fixed_serde")]
    pub height_range_mod: Option<Fixed>,

    /// Gravity constant for parabolic shots.
    #[serde(default, with = "option_fixed_serde")]
    pub gravity: Option<Fixed>,

    /// Projectile flight model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trajectory: Option<TrajectoryKind>,

    /// Hit points healed per second (healer kinds).
    #[serde(default, with = "option_fixed_serde")]
    pub heal_rate: Option<Fixed>,

    /// Healing range (healer kinds).
    #[serde(default, with = "option_fixed_serde")]
    pub heal_range: Option<Fixed>,

    /// Ability cooldown, seconds.
    #[serde(default, with = "option_fixed_serde")]
    pub ability_cooldown: Option<Fixed>,
}

/// In-memory stat table keyed by unit kind name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatTable {
    /// Stat record per unit kind.
    pub units: HashMap<String, UnitStats>,
}

impl StatTable {
    /// Create an empty table (every lookup misses; factories use defaults).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a table from a JSON document of the shape
    /// `{ "units": { "<kind>": { ...stats } } }`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SimError::StatParseError(e.to_string()))
    }

    /// Insert or replace a stat record.
    pub fn set(&mut self, kind: &str, stats: UnitStats) {
        self.units.insert(kind.to_owned(), stats);
    }
}

impl StatProvider for StatTable {
    fn unit(&self, kind: &str) -> Option<&UnitStats> {
        self.units.get(kind)
    }
}
