//! Component definitions.
//!
//! Components are pure data with no behavior beyond small invariant-keeping
//! helpers. All simulated entities are composed of these components; the
//! store attaches them by value and systems read or mutate them per tick.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::math::{fixed_serde, option_fixed_serde, Fixed, Vec3Fixed};

/// Identifier of a faction (player or AI owner).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct FactionId(pub u8);

/// World-space transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform {
    /// World position. Y is up.
    pub position: Vec3Fixed,
    /// Heading around the Y axis, radians.
    #[serde(with = "fixed_serde")]
    pub yaw: Fixed,
    /// Uniform scale.
    #[serde(with = "fixed_serde")]
    pub scale: Fixed,
}

impl Transform {
    /// Create a transform at a position with default rotation and scale.
    #[must_use]
    pub fn at(position: Vec3Fixed) -> Self {
        Self {
            position,
            yaw: Fixed::ZERO,
            scale: Fixed::from_num(1),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::at(Vec3Fixed::ZERO)
    }
}

/// Health component for damageable entities.
///
/// Invariant: `current <= max` at all times; both non-negative by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Current hit points.
    pub current: u32,
    /// Maximum hit points.
    pub max: u32,
}

impl Health {
    /// Create health at full.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Apply damage, saturating at zero.
    pub fn apply_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    /// Apply healing, clamped so `current` never exceeds `max`.
    pub fn apply_heal(&mut self, amount: u32) {
        self.current = (self.current + amount).min(self.max);
    }

    /// Whether this entity is dead.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }
}

/// Marker: this entity is a mobile unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnitTag;

/// Marker: this entity is a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildingTag;

/// Marker: this building is a faction hall (main base).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HallTag;

/// Damage classification carried by projectiles.
///
/// The tag is data for balance and presentation layers; ballistics applies
/// the stored flat damage regardless of type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DamageType {
    /// Arrows, bolts, bullets.
    #[default]
    Pierce,
    /// Blunt impact.
    Kinetic,
    /// Anti-building ordnance.
    Siege,
    /// Magical damage.
    Arcane,
}

/// Projectile flight model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TrajectoryKind {
    /// Constant-velocity straight line toward the target.
    #[default]
    Linear,
    /// Gravity-integrated arc: constant horizontal speed, falling vertical.
    Parabolic,
}

/// Ranged-combat state for a unit.
///
/// One generic struct covers every ranged unit kind; per-kind tuning comes
/// from the stat provider at spawn time. Invariants: `aim_timer` is zeroed
/// whenever `target` changes or becomes invalid; `cooldown_timer` never
/// goes negative (clamped at zero as it ticks down).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatState {
    /// Stat-table key of this unit's kind (e.g. "archer").
    pub kind: String,
    /// Current attack target. Weak reference: validity checked every tick.
    pub target: Option<Entity>,
    /// Seconds of aim accumulated on the current target.
    #[serde(with = "fixed_serde")]
    pub aim_timer: Fixed,
    /// Seconds of aim required before a shot.
    #[serde(with = "fixed_serde")]
    pub aim_time: Fixed,
    /// Seconds until the next shot is allowed. Zero means ready.
    #[serde(with = "fixed_serde")]
    pub cooldown_timer: Fixed,
    /// Cooldown applied after each shot, seconds.
    #[serde(with = "fixed_serde")]
    pub cooldown: Fixed,
    /// Targets closer than this are too close to engage.
    #[serde(with = "fixed_serde")]
    pub min_range: Fixed,
    /// Base maximum engagement range.
    #[serde(with = "fixed_serde")]
    pub max_range: Fixed,
    /// Range bonus per unit of height advantage over the target.
    #[serde(with = "fixed_serde")]
    pub height_range_mod: Fixed,
    /// Whether this unit kind backs off from targets inside min range.
    pub can_retreat: bool,
    /// Set while a valid target sits inside min range.
    pub retreating: bool,
    /// Set on the tick a shot is released (cleared next tick).
    pub firing: bool,
    /// Projectile speed, units per second.
    #[serde(with = "fixed_serde")]
    pub projectile_speed: Fixed,
    /// Gravity constant for parabolic shots.
    #[serde(with = "fixed_serde")]
    pub gravity: Fixed,
    /// Flight model of fired projectiles.
    pub trajectory: TrajectoryKind,
    /// Damage per projectile.
    pub damage: u32,
    /// Damage type tag per projectile.
    pub damage_type: DamageType,
}

impl CombatState {
    /// Effective maximum range against a target at the given height
    /// difference (shooter height minus target height), clamped at zero.
    #[must_use]
    pub fn effective_max_range(&self, height_diff: Fixed) -> Fixed {
        let range = self.max_range + self.height_range_mod * height_diff;
        if range < Fixed::ZERO {
            Fixed::ZERO
        } else {
            range
        }
    }

    /// Drop the current target and zero the aim timer.
    pub fn clear_target(&mut self) {
        self.target = None;
        self.aim_timer = Fixed::ZERO;
    }

    /// Switch to a new target, zeroing the aim timer.
    pub fn set_target(&mut self, target: Entity) {
        if self.target != Some(target) {
            self.aim_timer = Fixed::ZERO;
        }
        self.target = Some(target);
    }

    /// Whether the aim timer has matured and the cooldown has elapsed.
    #[must_use]
    pub fn ready_to_fire(&self) -> bool {
        self.aim_timer >= self.aim_time && self.cooldown_timer == Fixed::ZERO
    }

    /// Tick the cooldown down, clamping at zero.
    pub fn tick_cooldown(&mut self, dt: Fixed) {
        self.cooldown_timer = (self.cooldown_timer - dt).max(Fixed::ZERO);
    }
}

/// Healing state for support units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealerState {
    /// Hit points restored per second.
    #[serde(with = "fixed_serde")]
    pub rate: Fixed,
    /// Maximum healing range.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,
    /// Current heal target. Weak reference; a stale target is a no-op.
    pub target: Option<Entity>,
    /// Fractional healing carried between ticks so slow rates still land.
    #[serde(with = "fixed_serde")]
    pub carry: Fixed,
}

impl HealerState {
    /// Create a healer with the given rate and range.
    #[must_use]
    pub fn new(rate: Fixed, range: Fixed) -> Self {
        Self {
            rate,
            range,
            target: None,
            carry: Fixed::ZERO,
        }
    }
}

/// Identifier of an ability in the stat table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbilityId(pub u16);

/// Cooldown bookkeeping for a unit's active ability.
///
/// One active ability per entity; no shared cooldown slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityState {
    /// Cooldown duration, seconds.
    #[serde(with = "fixed_serde")]
    pub cooldown: Fixed,
    /// Simulation time of the last invocation, if any.
    #[serde(with = "option_fixed_serde")]
    pub last_use: Option<Fixed>,
    /// Currently active ability, cleared when the cooldown elapses.
    pub active: Option<AbilityId>,
}

impl AbilityState {
    /// Create an ability slot with the given cooldown and nothing active.
    #[must_use]
    pub fn new(cooldown: Fixed) -> Self {
        Self {
            cooldown,
            last_use: None,
            active: None,
        }
    }

    /// Whether the ability may be invoked at simulation time `now`.
    #[must_use]
    pub fn ready(&self, now: Fixed) -> bool {
        match self.last_use {
            None => true,
            Some(last) => now - last >= self.cooldown,
        }
    }

    /// Invoke the ability at time `now`.
    ///
    /// Returns `false` (and changes nothing) if the cooldown has not
    /// elapsed.
    pub fn try_invoke(&mut self, id: AbilityId, now: Fixed) -> bool {
        if !self.ready(now) {
            return false;
        }
        self.last_use = Some(now);
        self.active = Some(id);
        true
    }
}

/// In-flight projectile.
///
/// Spawned only via the command buffer during a combat tick; destroyed the
/// tick it resolves. `shooter` is a weak back-reference used solely for
/// self-damage exclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projectile {
    /// Launch position.
    pub origin: Vec3Fixed,
    /// Point the projectile is heading for. Updated each tick while the
    /// target entity is alive; frozen at last-known position otherwise.
    pub target_point: Vec3Fixed,
    /// Target entity. `None` for ground-targeted shots, which resolve by
    /// position only and never damage.
    pub target: Option<Entity>,
    /// Speed, units per second.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Gravity constant (parabolic trajectories only).
    #[serde(with = "fixed_serde")]
    pub gravity: Fixed,
    /// Current vertical velocity (parabolic trajectories only).
    #[serde(with = "fixed_serde")]
    pub vertical_velocity: Fixed,
    /// Entity that fired this projectile (self-damage exclusion).
    pub shooter: Option<Entity>,
    /// Flight model.
    pub trajectory: TrajectoryKind,
    /// Damage applied on impact.
    pub damage: u32,
    /// Damage type tag.
    pub damage_type: DamageType,
    /// Faction that owns this projectile (friendly-fire policy).
    pub faction: FactionId,
    /// Seconds in flight so far.
    #[serde(with = "fixed_serde")]
    pub age: Fixed,
    /// Flight time after which the projectile is destroyed unresolved.
    #[serde(with = "fixed_serde")]
    pub max_age: Fixed,
}
