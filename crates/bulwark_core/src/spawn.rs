//! Entity factories.
//!
//! Factories attach a fixed, kind-specific component bundle in one call,
//! with values sourced from the stat provider and hard-coded per-kind
//! defaults filling any field that is absent or non-positive. No caller
//! ever observes a partially-initialized entity.
//!
//! Factories run at setup/production time, outside the tick, so they write
//! the world directly; only projectiles (spawned mid-tick) go through the
//! command buffer.

use crate::components::{
    AbilityState, BuildingTag, CombatState, DamageType, FactionId, HallTag, Health, HealerState,
    TrajectoryKind, Transform, UnitTag,
};
use crate::data::StatProvider;
use crate::entity::Entity;
use crate::math::{Fixed, Vec3Fixed};
use crate::store::World;

/// Hard-coded fallback tuning for a ranged unit kind.
struct RangedDefaults {
    hp: u32,
    damage: u32,
    aim_time: Fixed,
    cooldown: Fixed,
    min_range: Fixed,
    max_range: Fixed,
    height_range_mod: Fixed,
    projectile_speed: Fixed,
    gravity: Fixed,
    trajectory: TrajectoryKind,
    damage_type: DamageType,
    can_retreat: bool,
}

fn ranged_defaults(kind: &str) -> RangedDefaults {
    match kind {
        "catapult" => RangedDefaults {
            hp: 120,
            damage: 40,
            aim_time: Fixed::from_num(3),
            cooldown: Fixed::from_num(6),
            min_range: Fixed::from_num(6),
            max_range: Fixed::from_num(24),
            height_range_mod: Fixed::from_num(0.5),
            projectile_speed: Fixed::from_num(8),
            gravity: Fixed::from_num(-10),
            trajectory: TrajectoryKind::Parabolic,
            damage_type: DamageType::Siege,
            can_retreat: false,
        },
        // "archer" and any unrecognized ranged kind
        _ => RangedDefaults {
            hp: 60,
            damage: 8,
            aim_time: Fixed::from_num(1),
            cooldown: Fixed::from_num(2),
            min_range: Fixed::from_num(2),
            max_range: Fixed::from_num(10),
            height_range_mod: Fixed::from_num(0.25),
            projectile_speed: Fixed::from_num(15),
            gravity: Fixed::ZERO,
            trajectory: TrajectoryKind::Linear,
            damage_type: DamageType::Pierce,
            can_retreat: true,
        },
    }
}

/// Positive stat value, or the fallback when absent or non-positive.
fn stat_or(value: Option<Fixed>, fallback: Fixed) -> Fixed {
    match value {
        Some(v) if v > Fixed::ZERO => v,
        _ => fallback,
    }
}

/// Positive integer stat, or the fallback when absent or zero.
fn stat_u32_or(value: Option<u32>, fallback: u32) -> u32 {
    match value {
        Some(v) if v > 0 => v,
        _ => fallback,
    }
}

/// Spawn a ranged combat unit of the given kind.
///
/// Bundle: `Transform`, `FactionId`, `Health`, `UnitTag`, `CombatState`,
/// and `AbilityState` when the stat record defines an ability cooldown.
pub fn spawn_ranged_unit(
    world: &mut World,
    kind: &str,
    faction: FactionId,
    position: Vec3Fixed,
    stats: Option<&dyn StatProvider>,
) -> Entity {
    let record = stats.and_then(|s| s.unit(kind));
    let d = ranged_defaults(kind);

    let combat = CombatState {
        kind: kind.to_owned(),
        target: None,
        aim_timer: Fixed::ZERO,
        aim_time: stat_or(record.and_then(|r| r.aim_time), d.aim_time),
        cooldown_timer: Fixed::ZERO,
        cooldown: stat_or(record.and_then(|r| r.cooldown), d.cooldown),
        min_range: stat_or(record.and_then(|r| r.min_range), d.min_range),
        max_range: stat_or(record.and_then(|r| r.max_range), d.max_range),
        height_range_mod: record
            .and_then(|r| r.height_range_mod)
            .unwrap_or(d.height_range_mod),
        can_retreat: d.can_retreat,
        retreating: false,
        firing: false,
        projectile_speed: stat_or(record.and_then(|r| r.projectile_speed), d.projectile_speed),
        gravity: record.and_then(|r| r.gravity).unwrap_or(d.gravity),
        trajectory: record.and_then(|r| r.trajectory).unwrap_or(d.trajectory),
        damage: stat_u32_or(record.and_then(|r| r.damage), d.damage),
        damage_type: d.damage_type,
    };

    let entity = world.spawn();
    world.insert(entity, Transform::at(position));
    world.insert(entity, faction);
    world.insert(
        entity,
        Health::new(stat_u32_or(record.and_then(|r| r.hp), d.hp)),
    );
    world.insert(entity, UnitTag);
    world.insert(entity, combat);
    if let Some(cooldown) = record.and_then(|r| r.ability_cooldown) {
        if cooldown > Fixed::ZERO {
            world.insert(entity, AbilityState::new(cooldown));
        }
    }
    entity
}

/// Spawn a healer unit.
///
/// Bundle: `Transform`, `FactionId`, `Health`, `UnitTag`, `HealerState`.
pub fn spawn_healer(
    world: &mut World,
    faction: FactionId,
    position: Vec3Fixed,
    stats: Option<&dyn StatProvider>,
) -> Entity {
    let record = stats.and_then(|s| s.unit("healer"));

    let entity = world.spawn();
    world.insert(entity, Transform::at(position));
    world.insert(entity, faction);
    world.insert(
        entity,
        Health::new(stat_u32_or(record.and_then(|r| r.hp), 45)),
    );
    world.insert(entity, UnitTag);
    world.insert(
        entity,
        HealerState::new(
            stat_or(record.and_then(|r| r.heal_rate), Fixed::from_num(5)),
            stat_or(record.and_then(|r| r.heal_range), Fixed::from_num(6)),
        ),
    );
    entity
}

/// Spawn a building of the given kind.
///
/// Bundle: `Transform`, `FactionId`, `Health`, `BuildingTag`.
pub fn spawn_building(
    world: &mut World,
    kind: &str,
    faction: FactionId,
    position: Vec3Fixed,
    stats: Option<&dyn StatProvider>,
) -> Entity {
    let record = stats.and_then(|s| s.unit(kind));

    let entity = world.spawn();
    world.insert(entity, Transform::at(position));
    world.insert(entity, faction);
    world.insert(
        entity,
        Health::new(stat_u32_or(record.and_then(|r| r.hp), 400)),
    );
    world.insert(entity, BuildingTag);
    entity
}

/// Spawn a faction hall (main base building).
///
/// Bundle: building bundle plus `HallTag`.
pub fn spawn_hall(
    world: &mut World,
    faction: FactionId,
    position: Vec3Fixed,
    stats: Option<&dyn StatProvider>,
) -> Entity {
    let entity = spawn_building(world, "hall", faction, position, stats);
    world.insert(entity, HallTag);
    entity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{StatTable, UnitStats};

    #[test]
    fn test_archer_bundle_is_complete() {
        let mut world = World::new();
        let e = spawn_ranged_unit(&mut world, "archer", FactionId(1), Vec3Fixed::ZERO, None);

        assert!(world.has::<Transform>(e));
        assert!(world.has::<FactionId>(e));
        assert!(world.has::<Health>(e));
        assert!(world.has::<UnitTag>(e));
        assert!(world.has::<CombatState>(e));
        // Exactly one kind marker
        assert!(!world.has::<BuildingTag>(e));
        assert!(!world.has::<HallTag>(e));
    }

    #[test]
    fn test_stats_override_defaults() {
        let mut table = StatTable::new();
        table.set(
            "archer",
            UnitStats {
                hp: Some(90),
                max_range: Some(Fixed::from_num(14)),
                ..UnitStats::default()
            },
        );

        let mut world = World::new();
        let e = spawn_ranged_unit(
            &mut world,
            "archer",
            FactionId(1),
            Vec3Fixed::ZERO,
            Some(&table),
        );

        assert_eq!(world.get::<Health>(e).map(|h| h.max), Some(90));
        let combat = world.get::<CombatState>(e).expect("combat state");
        assert_eq!(combat.max_range, Fixed::from_num(14));
        // Fields the record left out keep their defaults
        assert_eq!(combat.min_range, Fixed::from_num(2));
        assert_eq!(combat.damage, 8);
    }

    #[test]
    fn test_non_positive_stat_falls_back() {
        let mut table = StatTable::new();
        table.set(
            "archer",
            UnitStats {
                hp: Some(0),
                max_range: Some(Fixed::from_num(-3)),
                ..UnitStats::default()
            },
        );

        let mut world = World::new();
        let e = spawn_ranged_unit(
            &mut world,
            "archer",
            FactionId(1),
            Vec3Fixed::ZERO,
            Some(&table),
        );

        assert_eq!(world.get::<Health>(e).map(|h| h.max), Some(60));
        assert_eq!(
            world.get::<CombatState>(e).map(|c| c.max_range),
            Some(Fixed::from_num(10))
        );
    }

    #[test]
    fn test_hall_is_building_and_hall() {
        let mut world = World::new();
        let e = spawn_hall(&mut world, FactionId(2), Vec3Fixed::ZERO, None);

        assert!(world.has::<BuildingTag>(e));
        assert!(world.has::<HallTag>(e));
        assert!(!world.has::<UnitTag>(e));
    }

    #[test]
    fn test_ability_slot_only_with_stat() {
        let mut world = World::new();
        let plain = spawn_ranged_unit(&mut world, "archer", FactionId(1), Vec3Fixed::ZERO, None);
        assert!(!world.has::<AbilityState>(plain));

        let mut table = StatTable::new();
        table.set(
            "archer",
            UnitStats {
                ability_cooldown: Some(Fixed::from_num(12)),
                ..UnitStats::default()
            },
        );
        let gifted = spawn_ranged_unit(
            &mut world,
            "archer",
            FactionId(1),
            Vec3Fixed::ZERO,
            Some(&table),
        );
        assert!(world.has::<AbilityState>(gifted));
    }
}
