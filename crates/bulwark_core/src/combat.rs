//! Combat systems: ranged targeting/aiming/firing, healing, ability
//! cooldowns, and the death sweep.
//!
//! Ranged-unit behavior is a per-unit state machine: Idle (no target) ->
//! Acquiring (target found, aim timer running) -> fire when the aim timer
//! matures and the cooldown has elapsed -> Cooldown -> back to Acquiring.
//! Firing never touches the store directly: it enqueues a projectile spawn
//! into the command buffer, which the scheduler flushes at the stage
//! barrier.
//!
//! All target references here are weak: a destroyed target is an expected
//! transient condition handled as "no target", never an error.

use crate::command::SpawnBundle;
use crate::components::{
    AbilityState, CombatState, FactionId, HealerState, Health, Projectile, TrajectoryKind,
    Transform,
};
use crate::entity::Entity;
use crate::error::Result;
use crate::math::{Fixed, Vec3Fixed};
use crate::schedule::TickCtx;
use crate::store::{KindId, World};

/// A target candidate snapshot taken at the start of the targeting pass.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    entity: Entity,
    position: Vec3Fixed,
    faction: FactionId,
}

/// Collect every live, damageable entity as a target candidate.
///
/// The snapshot is sorted by entity index, which is what makes the
/// nearest-target tie-break deterministic.
fn collect_candidates(world: &World) -> Vec<Candidate> {
    world
        .entities_matching(&[
            KindId::of::<Transform>(),
            KindId::of::<FactionId>(),
            KindId::of::<Health>(),
        ])
        .into_iter()
        .filter_map(|entity| {
            let position = world.get::<Transform>(entity)?.position;
            let faction = *world.get::<FactionId>(entity)?;
            Some(Candidate {
                entity,
                position,
                faction,
            })
        })
        .collect()
}

/// Pick the nearest enemy candidate inside the effective engagement band.
///
/// Candidates inside min range still count when the unit can retreat (they
/// drive the retreat flag rather than aim). Ties on distance go to the
/// lowest entity index; `candidates` is index-sorted, so the first best
/// match wins.
fn nearest_enemy(
    shooter: Entity,
    shooter_pos: Vec3Fixed,
    shooter_faction: FactionId,
    state: &CombatState,
    candidates: &[Candidate],
) -> Option<Entity> {
    let mut best: Option<(Fixed, Entity)> = None;
    for c in candidates {
        if c.entity == shooter || c.faction == shooter_faction {
            continue;
        }
        let height_diff = shooter_pos.y - c.position.y;
        let max = state.effective_max_range(height_diff);
        let dist_sq = shooter_pos.distance_squared(c.position);
        if dist_sq > max * max {
            continue;
        }
        let too_close = dist_sq < state.min_range * state.min_range;
        if too_close && !state.can_retreat {
            continue;
        }
        match best {
            None => best = Some((dist_sq, c.entity)),
            Some((best_dist, _)) if dist_sq < best_dist => best = Some((dist_sq, c.entity)),
            _ => {}
        }
    }
    best.map(|(_, e)| e)
}

/// Whether the shooter's current target is still engageable.
///
/// Returns the target's band: `None` if invalid, `Some(true)` when too
/// close (retreat band), `Some(false)` when in the aim band.
fn target_band(
    shooter_pos: Vec3Fixed,
    state: &CombatState,
    candidates: &[Candidate],
    target: Entity,
) -> Option<bool> {
    let c = candidates.iter().find(|c| c.entity == target)?;
    let height_diff = shooter_pos.y - c.position.y;
    let max = state.effective_max_range(height_diff);
    let dist_sq = shooter_pos.distance_squared(c.position);
    if dist_sq > max * max {
        return None;
    }
    let too_close = dist_sq < state.min_range * state.min_range;
    if too_close && !state.can_retreat {
        return None;
    }
    Some(too_close)
}

/// Build the spawn bundle for one fired projectile.
fn projectile_bundle(
    shooter: Entity,
    shooter_pos: Vec3Fixed,
    target: Entity,
    target_pos: Vec3Fixed,
    faction: FactionId,
    state: &CombatState,
) -> SpawnBundle {
    let distance = shooter_pos.distance(target_pos);
    let flight_time = if state.projectile_speed > Fixed::ZERO {
        distance / state.projectile_speed
    } else {
        Fixed::from_num(1)
    };

    // Parabolic shots pick the vertical launch speed that lands the arc on
    // the target after the horizontal flight time.
    let vertical_velocity = match state.trajectory {
        TrajectoryKind::Linear => Fixed::ZERO,
        TrajectoryKind::Parabolic => {
            let horizontal = (target_pos - shooter_pos).horizontal().length();
            let t = if state.projectile_speed > Fixed::ZERO {
                horizontal / state.projectile_speed
            } else {
                Fixed::from_num(1)
            };
            if t > Fixed::ZERO {
                let dy = target_pos.y - shooter_pos.y;
                dy / t - state.gravity * t / Fixed::from_num(2)
            } else {
                Fixed::ZERO
            }
        }
    };

    SpawnBundle::new()
        .with(Transform::at(shooter_pos))
        .with(Projectile {
            origin: shooter_pos,
            target_point: target_pos,
            target: Some(target),
            speed: state.projectile_speed,
            gravity: state.gravity,
            vertical_velocity,
            shooter: Some(shooter),
            trajectory: state.trajectory,
            damage: state.damage,
            damage_type: state.damage_type,
            faction,
            age: Fixed::ZERO,
            // Generous timeout: twice the straight-line flight plus a second
            max_age: flight_time * Fixed::from_num(2) + Fixed::from_num(1),
        })
}

/// Ranged targeting, aiming, and firing.
///
/// Reads `Transform`/`FactionId`/`Health`, writes `CombatState`, and
/// enqueues projectile spawns into the command buffer.
pub fn targeting_system(world: &mut World, ctx: &mut TickCtx<'_>) -> Result<()> {
    let shooters = world.entities_matching(&[
        KindId::of::<CombatState>(),
        KindId::of::<Transform>(),
        KindId::of::<FactionId>(),
    ]);
    let candidates = collect_candidates(world);

    for shooter in shooters {
        let (Some(transform), Some(faction)) = (
            world.get::<Transform>(shooter).copied(),
            world.get::<FactionId>(shooter).copied(),
        ) else {
            continue;
        };
        let shooter_pos = transform.position;
        let Some(mut state) = world.get::<CombatState>(shooter).cloned() else {
            continue;
        };

        state.tick_cooldown(ctx.dt);
        state.firing = false;
        state.retreating = false;

        // Always prefer the nearest valid target; switching resets aim.
        let nearest = nearest_enemy(shooter, shooter_pos, faction, &state, &candidates);
        match nearest {
            Some(target) => state.set_target(target),
            None => state.clear_target(),
        }

        if let Some(target) = state.target {
            match target_band(shooter_pos, &state, &candidates, target) {
                None => {
                    // Destroyed or out of band since selection
                    state.clear_target();
                }
                Some(true) => {
                    // Too close: back off, no aim progress
                    state.retreating = true;
                    state.aim_timer = Fixed::ZERO;
                }
                Some(false) => {
                    state.aim_timer += ctx.dt;
                    if state.ready_to_fire() {
                        let target_pos = candidates
                            .iter()
                            .find(|c| c.entity == target)
                            .map(|c| c.position);
                        if let Some(target_pos) = target_pos {
                            ctx.commands.spawn(projectile_bundle(
                                shooter,
                                shooter_pos,
                                target,
                                target_pos,
                                faction,
                                &state,
                            ));
                            state.firing = true;
                            state.aim_timer = Fixed::ZERO;
                            state.cooldown_timer = state.cooldown;
                        }
                    }
                }
            }
        }

        if let Some(slot) = world.get_mut::<CombatState>(shooter) {
            *slot = state;
        }
    }
    Ok(())
}

/// Healing: each tick, every healer with a valid target in range restores
/// `rate x dt` hit points, clamped at the target's max. Fractional healing
/// carries between ticks. Stale or out-of-range targets are skipped
/// without side effects.
pub fn healing_system(world: &mut World, ctx: &mut TickCtx<'_>) -> Result<()> {
    let healers = world.entities_matching(&[
        KindId::of::<HealerState>(),
        KindId::of::<Transform>(),
        KindId::of::<FactionId>(),
    ]);

    for healer in healers {
        let (Some(transform), Some(faction)) = (
            world.get::<Transform>(healer).copied(),
            world.get::<FactionId>(healer).copied(),
        ) else {
            continue;
        };
        let healer_pos = transform.position;
        let Some(mut state) = world.get::<HealerState>(healer).cloned() else {
            continue;
        };

        // Drop a stale or out-of-range target; passed-away patients are an
        // expected transient condition.
        if let Some(target) = state.target {
            let valid = world.is_alive(target)
                && world.has::<Health>(target)
                && world.get::<Transform>(target).is_some_and(|t| {
                    healer_pos.distance_squared(t.position) <= state.range * state.range
                });
            if !valid {
                state.target = None;
            }
        }

        // Auto-acquire the nearest wounded ally in range (lowest entity
        // index breaks ties; candidates come back index-sorted).
        if state.target.is_none() {
            let mut best: Option<(Fixed, Entity)> = None;
            for ally in world.entities_matching(&[
                KindId::of::<Health>(),
                KindId::of::<Transform>(),
                KindId::of::<FactionId>(),
            ]) {
                if ally == healer {
                    continue;
                }
                if world.get::<FactionId>(ally) != Some(&faction) {
                    continue;
                }
                let Some(health) = world.get::<Health>(ally) else {
                    continue;
                };
                if health.current >= health.max {
                    continue;
                }
                let Some(t) = world.get::<Transform>(ally) else {
                    continue;
                };
                let dist_sq = healer_pos.distance_squared(t.position);
                if dist_sq > state.range * state.range {
                    continue;
                }
                match best {
                    None => best = Some((dist_sq, ally)),
                    Some((b, _)) if dist_sq < b => best = Some((dist_sq, ally)),
                    _ => {}
                }
            }
            state.target = best.map(|(_, e)| e);
        }

        if let Some(target) = state.target {
            let amount = state.rate * ctx.dt + state.carry;
            let whole: u32 = amount.int().to_num();
            state.carry = amount.frac();
            if whole > 0 {
                if let Some(health) = world.get_mut::<Health>(target) {
                    health.apply_heal(whole);
                }
            }
        }

        if let Some(slot) = world.get_mut::<HealerState>(healer) {
            *slot = state;
        }
    }
    Ok(())
}

/// Clears elapsed ability identifiers.
///
/// Invocation happens through [`AbilityState::try_invoke`] when an order
/// arrives; this system only expires the active marker once the cooldown
/// has run out.
pub fn ability_system(world: &mut World, ctx: &mut TickCtx<'_>) -> Result<()> {
    let now = ctx.time;
    for entity in world.entities_with::<AbilityState>() {
        let Some(state) = world.get_mut::<AbilityState>(entity) else {
            continue;
        };
        if state.active.is_some() {
            let elapsed = match state.last_use {
                Some(last) => now - last >= state.cooldown,
                None => true,
            };
            if elapsed {
                state.active = None;
            }
        }
    }
    Ok(())
}

/// Death sweep: entities at zero health are despawned via the command
/// buffer, which is what turns weak references to them stale.
pub fn health_sweep_system(world: &mut World, ctx: &mut TickCtx<'_>) -> Result<()> {
    for entity in world.entities_with::<Health>() {
        if world.get::<Health>(entity).is_some_and(Health::is_dead) {
            tracing::debug!(%entity, tick = ctx.tick, "entity died");
            ctx.commands.despawn(entity);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandBuffer;
    use crate::components::{DamageType, UnitTag};
    use crate::spawn::{spawn_healer, spawn_ranged_unit};

    fn test_ctx<'a>(commands: &'a CommandBuffer, dt: f64) -> TickCtx<'a> {
        TickCtx {
            dt: Fixed::from_num(dt),
            time: Fixed::ZERO,
            tick: 0,
            friendly_fire: false,
            commands,
            stats: None,
            fog: None,
            observer: FactionId(0),
            binder: None,
            visibility: Vec::new(),
        }
    }

    fn pos(x: f64, y: f64, z: f64) -> Vec3Fixed {
        Vec3Fixed::new(Fixed::from_num(x), Fixed::from_num(y), Fixed::from_num(z))
    }

    fn target_dummy(world: &mut World, faction: FactionId, at: Vec3Fixed) -> Entity {
        let e = world.spawn();
        world.insert(e, Transform::at(at));
        world.insert(e, faction);
        world.insert(e, Health::new(100));
        world.insert(e, UnitTag);
        e
    }

    #[test]
    fn test_acquire_nearest_enemy() {
        let mut world = World::new();
        let archer = spawn_ranged_unit(&mut world, "archer", FactionId(1), pos(0.0, 0.0, 0.0), None);
        let far = target_dummy(&mut world, FactionId(2), pos(9.0, 0.0, 0.0));
        let near = target_dummy(&mut world, FactionId(2), pos(5.0, 0.0, 0.0));

        let commands = CommandBuffer::new();
        let mut ctx = test_ctx(&commands, 0.05);
        targeting_system(&mut world, &mut ctx).expect("targeting runs");

        let state = world.get::<CombatState>(archer).expect("combat state");
        assert_eq!(state.target, Some(near));
        let _ = far;
    }

    #[test]
    fn test_friendly_units_are_not_targets() {
        let mut world = World::new();
        let archer = spawn_ranged_unit(&mut world, "archer", FactionId(1), pos(0.0, 0.0, 0.0), None);
        target_dummy(&mut world, FactionId(1), pos(5.0, 0.0, 0.0));

        let commands = CommandBuffer::new();
        let mut ctx = test_ctx(&commands, 0.05);
        targeting_system(&mut world, &mut ctx).expect("targeting runs");

        assert_eq!(world.get::<CombatState>(archer).and_then(|s| s.target), None);
    }

    #[test]
    fn test_tie_broken_by_lowest_entity_index() {
        let mut world = World::new();
        let archer = spawn_ranged_unit(&mut world, "archer", FactionId(1), pos(0.0, 0.0, 0.0), None);
        let first = target_dummy(&mut world, FactionId(2), pos(6.0, 0.0, 0.0));
        let second = target_dummy(&mut world, FactionId(2), pos(-6.0, 0.0, 0.0));

        let commands = CommandBuffer::new();
        let mut ctx = test_ctx(&commands, 0.05);
        targeting_system(&mut world, &mut ctx).expect("targeting runs");

        // Identical distance: lower index wins
        assert!(first.index() < second.index());
        assert_eq!(
            world.get::<CombatState>(archer).and_then(|s| s.target),
            Some(first)
        );
    }

    #[test]
    fn test_aim_matures_then_fires_once() {
        let mut world = World::new();
        let archer = spawn_ranged_unit(&mut world, "archer", FactionId(1), pos(0.0, 0.0, 0.0), None);
        target_dummy(&mut world, FactionId(2), pos(8.0, 0.0, 0.0));

        let commands = CommandBuffer::new();

        // Default archer: aim_time 1.0s. At dt 0.5 the second tick reaches
        // it and the shot leaves exactly then.
        for tick in 0..2 {
            let mut ctx = test_ctx(&commands, 0.5);
            ctx.tick = tick;
            targeting_system(&mut world, &mut ctx).expect("targeting runs");
        }

        let state = world.get::<CombatState>(archer).expect("combat state");
        assert!(state.firing);
        assert_eq!(state.aim_timer, Fixed::ZERO);
        assert_eq!(state.cooldown_timer, state.cooldown);
        assert_eq!(commands.len(), 1);

        // Cooldown now blocks an immediate refire
        let mut ctx = test_ctx(&commands, 0.5);
        targeting_system(&mut world, &mut ctx).expect("targeting runs");
        let state = world.get::<CombatState>(archer).expect("combat state");
        assert!(!state.firing);
    }

    #[test]
    fn test_aim_resets_when_target_destroyed() {
        let mut world = World::new();
        let archer = spawn_ranged_unit(&mut world, "archer", FactionId(1), pos(0.0, 0.0, 0.0), None);
        let victim = target_dummy(&mut world, FactionId(2), pos(8.0, 0.0, 0.0));

        let commands = CommandBuffer::new();
        let mut ctx = test_ctx(&commands, 0.5);
        targeting_system(&mut world, &mut ctx).expect("targeting runs");
        assert!(world.get::<CombatState>(archer).expect("state").aim_timer > Fixed::ZERO);

        world.despawn(victim);
        let mut ctx = test_ctx(&commands, 0.5);
        targeting_system(&mut world, &mut ctx).expect("targeting runs");

        let state = world.get::<CombatState>(archer).expect("combat state");
        assert_eq!(state.target, None);
        assert_eq!(state.aim_timer, Fixed::ZERO);
    }

    #[test]
    fn test_aim_resets_when_target_leaves_range() {
        let mut world = World::new();
        let archer = spawn_ranged_unit(&mut world, "archer", FactionId(1), pos(0.0, 0.0, 0.0), None);
        let runner = target_dummy(&mut world, FactionId(2), pos(8.0, 0.0, 0.0));

        let commands = CommandBuffer::new();
        let mut ctx = test_ctx(&commands, 0.5);
        targeting_system(&mut world, &mut ctx).expect("targeting runs");

        // Move the target out past max range
        world
            .get_mut::<Transform>(runner)
            .expect("transform")
            .position = pos(50.0, 0.0, 0.0);

        let mut ctx = test_ctx(&commands, 0.5);
        targeting_system(&mut world, &mut ctx).expect("targeting runs");

        let state = world.get::<CombatState>(archer).expect("combat state");
        assert_eq!(state.target, None);
        assert_eq!(state.aim_timer, Fixed::ZERO);
    }

    #[test]
    fn test_height_advantage_extends_range() {
        let mut world = World::new();
        // Archer on a cliff: default max_range 10, height_range_mod 0.25
        let archer =
            spawn_ranged_unit(&mut world, "archer", FactionId(1), pos(0.0, 8.0, 0.0), None);
        // Horizontal 11, height drop 8: straight distance ~13.6, effective
        // max = 10 + 0.25 * 8 = 12 -> still out. Move closer: horizontal 8,
        // distance ~11.3 < 12 -> in range thanks to the cliff.
        let below = target_dummy(&mut world, FactionId(2), pos(8.0, 0.0, 0.0));

        let commands = CommandBuffer::new();
        let mut ctx = test_ctx(&commands, 0.05);
        targeting_system(&mut world, &mut ctx).expect("targeting runs");

        assert_eq!(
            world.get::<CombatState>(archer).and_then(|s| s.target),
            Some(below)
        );
    }

    #[test]
    fn test_retreat_inside_min_range_stalls_aim() {
        let mut world = World::new();
        let archer = spawn_ranged_unit(&mut world, "archer", FactionId(1), pos(0.0, 0.0, 0.0), None);
        // Default min_range is 2; this target is inside it
        target_dummy(&mut world, FactionId(2), pos(1.0, 0.0, 0.0));

        let commands = CommandBuffer::new();
        for _ in 0..4 {
            let mut ctx = test_ctx(&commands, 0.5);
            targeting_system(&mut world, &mut ctx).expect("targeting runs");
        }

        let state = world.get::<CombatState>(archer).expect("combat state");
        assert!(state.retreating);
        assert_eq!(state.aim_timer, Fixed::ZERO);
        assert!(!state.firing);
        assert!(commands.is_empty());
    }

    #[test]
    fn test_healer_heals_rate_times_dt() {
        let mut world = World::new();
        let healer = spawn_healer(&mut world, FactionId(1), pos(0.0, 0.0, 0.0), None);
        let wounded = target_dummy(&mut world, FactionId(1), pos(2.0, 0.0, 0.0));
        world.get_mut::<Health>(wounded).expect("health").current = 40;
        world.get_mut::<Health>(wounded).expect("health").max = 50;

        let commands = CommandBuffer::new();
        let mut ctx = test_ctx(&commands, 1.0);
        healing_system(&mut world, &mut ctx).expect("healing runs");

        // Default rate is 5 hp/s
        assert_eq!(world.get::<Health>(wounded).map(|h| h.current), Some(45));
        let _ = healer;
    }

    #[test]
    fn test_heal_clamps_at_max() {
        let mut world = World::new();
        spawn_healer(&mut world, FactionId(1), pos(0.0, 0.0, 0.0), None);
        let wounded = target_dummy(&mut world, FactionId(1), pos(2.0, 0.0, 0.0));
        world.get_mut::<Health>(wounded).expect("health").current = 98;

        let commands = CommandBuffer::new();
        let mut ctx = test_ctx(&commands, 1.0);
        healing_system(&mut world, &mut ctx).expect("healing runs");

        assert_eq!(world.get::<Health>(wounded).map(|h| h.current), Some(100));
    }

    #[test]
    fn test_stale_heal_target_is_noop() {
        let mut world = World::new();
        let healer = spawn_healer(&mut world, FactionId(1), pos(0.0, 0.0, 0.0), None);
        let wounded = target_dummy(&mut world, FactionId(1), pos(2.0, 0.0, 0.0));
        world.get_mut::<Health>(wounded).expect("health").current = 10;
        world
            .get_mut::<HealerState>(healer)
            .expect("healer state")
            .target = Some(wounded);

        world.despawn(wounded);

        let commands = CommandBuffer::new();
        let mut ctx = test_ctx(&commands, 1.0);
        // Must not error; the stale target is simply dropped
        healing_system(&mut world, &mut ctx).expect("healing runs");
        assert_eq!(
            world.get::<HealerState>(healer).and_then(|s| s.target),
            None
        );
    }

    #[test]
    fn test_fractional_heal_carries_between_ticks() {
        let mut world = World::new();
        let healer = spawn_healer(&mut world, FactionId(1), pos(0.0, 0.0, 0.0), None);
        world.get_mut::<HealerState>(healer).expect("state").rate = Fixed::from_num(0.5);
        let wounded = target_dummy(&mut world, FactionId(1), pos(2.0, 0.0, 0.0));
        world.get_mut::<Health>(wounded).expect("health").current = 10;

        let commands = CommandBuffer::new();
        // 0.5 hp/s at dt 1.0: one whole point every two ticks
        for _ in 0..4 {
            let mut ctx = test_ctx(&commands, 1.0);
            healing_system(&mut world, &mut ctx).expect("healing runs");
        }
        assert_eq!(world.get::<Health>(wounded).map(|h| h.current), Some(12));
    }

    #[test]
    fn test_ability_active_clears_after_cooldown() {
        use crate::components::AbilityId;

        let mut world = World::new();
        let e = world.spawn();
        let mut ability = AbilityState::new(Fixed::from_num(2));
        assert!(ability.try_invoke(AbilityId(1), Fixed::ZERO));
        world.insert(e, ability);

        let commands = CommandBuffer::new();

        let mut ctx = test_ctx(&commands, 1.0);
        ctx.time = Fixed::from_num(1);
        ability_system(&mut world, &mut ctx).expect("ability runs");
        assert!(world.get::<AbilityState>(e).expect("state").active.is_some());

        let mut ctx = test_ctx(&commands, 1.0);
        ctx.time = Fixed::from_num(2);
        ability_system(&mut world, &mut ctx).expect("ability runs");
        assert!(world.get::<AbilityState>(e).expect("state").active.is_none());
    }

    #[test]
    fn test_health_sweep_despawns_dead() {
        let mut world = World::new();
        let dead = target_dummy(&mut world, FactionId(2), pos(0.0, 0.0, 0.0));
        world.get_mut::<Health>(dead).expect("health").current = 0;
        let alive = target_dummy(&mut world, FactionId(2), pos(1.0, 0.0, 0.0));

        let commands = CommandBuffer::new();
        let mut ctx = test_ctx(&commands, 0.05);
        health_sweep_system(&mut world, &mut ctx).expect("sweep runs");
        commands.playback(&mut world);

        assert!(!world.is_alive(dead));
        assert!(world.is_alive(alive));
    }

    #[test]
    fn test_fired_projectile_carries_shooter_tuning() {
        let mut world = World::new();
        let archer = spawn_ranged_unit(&mut world, "archer", FactionId(1), pos(0.0, 0.0, 0.0), None);
        let victim = target_dummy(&mut world, FactionId(2), pos(8.0, 0.0, 0.0));

        let commands = CommandBuffer::new();
        for _ in 0..3 {
            let mut ctx = test_ctx(&commands, 0.5);
            targeting_system(&mut world, &mut ctx).expect("targeting runs");
        }
        commands.playback(&mut world);

        let projectiles = world.entities_with::<Projectile>();
        assert_eq!(projectiles.len(), 1);
        let p = world.get::<Projectile>(projectiles[0]).expect("projectile");
        assert_eq!(p.shooter, Some(archer));
        assert_eq!(p.target, Some(victim));
        assert_eq!(p.damage, 8);
        assert_eq!(p.damage_type, DamageType::Pierce);
        assert_eq!(p.faction, FactionId(1));
    }
}
