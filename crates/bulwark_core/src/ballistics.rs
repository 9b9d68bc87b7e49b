//! Projectile flight and impact resolution.
//!
//! Projectiles are real entities advanced once per tick. Linear shots home
//! on the target's current position; parabolic shots keep a constant
//! horizontal speed while gravity integrates the vertical axis. Arrival is
//! a distance threshold: when the remaining distance is covered by this
//! tick's displacement, the projectile resolves at the target point.
//!
//! Impact never despawns anything directly. Damage is written in place and
//! the projectile's own despawn goes through the command buffer, so weak
//! references held by other systems stay valid until the stage barrier.

use crate::components::{FactionId, Health, Projectile, TrajectoryKind, Transform};
use crate::error::Result;
use crate::math::{Fixed, Vec3Fixed};
use crate::schedule::TickCtx;
use crate::store::{KindId, World};

/// One projectile's state copied out for the flight step.
struct Flight {
    position: Vec3Fixed,
    projectile: Projectile,
    resolved: bool,
}

/// Advance a projectile by `dt`, flagging arrival.
///
/// Pure on its inputs so the flight math is testable without a world.
fn advance(flight: &mut Flight, dt: Fixed) {
    let p = &mut flight.projectile;
    p.age += dt;
    match p.trajectory {
        TrajectoryKind::Linear => {
            let remaining = flight.position.distance(p.target_point);
            let step = p.speed * dt;
            if remaining <= step {
                flight.position = p.target_point;
                flight.resolved = true;
            } else {
                let dir = (p.target_point - flight.position).normalize();
                flight.position = flight.position + dir.scale(step);
            }
        }
        TrajectoryKind::Parabolic => {
            // Horizontal advance at constant speed; arrival is judged on the
            // ground plane so the arc can overshoot vertically.
            let to_target = (p.target_point - flight.position).horizontal();
            let remaining = to_target.length();
            let step = p.speed * dt;
            p.vertical_velocity += p.gravity * dt;
            if remaining <= step {
                flight.position = p.target_point;
                flight.resolved = true;
            } else {
                let dir = to_target.normalize();
                flight.position = flight.position + dir.scale(step);
                flight.position.y += p.vertical_velocity * dt;
            }
        }
    }
}

/// Whether an impact on `target_faction` applies damage under the current
/// friendly-fire policy. Self-hits never damage.
fn damage_allowed(
    projectile: &Projectile,
    target: crate::entity::Entity,
    target_faction: FactionId,
    friendly_fire: bool,
) -> bool {
    if projectile.shooter == Some(target) {
        return false;
    }
    friendly_fire || target_faction != projectile.faction
}

/// Flight integration and impact for every in-flight projectile.
///
/// Reads `FactionId`, writes `Transform`, `Projectile`, and `Health`;
/// despawns resolved and timed-out projectiles through the command buffer.
pub fn ballistics_system(world: &mut World, ctx: &mut TickCtx<'_>) -> Result<()> {
    let in_flight =
        world.entities_matching(&[KindId::of::<Projectile>(), KindId::of::<Transform>()]);

    for entity in in_flight {
        let (Some(transform), Some(projectile)) = (
            world.get::<Transform>(entity).copied(),
            world.get::<Projectile>(entity).cloned(),
        ) else {
            continue;
        };
        let mut flight = Flight {
            position: transform.position,
            projectile,
            resolved: false,
        };

        // Track a live target; a stale target freezes the aim point.
        if let Some(target) = flight.projectile.target {
            if world.is_alive(target) {
                if let Some(t) = world.get::<Transform>(target) {
                    flight.projectile.target_point = t.position;
                }
            }
        }

        advance(&mut flight, ctx.dt);

        if flight.projectile.age > flight.projectile.max_age {
            tracing::debug!(%entity, "projectile timed out");
            ctx.commands.despawn(entity);
            continue;
        }

        if flight.resolved {
            if let Some(target) = flight.projectile.target {
                if world.is_alive(target) {
                    let target_faction = world.get::<FactionId>(target).copied();
                    let allowed = target_faction.is_some_and(|f| {
                        damage_allowed(&flight.projectile, target, f, ctx.friendly_fire)
                    });
                    if allowed {
                        if let Some(health) = world.get_mut::<Health>(target) {
                            health.apply_damage(flight.projectile.damage);
                            tracing::trace!(
                                %target,
                                damage = flight.projectile.damage,
                                kind = ?flight.projectile.damage_type,
                                "projectile hit"
                            );
                        }
                    }
                }
            }
            ctx.commands.despawn(entity);
            continue;
        }

        if let Some(t) = world.get_mut::<Transform>(entity) {
            t.position = flight.position;
        }
        if let Some(p) = world.get_mut::<Projectile>(entity) {
            *p = flight.projectile;
        }
    }
    Ok(())
}
