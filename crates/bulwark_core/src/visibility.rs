//! Fog-of-war visibility gate.
//!
//! The gate is a read-only presentation pass: it classifies every
//! renderable entity from the observer faction's point of view and hands
//! the classification to the presentation binder. It never mutates
//! simulation state, so its outcome cannot influence a tick.
//!
//! Fog queries and presentation bindings live outside the core; both are
//! injected per tick through [`crate::schedule::TickCtx`]. A missing fog
//! provider makes the gate skip the tick with a reported fault; a missing
//! binder only skips the binding write, classification still runs.

use crate::components::{BuildingTag, FactionId, Transform};
use crate::entity::Entity;
use crate::error::{Result, SimError};
use crate::math::Vec3Fixed;
use crate::schedule::TickCtx;
use crate::store::{KindId, World};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// How an entity presents to the observer faction this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisibilityClass {
    /// Owned by the observer; always shown.
    Owned,
    /// Enemy or neutral entity inside currently visible fog.
    VisibleEnemyOrNeutral,
    /// Building in explored-but-not-visible fog; shown as a ghost at its
    /// last known state.
    GhostedBuilding,
    /// Not shown at all.
    Hidden,
}

/// Fog-of-war queries, answered by the embedder's fog grid.
///
/// `Sync` so the classification pass can fan out over worker threads.
pub trait FogProvider: Sync {
    /// Whether `position` is inside `faction`'s currently visible area.
    fn is_visible(&self, faction: FactionId, position: Vec3Fixed) -> bool;

    /// Whether `faction` has ever explored `position`.
    fn is_revealed(&self, faction: FactionId, position: Vec3Fixed) -> bool;
}

/// Sink for per-entity visibility decisions, implemented by the renderer
/// glue. Entities without a binding are skipped without error.
pub trait PresentationBinder {
    /// Whether this entity has a presentation binding at all.
    fn has_binding(&self, entity: Entity) -> bool;

    /// Apply a classification to the entity's presentation.
    fn apply(&mut self, entity: Entity, class: VisibilityClass);
}

/// Classify one entity given already-evaluated fog answers.
///
/// Units never ghost: an explored-but-not-visible unit is `Hidden`, only
/// buildings persist as ghosts.
#[must_use]
pub fn classify(
    observer: FactionId,
    owner: FactionId,
    is_building: bool,
    visible: bool,
    revealed: bool,
) -> VisibilityClass {
    if owner == observer {
        VisibilityClass::Owned
    } else if visible {
        VisibilityClass::VisibleEnemyOrNeutral
    } else if is_building && revealed {
        VisibilityClass::GhostedBuilding
    } else {
        VisibilityClass::Hidden
    }
}

/// Snapshot row for the classification pass.
#[derive(Debug, Clone, Copy)]
struct Renderable {
    entity: Entity,
    owner: FactionId,
    position: Vec3Fixed,
    is_building: bool,
}

fn collect_renderables(world: &World) -> Vec<Renderable> {
    world
        .entities_matching(&[KindId::of::<Transform>(), KindId::of::<FactionId>()])
        .into_iter()
        .filter_map(|entity| {
            Some(Renderable {
                entity,
                owner: *world.get::<FactionId>(entity)?,
                position: world.get::<Transform>(entity)?.position,
                is_building: world.has::<BuildingTag>(entity),
            })
        })
        .collect()
}

fn classify_row(
    row: &Renderable,
    observer: FactionId,
    fog: &dyn FogProvider,
) -> (Entity, VisibilityClass) {
    let class = classify(
        observer,
        row.owner,
        row.is_building,
        fog.is_visible(observer, row.position),
        fog.is_revealed(observer, row.position),
    );
    (row.entity, class)
}

/// Classify every snapshot row.
///
/// With the `parallel` feature the pass fans out over worker threads; fog
/// queries are read-only and row order is preserved, so the result is
/// identical to the sequential pass.
fn classify_all(
    rows: &[Renderable],
    observer: FactionId,
    fog: &dyn FogProvider,
) -> Vec<(Entity, VisibilityClass)> {
    #[cfg(feature = "parallel")]
    {
        rows.par_iter()
            .map(|r| classify_row(r, observer, fog))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        rows.iter()
            .map(|r| classify_row(r, observer, fog))
            .collect()
    }
}

/// Presentation-stage visibility gate.
///
/// Reads `Transform`, `FactionId`, and `BuildingTag`; writes nothing in
/// the store. Classifications land in `ctx.visibility` and, when a binder
/// is present, in the binder for every bound entity.
pub fn visibility_gate_system(world: &mut World, ctx: &mut TickCtx<'_>) -> Result<()> {
    let Some(fog) = ctx.fog else {
        return Err(SimError::MissingCollaborator("fog provider"));
    };

    let rows = collect_renderables(world);
    let classified = classify_all(&rows, ctx.observer, fog);

    if let Some(binder) = ctx.binder.as_deref_mut() {
        for &(entity, class) in &classified {
            if binder.has_binding(entity) {
                binder.apply(entity, class);
            }
        }
    }
    ctx.visibility = classified;
    Ok(())
}
