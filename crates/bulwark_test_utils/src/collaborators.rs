//! Scripted fog and presentation collaborators for tests.

use std::collections::{HashMap, HashSet};

use bulwark_core::components::FactionId;
use bulwark_core::entity::Entity;
use bulwark_core::math::{Fixed, Vec3Fixed};
use bulwark_core::visibility::{FogProvider, PresentationBinder, VisibilityClass};

/// Fog that sees and has explored everything, for every faction.
#[derive(Debug, Default, Clone, Copy)]
pub struct OmniscientFog;

impl FogProvider for OmniscientFog {
    fn is_visible(&self, _faction: FactionId, _position: Vec3Fixed) -> bool {
        true
    }

    fn is_revealed(&self, _faction: FactionId, _position: Vec3Fixed) -> bool {
        true
    }
}

/// Fog scripted by two radii around a per-faction origin: inside
/// `visible_radius` is visible, inside `revealed_radius` is explored.
#[derive(Debug, Clone)]
pub struct RadialFog {
    origins: HashMap<FactionId, Vec3Fixed>,
    visible_radius: Fixed,
    revealed_radius: Fixed,
}

impl RadialFog {
    /// Fog with the given radii and no faction origins yet.
    #[must_use]
    pub fn new(visible_radius: Fixed, revealed_radius: Fixed) -> Self {
        Self {
            origins: HashMap::new(),
            visible_radius,
            revealed_radius,
        }
    }

    /// Set the fog origin for a faction.
    #[must_use]
    pub fn with_origin(mut self, faction: FactionId, origin: Vec3Fixed) -> Self {
        self.origins.insert(faction, origin);
        self
    }
}

impl FogProvider for RadialFog {
    fn is_visible(&self, faction: FactionId, position: Vec3Fixed) -> bool {
        self.origins
            .get(&faction)
            .is_some_and(|o| o.distance_squared(position) <= self.visible_radius * self.visible_radius)
    }

    fn is_revealed(&self, faction: FactionId, position: Vec3Fixed) -> bool {
        self.origins
            .get(&faction)
            .is_some_and(|o| o.distance_squared(position) <= self.revealed_radius * self.revealed_radius)
    }
}

/// Binder that records every applied classification.
#[derive(Debug, Default)]
pub struct RecordingBinder {
    bound: HashSet<Entity>,
    /// Applications in the order the gate made them.
    pub applied: Vec<(Entity, VisibilityClass)>,
}

impl RecordingBinder {
    /// Binder with no bindings (the gate skips every entity).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a presentation binding for `entity`.
    pub fn bind(&mut self, entity: Entity) {
        self.bound.insert(entity);
    }

    /// Last classification applied to `entity`, if any.
    #[must_use]
    pub fn last_class(&self, entity: Entity) -> Option<VisibilityClass> {
        self.applied
            .iter()
            .rev()
            .find(|(e, _)| *e == entity)
            .map(|&(_, c)| c)
    }
}

impl PresentationBinder for RecordingBinder {
    fn has_binding(&self, entity: Entity) -> bool {
        self.bound.contains(&entity)
    }

    fn apply(&mut self, entity: Entity, class: VisibilityClass) {
        self.applied.push((entity, class));
    }
}
