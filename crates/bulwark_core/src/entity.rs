//! Entity identifiers and the generational allocator.
//!
//! Entities are opaque ids with no intrinsic data; all semantics come
//! from attached components. The generation counter makes stale weak
//! references (attack targets, heal targets, projectile shooters)
//! detectable: a despawned slot can be reused without the old id ever
//! resolving again.

use serde::{Deserialize, Serialize};

/// Opaque entity identifier: slot index plus generation counter.
///
/// Two ids with the same index but different generations name different
/// entities across a despawn/reuse cycle. Ordering is by index first,
/// which gives the deterministic tie-break used in target selection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    /// Construct an entity id from raw parts.
    ///
    /// Only the allocator and serialization paths should need this.
    #[must_use]
    pub const fn from_raw(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index of this entity.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation of this entity.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Generational entity allocator.
///
/// Maintains one generation counter per slot and a free-list of
/// despawned slots. Allocation prefers reuse (keeps indices dense,
/// which keeps column storage dense).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityAllocator {
    generations: Vec<u32>,
    free: Vec<u32>,
}

impl EntityAllocator {
    /// Create an empty allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh entity id.
    pub fn allocate(&mut self) -> Entity {
        if let Some(index) = self.free.pop() {
            Entity::from_raw(index, self.generations[index as usize])
        } else {
            let index = u32::try_from(self.generations.len()).unwrap_or(u32::MAX);
            self.generations.push(0);
            Entity::from_raw(index, 0)
        }
    }

    /// Release an entity id, bumping its slot generation.
    ///
    /// Releasing a stale id is a no-op; the slot already belongs to a
    /// newer generation.
    pub fn release(&mut self, entity: Entity) {
        let slot = entity.index() as usize;
        if slot < self.generations.len() && self.generations[slot] == entity.generation() {
            self.generations[slot] = self.generations[slot].wrapping_add(1);
            self.free.push(entity.index());
        }
    }

    /// Check whether an entity id names a currently-live entity.
    ///
    /// Release bumps the slot generation, so a freed slot never matches
    /// any id that was handed out before reuse.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        let slot = entity.index() as usize;
        slot < self.generations.len() && self.generations[slot] == entity.generation()
    }

    /// Number of live entities.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.generations.len() - self.free.len()
    }
}
