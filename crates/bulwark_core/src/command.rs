//! Deferred structural mutation via a command log.
//!
//! Systems never create or destroy entities mid-iteration; they append
//! operations to a [`CommandBuffer`] shared by reference, and the scheduler
//! plays the log back into the [`World`] at explicit barriers. Appends from
//! parallel producers are safe (the log is behind a `parking_lot` mutex);
//! playback is single-threaded and happens only at barriers, which gives
//! structural changes a total order within the tick.

use parking_lot::Mutex;

use crate::entity::Entity;
use crate::store::{Component, World};

/// A component value that can be installed on an entity type-erased.
trait BundlePart: Send {
    fn install(self: Box<Self>, world: &mut World, entity: Entity);
}

impl<T: Component> BundlePart for T {
    fn install(self: Box<Self>, world: &mut World, entity: Entity) {
        world.insert(entity, *self);
    }
}

/// A set of components spawned onto one new entity atomically.
///
/// From the caller's perspective the entity either exists with the full
/// bundle after playback or does not exist at all; no system can observe a
/// partially-built entity.
#[derive(Default)]
pub struct SpawnBundle {
    parts: Vec<Box<dyn BundlePart>>,
}

impl SpawnBundle {
    /// Create an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component to the bundle.
    #[must_use]
    pub fn with<T: Component>(mut self, value: T) -> Self {
        self.parts.push(Box::new(value));
        self
    }

    /// Number of components in the bundle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the bundle holds no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

fn remove_erased<T: Component>(world: &mut World, entity: Entity) {
    let _ = world.remove::<T>(entity);
}

enum Op {
    Spawn(SpawnBundle),
    Insert {
        entity: Entity,
        component: Box<dyn BundlePart>,
    },
    Remove {
        entity: Entity,
        remove: fn(&mut World, Entity),
    },
    Despawn(Entity),
}

/// Append-only log of structural operations, applied at barriers.
#[derive(Default)]
pub struct CommandBuffer {
    ops: Mutex<Vec<Op>>,
}

impl CommandBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue spawning a new entity with the given component bundle.
    pub fn spawn(&self, bundle: SpawnBundle) {
        self.ops.lock().push(Op::Spawn(bundle));
    }

    /// Queue adding (or replacing) a component on an entity.
    pub fn insert<T: Component>(&self, entity: Entity, value: T) {
        self.ops.lock().push(Op::Insert {
            entity,
            component: Box::new(value),
        });
    }

    /// Queue removing a component kind from an entity.
    pub fn remove<T: Component>(&self, entity: Entity) {
        self.ops.lock().push(Op::Remove {
            entity,
            remove: remove_erased::<T>,
        });
    }

    /// Queue destroying an entity.
    pub fn despawn(&self, entity: Entity) {
        self.ops.lock().push(Op::Despawn(entity));
    }

    /// Number of queued operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.lock().len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.lock().is_empty()
    }

    /// Apply every queued operation to the world in enqueue order, exactly
    /// once, then clear the log.
    ///
    /// Operations that reference an entity destroyed earlier in the same
    /// playback (or already dead before it) are silently dropped; structural
    /// changes are idempotent-safe within a tick's logical intent.
    ///
    /// Returns the number of operations applied (dropped ops not counted).
    pub fn playback(&self, world: &mut World) -> usize {
        let ops = std::mem::take(&mut *self.ops.lock());
        let total = ops.len();
        let mut applied = 0;

        for op in ops {
            match op {
                Op::Spawn(bundle) => {
                    let entity = world.spawn();
                    for part in bundle.parts {
                        part.install(world, entity);
                    }
                    applied += 1;
                }
                Op::Insert { entity, component } => {
                    if world.is_alive(entity) {
                        component.install(world, entity);
                        applied += 1;
                    }
                }
                Op::Remove { entity, remove } => {
                    if world.is_alive(entity) {
                        remove(world, entity);
                        applied += 1;
                    }
                }
                Op::Despawn(entity) => {
                    if world.despawn(entity) {
                        applied += 1;
                    }
                }
            }
        }

        if applied < total {
            tracing::debug!(
                applied,
                dropped = total - applied,
                "command playback dropped stale operations"
            );
        }
        applied
    }
}
