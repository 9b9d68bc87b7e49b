//! Typed, dense component storage with runtime queries.
//!
//! The [`World`] maps a component type to a sparse-set column: a dense
//! value array paired with a sparse index keyed by entity slot. Lookup and
//! presence checks are O(1); removal is swap-remove. Queries intersect
//! column presence starting from the smallest column and return a sorted
//! snapshot of entity ids, which gives snapshot-at-query-start semantics
//! and deterministic iteration order (ascending entity index).
//!
//! # Determinism
//!
//! Query results are sorted by entity index every time. Dense column order
//! varies with removal history and must never drive system iteration.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::components::{BuildingTag, HallTag, UnitTag};
use crate::entity::{Entity, EntityAllocator};

/// Marker trait for component types.
///
/// Blanket-implemented: any `'static + Send + Sync` plain-data type is a
/// component.
pub trait Component: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Component for T {}

/// Runtime identifier of a component kind, used by scheduler access
/// declarations and multi-kind queries.
#[derive(Debug, Clone, Copy)]
pub struct KindId {
    type_id: TypeId,
    name: &'static str,
}

impl KindId {
    /// Kind id of a component type.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Short human-readable name (for logs and reports).
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn type_id(&self) -> TypeId {
        self.type_id
    }
}

impl PartialEq for KindId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for KindId {}

impl std::hash::Hash for KindId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

/// Sentinel for "entity slot has no value in this column".
const NO_SLOT: u32 = u32::MAX;

/// Dense storage for one component kind.
struct Column<T> {
    /// Entity slot index -> dense index, `NO_SLOT` when absent.
    sparse: Vec<u32>,
    /// Owning entity per dense index (generation-checked on access).
    entities: Vec<Entity>,
    /// Component values, parallel to `entities`.
    values: Vec<T>,
}

impl<T: Component> Column<T> {
    fn new() -> Self {
        Self {
            sparse: Vec::new(),
            entities: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Dense slot of this entity, if present with a matching generation.
    fn slot(&self, entity: Entity) -> Option<usize> {
        let s = *self.sparse.get(entity.index() as usize)?;
        if s == NO_SLOT {
            return None;
        }
        let s = s as usize;
        (self.entities[s] == entity).then_some(s)
    }

    /// Insert or replace the value for an entity.
    fn insert(&mut self, entity: Entity, value: T) {
        if let Some(slot) = self.slot(entity) {
            self.values[slot] = value;
            return;
        }
        let idx = entity.index() as usize;
        if idx >= self.sparse.len() {
            self.sparse.resize(idx + 1, NO_SLOT);
        }
        // A stale same-slot entry (older generation) is overwritten in place
        // if it survived a despawn without cleanup; despawn clears columns,
        // so in practice this is a fresh append.
        self.sparse[idx] = u32::try_from(self.entities.len()).unwrap_or(NO_SLOT);
        self.entities.push(entity);
        self.values.push(value);
    }

    /// Remove the value for an entity, if present.
    fn take(&mut self, entity: Entity) -> Option<T> {
        let slot = self.slot(entity)?;
        self.sparse[entity.index() as usize] = NO_SLOT;
        self.entities.swap_remove(slot);
        let value = self.values.swap_remove(slot);
        // Fix up the sparse entry of the element that moved into `slot`
        if slot < self.entities.len() {
            let moved = self.entities[slot];
            self.sparse[moved.index() as usize] = u32::try_from(slot).unwrap_or(NO_SLOT);
        }
        Some(value)
    }

    fn get(&self, entity: Entity) -> Option<&T> {
        self.slot(entity).map(|s| &self.values[s])
    }

    fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.slot(entity).map(|s| &mut self.values[s])
    }
}

/// Type-erased view over a column, enough for despawn and intersection.
trait AnyColumn: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn contains(&self, entity: Entity) -> bool;
    fn forget(&mut self, entity: Entity);
    fn len(&self) -> usize;
    fn entity_list(&self) -> Vec<Entity>;
}

impl<T: Component> AnyColumn for Column<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn contains(&self, entity: Entity) -> bool {
        self.slot(entity).is_some()
    }

    fn forget(&mut self, entity: Entity) {
        let _ = self.take(entity);
    }

    fn len(&self) -> usize {
        self.entities.len()
    }

    fn entity_list(&self) -> Vec<Entity> {
        self.entities.clone()
    }
}

/// Counts from the debug census query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntityCensus {
    /// Entities carrying [`UnitTag`].
    pub units: usize,
    /// Entities carrying [`BuildingTag`].
    pub buildings: usize,
    /// Entities carrying [`HallTag`].
    pub halls: usize,
}

/// Storage for all entities and components in the simulation.
#[derive(Default)]
pub struct World {
    allocator: EntityAllocator,
    columns: HashMap<TypeId, Box<dyn AnyColumn>>,
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a new empty entity.
    pub fn spawn(&mut self) -> Entity {
        self.allocator.allocate()
    }

    /// Despawn an entity, removing all of its components.
    ///
    /// Returns `false` (and does nothing) if the entity is already dead.
    /// All outstanding weak references to the entity become stale.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.allocator.is_alive(entity) {
            return false;
        }
        for column in self.columns.values_mut() {
            column.forget(entity);
        }
        self.allocator.release(entity);
        true
    }

    /// Whether an entity id names a live entity.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.allocator.live_count()
    }

    /// Whether the world holds no live entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or replace a component on an entity.
    ///
    /// Returns `false` (and stores nothing) if the entity is dead; stale
    /// structural writes are an expected no-op, not an error.
    pub fn insert<T: Component>(&mut self, entity: Entity, value: T) -> bool {
        if !self.allocator.is_alive(entity) {
            return false;
        }
        self.column_mut_or_create::<T>().insert(entity, value);
        true
    }

    /// Remove a component from an entity, returning it if present.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.column_mut::<T>()?.take(entity)
    }

    /// O(1) presence check.
    #[must_use]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.column::<T>().is_some_and(|c| c.slot(entity).is_some())
    }

    /// Read a component.
    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.column::<T>()?.get(entity)
    }

    /// Mutably borrow a component.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.column_mut::<T>()?.get_mut(entity)
    }

    /// Snapshot of all entities holding component `T`, sorted by index.
    ///
    /// The snapshot is taken at call time: entities created or destroyed
    /// while the caller iterates the result are not observed.
    #[must_use]
    pub fn entities_with<T: Component>(&self) -> Vec<Entity> {
        let mut out = match self.column::<T>() {
            Some(column) => column.entities.clone(),
            None => Vec::new(),
        };
        out.sort_unstable();
        out
    }

    /// Snapshot of all entities holding every listed kind, sorted by index.
    ///
    /// Iteration is driven by the smallest column; the other kinds are
    /// checked with O(1) presence tests.
    #[must_use]
    pub fn entities_matching(&self, kinds: &[KindId]) -> Vec<Entity> {
        if kinds.is_empty() {
            return Vec::new();
        }
        let mut columns = Vec::with_capacity(kinds.len());
        for kind in kinds {
            match self.columns.get(&kind.type_id()) {
                Some(column) => columns.push(column.as_ref()),
                // A kind with no column yet has no members at all
                None => return Vec::new(),
            }
        }
        let Some(smallest) = columns.iter().min_by_key(|c| c.len()) else {
            return Vec::new();
        };

        let mut out: Vec<Entity> = smallest
            .entity_list()
            .into_iter()
            .filter(|e| columns.iter().all(|c| c.contains(*e)))
            .collect();
        out.sort_unstable();
        out
    }

    /// Debug census: counts of unit/building/hall marker holders.
    ///
    /// Purely observational; triggered by an external debug action.
    #[must_use]
    pub fn census(&self) -> EntityCensus {
        EntityCensus {
            units: self.column::<UnitTag>().map_or(0, Column::len),
            buildings: self.column::<BuildingTag>().map_or(0, Column::len),
            halls: self.column::<HallTag>().map_or(0, Column::len),
        }
    }

    fn column<T: Component>(&self) -> Option<&Column<T>> {
        self.columns
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<Column<T>>()
    }

    fn column_mut<T: Component>(&mut self) -> Option<&mut Column<T>> {
        self.columns
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<Column<T>>()
    }

    fn column_mut_or_create<T: Component>(&mut self) -> &mut Column<T> {
        self.columns
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Column::<T>::new()))
            .as_any_mut()
            .downcast_mut::<Column<T>>()
            .unwrap_or_else(|| unreachable!("column registered under foreign TypeId"))
    }
}
