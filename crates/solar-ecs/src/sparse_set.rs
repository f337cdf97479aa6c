//! Sparse set of entities.
//!
//! Two parallel arrays give O(1) insert, membership test and removal:
//!
//! - `sparse[entity.sequence()]` holds the entity's position in `dense`, or
//!   [`ABSENT`] when the slot is unused.
//! - `dense` lists live entities contiguously.
//!
//! Removal is swap-and-pop, so `dense` stays packed but insertion order is not
//! preserved. Use the entity itself, never its dense position, as a stable key.

use crate::entity::Entity;

/// Sentinel stored in `sparse` for slots with no live entity.
pub(crate) const ABSENT: usize = usize::MAX;

/// A set of live entities with O(1) operations.
///
/// Invariant: for every entity `e` in the set,
/// `dense[sparse[e.sequence()]] == e`.
#[derive(Debug, Clone, Default)]
pub struct SparseSet {
    sparse: Vec<usize>,
    dense: Vec<Entity>,
}

impl SparseSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
        }
    }

    /// Create an empty set with room for `reserve` entities.
    pub fn with_capacity(reserve: usize) -> Self {
        let mut set = Self::new();
        set.reserve(reserve);
        set
    }

    /// Reserve room for `additional` more entities. Performance hint only.
    pub fn reserve(&mut self, additional: usize) {
        self.dense.reserve(additional);
        let wanted = self.dense.len() + additional;
        if wanted > self.sparse.len() {
            self.sparse.resize(wanted, ABSENT);
        }
    }

    /// Insert `entity`.
    ///
    /// Inserting an entity that is already present is a no-op: a warning is
    /// logged and `false` is returned.
    pub fn insert(&mut self, entity: Entity) -> bool {
        if self.has(entity) {
            tracing::warn!(entity = %entity, "entity already present in sparse set -- ignoring insert");
            return false;
        }
        let slot = entity.slot();
        if slot >= self.sparse.len() {
            self.sparse.resize(slot + 1, ABSENT);
        }
        self.sparse[slot] = self.dense.len();
        self.dense.push(entity);
        true
    }

    /// Whether `entity` is in the set.
    #[inline]
    pub fn has(&self, entity: Entity) -> bool {
        self.find_index(entity).is_some()
    }

    /// Position of `entity` in the dense array, if present.
    #[inline]
    pub fn find_index(&self, entity: Entity) -> Option<usize> {
        let index = *self.sparse.get(entity.slot())?;
        match self.dense.get(index) {
            Some(&stored) if stored == entity => Some(index),
            _ => None,
        }
    }

    /// Remove `entity` using swap-and-pop.
    ///
    /// Removing an absent entity logs a warning and returns `false`.
    pub fn remove(&mut self, entity: Entity) -> bool {
        match self.find_index(entity) {
            Some(index) => {
                self.swap_remove_at(index);
                true
            }
            None => {
                tracing::warn!(entity = %entity, "tried to remove an entity that is not in the sparse set");
                false
            }
        }
    }

    /// Swap-and-pop the entity at dense position `index`.
    ///
    /// The last entity moves into `index` and its sparse slot is updated. Any
    /// parallel array must perform the same `swap_remove(index)` to stay in
    /// lockstep.
    pub(crate) fn swap_remove_at(&mut self, index: usize) -> Entity {
        let removed = self.dense.swap_remove(index);
        if let Some(&moved) = self.dense.get(index) {
            self.sparse[moved.slot()] = index;
        }
        self.sparse[removed.slot()] = ABSENT;
        removed
    }

    /// Remove every entity. Backing storage is retained.
    pub fn clear(&mut self) {
        for entity in self.dense.drain(..) {
            self.sparse[entity.slot()] = ABSENT;
        }
    }

    /// Number of live entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Whether the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Capacity of the dense array.
    pub fn capacity(&self) -> usize {
        self.dense.capacity()
    }

    /// Live entities in dense order.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.dense
    }

    /// Iterate live entities in dense order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.dense.iter().copied()
    }

    /// Raw sparse entry for `entity`'s slot, for invariant checks in tests.
    #[cfg(test)]
    pub(crate) fn sparse_entry(&self, entity: Entity) -> Option<usize> {
        self.sparse
            .get(entity.slot())
            .copied()
            .filter(|&i| i != ABSENT)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
