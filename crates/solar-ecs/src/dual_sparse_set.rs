//! Component storage: a [`SparseSet`] paired with a dense component array.
//!
//! [`DualSparseSet<T>`] keeps `components[i]` owned by `entities()[i]` at all
//! times. Every mutation goes through the same swap-and-pop on both arrays so
//! the two can never drift apart.
//!
//! The Manager holds stores of many component types behind the crate-internal
//! [`ComponentStore`] trait, which exposes only what entity teardown and
//! snapshotting need.

use std::any::Any;

use crate::entity::Entity;
use crate::sparse_set::SparseSet;
use crate::EcsError;

// ---------------------------------------------------------------------------
// DualSparseSet
// ---------------------------------------------------------------------------

/// Dense storage for one component type, indexed by entity.
#[derive(Debug, Clone)]
pub struct DualSparseSet<T> {
    set: SparseSet,
    components: Vec<T>,
}

impl<T> Default for DualSparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DualSparseSet<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            set: SparseSet::new(),
            components: Vec::new(),
        }
    }

    /// Create an empty store with room for `reserve` components.
    pub fn with_capacity(reserve: usize) -> Self {
        Self {
            set: SparseSet::with_capacity(reserve),
            components: Vec::with_capacity(reserve),
        }
    }

    /// Reserve room for `additional` more components.
    pub fn reserve(&mut self, additional: usize) {
        self.set.reserve(additional);
        self.components.reserve(additional);
    }

    /// Attach `value` to `entity` and return a reference to the stored value.
    ///
    /// Fails with [`EcsError::DuplicateComponent`] if the entity already holds
    /// a component of this type; the existing value is left untouched.
    pub fn add(&mut self, entity: Entity, value: T) -> Result<&mut T, EcsError> {
        if self.set.has(entity) {
            return Err(EcsError::DuplicateComponent {
                entity,
                component: std::any::type_name::<T>(),
            });
        }
        self.set.insert(entity);
        self.components.push(value);
        debug_assert_eq!(self.set.len(), self.components.len());
        let last = self.components.len() - 1;
        Ok(&mut self.components[last])
    }

    /// Like [`add`](Self::add), but builds the component from a closure only
    /// once the entity is known not to hold one already.
    pub fn add_with<F>(&mut self, entity: Entity, build: F) -> Result<&mut T, EcsError>
    where
        F: FnOnce() -> T,
    {
        if self.set.has(entity) {
            return Err(EcsError::DuplicateComponent {
                entity,
                component: std::any::type_name::<T>(),
            });
        }
        self.add(entity, build())
    }

    /// The component owned by `entity`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` has no component in this store. Asking for a
    /// component an entity does not have is a logic error; use
    /// [`try_get`](Self::try_get) to probe.
    pub fn get(&self, entity: Entity) -> &T {
        match self.try_get(entity) {
            Some(component) => component,
            None => missing_component::<T>(entity),
        }
    }

    /// Mutable variant of [`get`](Self::get).
    ///
    /// # Panics
    ///
    /// Panics if `entity` has no component in this store.
    pub fn get_mut(&mut self, entity: Entity) -> &mut T {
        match self.set.find_index(entity) {
            Some(index) => &mut self.components[index],
            None => missing_component::<T>(entity),
        }
    }

    /// The component owned by `entity`, if any.
    #[inline]
    pub fn try_get(&self, entity: Entity) -> Option<&T> {
        self.set.find_index(entity).map(|i| &self.components[i])
    }

    /// Mutable variant of [`try_get`](Self::try_get).
    #[inline]
    pub fn try_get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let index = self.set.find_index(entity)?;
        Some(&mut self.components[index])
    }

    /// Detach and return `entity`'s component.
    ///
    /// The last component moves into the vacated slot, mirroring the entity
    /// swap in the underlying set. Removing from an entity without this
    /// component logs a warning and returns `None`.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let Some(index) = self.set.find_index(entity) else {
            tracing::warn!(
                entity = %entity,
                component = std::any::type_name::<T>(),
                "tried to remove a component that does not exist on entity"
            );
            return None;
        };
        self.set.swap_remove_at(index);
        let removed = self.components.swap_remove(index);
        debug_assert_eq!(self.set.len(), self.components.len());
        Some(removed)
    }

    /// Whether `entity` holds a component in this store.
    #[inline]
    pub fn has(&self, entity: Entity) -> bool {
        self.set.has(entity)
    }

    /// Dense position of `entity`'s component, if present.
    #[inline]
    pub fn find_index(&self, entity: Entity) -> Option<usize> {
        self.set.find_index(entity)
    }

    /// Drop every component and empty the entity set.
    pub fn clear(&mut self) {
        self.components.clear();
        self.set.clear();
    }

    /// Number of stored components.
    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the store is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Entities in dense order; `entities()[i]` owns `components()[i]`.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        self.set.entities()
    }

    /// Components in dense order.
    #[inline]
    pub fn components(&self) -> &[T] {
        &self.components
    }

    /// Mutable components in dense order.
    #[inline]
    pub fn components_mut(&mut self) -> &mut [T] {
        &mut self.components
    }

    /// The underlying entity set.
    pub fn sparse_set(&self) -> &SparseSet {
        &self.set
    }

    /// Iterate `(entity, &component)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.set.iter().zip(self.components.iter())
    }

    /// Iterate `(entity, &mut component)` pairs in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        self.set.iter().zip(self.components.iter_mut())
    }
}

#[cold]
#[track_caller]
fn missing_component<T>(entity: Entity) -> ! {
    let component = std::any::type_name::<T>();
    tracing::error!(entity = %entity, component, "get() on an entity without this component");
    panic!("entity {entity} has no component of type {component}");
}

// ---------------------------------------------------------------------------
// ComponentStore -- type-erased view used by the Manager
// ---------------------------------------------------------------------------

/// Conversion functions for a serializable component type.
pub(crate) struct SerdeFns<T> {
    pub to_json: fn(&T) -> Result<serde_json::Value, serde_json::Error>,
    pub from_json: fn(serde_json::Value) -> Result<T, serde_json::Error>,
}

impl<T> Clone for SerdeFns<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SerdeFns<T> {}

impl<T> SerdeFns<T>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    pub fn new() -> Self {
        Self {
            to_json: |value| serde_json::to_value(value),
            from_json: serde_json::from_value,
        }
    }
}

/// Operations the Manager needs on every store without knowing `T`.
pub(crate) trait ComponentStore {
    /// Name given at registration.
    fn name(&self) -> &str;
    /// Removal used by entity teardown. Absence is expected here and is not
    /// warned about. Returns whether a component was dropped.
    fn remove_entity(&mut self, entity: Entity) -> bool;
    fn has_entity(&self, entity: Entity) -> bool;
    fn clear(&mut self);
    fn len(&self) -> usize;
    fn is_serializable(&self) -> bool;
    /// `None` if the store has no serializer or the entity has no component.
    fn serialize_entity(&self, entity: Entity) -> Option<Result<serde_json::Value, EcsError>>;
    /// Replace or attach `entity`'s component from JSON.
    fn deserialize_entity(
        &mut self,
        entity: Entity,
        value: serde_json::Value,
    ) -> Result<(), EcsError>;
    /// Every `(entity, json)` pair, or `None` if the store is not serializable.
    fn serialize_all(&self) -> Option<Result<Vec<(Entity, serde_json::Value)>, EcsError>>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A named [`DualSparseSet`] with optional serde support.
pub(crate) struct TypedStore<T> {
    pub name: String,
    pub set: DualSparseSet<T>,
    pub serde: Option<SerdeFns<T>>,
}

impl<T> TypedStore<T> {
    pub fn new(name: &str, reserve: usize, serde: Option<SerdeFns<T>>) -> Self {
        Self {
            name: name.to_owned(),
            set: DualSparseSet::with_capacity(reserve),
            serde,
        }
    }

    fn serde_error(&self, e: serde_json::Error) -> EcsError {
        EcsError::Serialization {
            component: self.name.clone(),
            details: e.to_string(),
        }
    }
}

impl<T: 'static> ComponentStore for TypedStore<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn remove_entity(&mut self, entity: Entity) -> bool {
        if !self.set.has(entity) {
            tracing::trace!(entity = %entity, component = %self.name, "no component to tear down");
            return false;
        }
        self.set.remove(entity).is_some()
    }

    fn has_entity(&self, entity: Entity) -> bool {
        self.set.has(entity)
    }

    fn clear(&mut self) {
        self.set.clear();
    }

    fn len(&self) -> usize {
        self.set.len()
    }

    fn is_serializable(&self) -> bool {
        self.serde.is_some()
    }

    fn serialize_entity(&self, entity: Entity) -> Option<Result<serde_json::Value, EcsError>> {
        let fns = self.serde?;
        let component = self.set.try_get(entity)?;
        Some((fns.to_json)(component).map_err(|e| self.serde_error(e)))
    }

    fn deserialize_entity(
        &mut self,
        entity: Entity,
        value: serde_json::Value,
    ) -> Result<(), EcsError> {
        let Some(fns) = self.serde else {
            return Err(EcsError::NotSerializable {
                component: self.name.clone(),
            });
        };
        let component = (fns.from_json)(value).map_err(|e| self.serde_error(e))?;
        match self.set.try_get_mut(entity) {
            Some(slot) => *slot = component,
            None => {
                self.set.add(entity, component)?;
            }
        }
        Ok(())
    }

    fn serialize_all(&self) -> Option<Result<Vec<(Entity, serde_json::Value)>, EcsError>> {
        let fns = self.serde?;
        let result = self
            .set
            .iter()
            .map(|(entity, component)| {
                (fns.to_json)(component)
                    .map(|json| (entity, json))
                    .map_err(|e| self.serde_error(e))
            })
            .collect();
        Some(result)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
