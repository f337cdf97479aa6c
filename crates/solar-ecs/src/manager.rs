//! The [`Manager`] is the root of an ECS simulation. It allocates entities,
//! owns one [`DualSparseSet`] per registered component type, and drives the
//! registered [`System`]s.

use std::any::TypeId;
use std::collections::HashMap;

use crate::dual_sparse_set::{ComponentStore, DualSparseSet, SerdeFns, TypedStore};
use crate::entity::Entity;
use crate::sparse_set::SparseSet;
use crate::system::{DeltaTime, Event, System};
use crate::EcsError;

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Entity lifecycle authority and dispatch root for component stores and
/// systems.
///
/// Entity ids come from a counter that only increases, so a destroyed id is
/// never handed out again until [`clear`](Self::clear) resets the counter.
///
/// The Manager is single-threaded. Systems run synchronously, in
/// registration order, on the caller's thread.
pub struct Manager {
    /// Next sequence number to hand out.
    pub(crate) next_sequence: u64,
    /// Live entities.
    pub(crate) entities: SparseSet,
    /// One store per component type, in registration order.
    pub(crate) stores: Vec<Box<dyn ComponentStore>>,
    /// Rust type -> position in `stores`.
    store_index: HashMap<TypeId, usize>,
    /// Registered name -> position in `stores`.
    pub(crate) name_index: HashMap<String, usize>,
    /// Systems in dispatch order.
    systems: Vec<Box<dyn System>>,
    /// Initial capacity handed to new stores.
    reserve: usize,
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("next_sequence", &self.next_sequence)
            .field("entity_count", &self.entities.len())
            .field("component_types", &self.component_names())
            .field("system_count", &self.systems.len())
            .finish()
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl Manager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty manager that reserves room for `reserve` entities in
    /// its entity set and in every component store registered later.
    pub fn with_capacity(reserve: usize) -> Self {
        Self {
            next_sequence: 0,
            entities: SparseSet::with_capacity(reserve),
            stores: Vec::new(),
            store_index: HashMap::new(),
            name_index: HashMap::new(),
            systems: Vec::new(),
            reserve,
        }
    }

    /// Reserve room for `additional` more entities in the entity set, and use
    /// the same figure as the initial capacity of stores registered later.
    pub fn reserve(&mut self, additional: usize) {
        self.entities.reserve(additional);
        self.reserve = self.reserve.max(additional);
    }

    // -- entity lifecycle ---------------------------------------------------

    /// Allocate a new live entity.
    pub fn create(&mut self) -> Entity {
        let entity = Entity::from_sequence(self.next_sequence);
        self.next_sequence += 1;
        let inserted = self.entities.insert(entity);
        debug_assert!(inserted, "sequence {} was already live", entity.sequence());
        tracing::trace!(entity = %entity, "created entity");
        entity
    }

    /// Whether `entity` is live.
    pub fn has(&self, entity: Entity) -> bool {
        self.entities.has(entity)
    }

    /// Whether `entity` carries the valid tag. Says nothing about liveness;
    /// use [`has`](Self::has) for that.
    pub fn validate(entity: Entity) -> bool {
        entity.is_tagged()
    }

    /// Check that `entity` is structurally valid and live.
    pub fn check(&self, entity: Entity) -> Result<(), EcsError> {
        if !Self::validate(entity) {
            return Err(EcsError::InvalidEntity {
                raw: entity.to_raw(),
            });
        }
        if !self.has(entity) {
            return Err(EcsError::DeadEntity { entity });
        }
        Ok(())
    }

    /// Destroy `entity` and drop every component it holds.
    ///
    /// Destroying an entity that is not live logs a single warning from the
    /// entity set and returns without visiting the component stores: a dead
    /// entity holds no components, so there is nothing for them to drop.
    /// Calling this twice is harmless.
    pub fn destroy(&mut self, entity: Entity) {
        if !self.entities.remove(entity) {
            return;
        }
        let mut dropped = 0usize;
        for store in &mut self.stores {
            if store.remove_entity(entity) {
                dropped += 1;
            }
        }
        tracing::trace!(entity = %entity, components = dropped, "destroyed entity");
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live entities, in no meaningful order.
    pub fn entities(&self) -> &[Entity] {
        self.entities.entities()
    }

    /// Call `f` for every live entity.
    pub fn each<F: FnMut(Entity)>(&self, mut f: F) {
        for entity in self.entities.iter() {
            f(entity);
        }
    }

    // -- component registration ---------------------------------------------

    /// Register component type `T` under `name`.
    ///
    /// Returns `false` if `T` was already registered (the existing store and
    /// name are kept).
    ///
    /// # Panics
    ///
    /// Panics if `name` is already used by a different type.
    pub fn register<T: 'static>(&mut self, name: &str) -> bool {
        self.register_store::<T>(name, None)
    }

    /// Register component type `T` under `name`, with JSON support for
    /// [`serialize_component`](Self::serialize_component) and snapshots.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already used by a different type.
    pub fn register_serializable<T>(&mut self, name: &str) -> bool
    where
        T: serde::Serialize + serde::de::DeserializeOwned + 'static,
    {
        self.register_store::<T>(name, Some(SerdeFns::new()))
    }

    fn register_store<T: 'static>(&mut self, name: &str, serde: Option<SerdeFns<T>>) -> bool {
        let type_id = TypeId::of::<T>();
        if self.store_index.contains_key(&type_id) {
            return false;
        }
        assert!(
            !self.name_index.contains_key(name),
            "component name '{name}' is already registered for a different type"
        );
        let index = self.stores.len();
        self.stores
            .push(Box::new(TypedStore::<T>::new(name, self.reserve, serde)));
        self.store_index.insert(type_id, index);
        self.name_index.insert(name.to_owned(), index);
        tracing::debug!(
            component = name,
            rust_type = std::any::type_name::<T>(),
            "registered component type"
        );
        true
    }

    /// Whether `T` has been registered.
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.store_index.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered component types.
    pub fn component_type_count(&self) -> usize {
        self.stores.len()
    }

    /// Registered component names, in registration order.
    pub fn component_names(&self) -> Vec<&str> {
        self.stores.iter().map(|s| s.name()).collect()
    }

    // -- store access -------------------------------------------------------

    fn typed<T: 'static>(&self) -> Option<&TypedStore<T>> {
        let index = *self.store_index.get(&TypeId::of::<T>())?;
        self.stores[index].as_any().downcast_ref::<TypedStore<T>>()
    }

    fn typed_mut<T: 'static>(&mut self) -> Option<&mut TypedStore<T>> {
        let index = *self.store_index.get(&TypeId::of::<T>())?;
        self.stores[index]
            .as_any_mut()
            .downcast_mut::<TypedStore<T>>()
    }

    /// The store for `T`, if registered.
    pub fn store<T: 'static>(&self) -> Option<&DualSparseSet<T>> {
        self.typed::<T>().map(|s| &s.set)
    }

    /// Mutable store for `T`, if registered.
    pub fn store_mut<T: 'static>(&mut self) -> Option<&mut DualSparseSet<T>> {
        self.typed_mut::<T>().map(|s| &mut s.set)
    }

    fn store_or_panic<T: 'static>(&self) -> &DualSparseSet<T> {
        match self.store::<T>() {
            Some(store) => store,
            None => unregistered::<T>(),
        }
    }

    // -- component access ---------------------------------------------------

    /// Attach `value` to `entity`.
    ///
    /// Fails if the entity is invalid or dead, if `T` is not registered, or if
    /// the entity already holds a `T`.
    pub fn add<T: 'static>(&mut self, entity: Entity, value: T) -> Result<&mut T, EcsError> {
        self.check(entity)?;
        let store = self
            .store_mut::<T>()
            .ok_or_else(|| EcsError::unknown::<T>())?;
        store.add(entity, value)
    }

    /// Attach a component built by `build` to `entity`. `build` only runs if
    /// the attach can succeed.
    pub fn add_with<T: 'static, F>(&mut self, entity: Entity, build: F) -> Result<&mut T, EcsError>
    where
        F: FnOnce() -> T,
    {
        self.check(entity)?;
        let store = self
            .store_mut::<T>()
            .ok_or_else(|| EcsError::unknown::<T>())?;
        store.add_with(entity, build)
    }

    /// `entity`'s `T` component.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not registered or `entity` holds no `T`.
    pub fn get<T: 'static>(&self, entity: Entity) -> &T {
        self.store_or_panic::<T>().get(entity)
    }

    /// Mutable variant of [`get`](Self::get).
    ///
    /// # Panics
    ///
    /// Panics if `T` is not registered or `entity` holds no `T`.
    pub fn get_mut<T: 'static>(&mut self, entity: Entity) -> &mut T {
        match self.store_mut::<T>() {
            Some(store) => store.get_mut(entity),
            None => unregistered::<T>(),
        }
    }

    /// `entity`'s `T` component, if both exist.
    pub fn try_get<T: 'static>(&self, entity: Entity) -> Option<&T> {
        self.store::<T>()?.try_get(entity)
    }

    /// Mutable variant of [`try_get`](Self::try_get).
    pub fn try_get_mut<T: 'static>(&mut self, entity: Entity) -> Option<&mut T> {
        self.store_mut::<T>()?.try_get_mut(entity)
    }

    /// Whether `entity` holds a `T`.
    pub fn has_component<T: 'static>(&self, entity: Entity) -> bool {
        self.store::<T>().is_some_and(|s| s.has(entity))
    }

    /// Detach and return `entity`'s `T`. Missing component or unregistered
    /// type logs a warning and returns `None`.
    pub fn remove<T: 'static>(&mut self, entity: Entity) -> Option<T> {
        match self.store_mut::<T>() {
            Some(store) => store.remove(entity),
            None => {
                tracing::warn!(
                    entity = %entity,
                    component = std::any::type_name::<T>(),
                    "tried to remove a component type that is not registered"
                );
                None
            }
        }
    }

    // -- multi-component iteration ------------------------------------------

    /// Call `f` for every entity holding an `A`, in `A`'s dense order.
    ///
    /// Does nothing if `A` is not registered.
    pub fn operate<A, F>(&mut self, mut f: F)
    where
        A: 'static,
        F: FnMut(Entity, &mut A),
    {
        let Some(a) = self.store_mut::<A>() else {
            tracing::debug!(component = std::any::type_name::<A>(), "operate on unregistered type");
            return;
        };
        for (entity, ca) in a.iter_mut() {
            f(entity, ca);
        }
    }

    /// Call `f` for every entity holding both an `A` and a `B`. Iteration is
    /// driven by `A`'s dense array.
    ///
    /// # Panics
    ///
    /// Panics if `A` and `B` are the same type.
    pub fn operate2<A, B, F>(&mut self, mut f: F)
    where
        A: 'static,
        B: 'static,
        F: FnMut(Entity, &mut A, &mut B),
    {
        let [Some(sa), Some(sb)] = self.disjoint_stores_mut([TypeId::of::<A>(), TypeId::of::<B>()])
        else {
            tracing::debug!("operate2 on unregistered component type");
            return;
        };
        let (Some(a), Some(b)) = (downcast_set::<A>(sa), downcast_set::<B>(sb)) else {
            return;
        };
        for (entity, ca) in a.iter_mut() {
            if let Some(cb) = b.try_get_mut(entity) {
                f(entity, ca, cb);
            }
        }
    }

    /// Call `f` for every entity holding an `A`, a `B` and a `C`. Iteration is
    /// driven by `A`'s dense array.
    ///
    /// # Panics
    ///
    /// Panics if any two of `A`, `B`, `C` are the same type.
    pub fn operate3<A, B, C, F>(&mut self, mut f: F)
    where
        A: 'static,
        B: 'static,
        C: 'static,
        F: FnMut(Entity, &mut A, &mut B, &mut C),
    {
        let [Some(sa), Some(sb), Some(sc)] = self.disjoint_stores_mut([
            TypeId::of::<A>(),
            TypeId::of::<B>(),
            TypeId::of::<C>(),
        ]) else {
            tracing::debug!("operate3 on unregistered component type");
            return;
        };
        let (Some(a), Some(b), Some(c)) = (
            downcast_set::<A>(sa),
            downcast_set::<B>(sb),
            downcast_set::<C>(sc),
        ) else {
            return;
        };
        for (entity, ca) in a.iter_mut() {
            if let (Some(cb), Some(cc)) = (b.try_get_mut(entity), c.try_get_mut(entity)) {
                f(entity, ca, cb, cc);
            }
        }
    }

    /// Borrow the stores for `N` distinct types mutably at once. Slots for
    /// unregistered types are `None`.
    fn disjoint_stores_mut<const N: usize>(
        &mut self,
        types: [TypeId; N],
    ) -> [Option<&mut Box<dyn ComponentStore>>; N] {
        for i in 0..N {
            for j in (i + 1)..N {
                assert!(
                    types[i] != types[j],
                    "operate requires distinct component types"
                );
            }
        }
        let wanted: [Option<usize>; N] = types.map(|t| self.store_index.get(&t).copied());

        let mut picked: [Option<&mut Box<dyn ComponentStore>>; N] = std::array::from_fn(|_| None);
        for (index, store) in self.stores.iter_mut().enumerate() {
            if let Some(pos) = wanted.iter().position(|&w| w == Some(index)) {
                picked[pos] = Some(store);
            }
        }
        picked
    }

    // -- systems ------------------------------------------------------------

    /// Append a system. Systems run in the order they were added.
    pub fn add_system(&mut self, system: Box<dyn System>) {
        tracing::debug!(system = system.name(), "registered system");
        self.systems.push(system);
    }

    /// Number of registered systems.
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Names of registered systems, in dispatch order.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    /// Forward `event` to every system in registration order.
    pub fn event(&mut self, event: &Event) {
        for system in &mut self.systems {
            system.event(event);
        }
    }

    /// Run every system's update in registration order.
    ///
    /// Systems are moved out of the Manager for the duration of the call so
    /// each one can receive `&mut Manager`. Systems added during the update
    /// are appended after the existing ones and first run on the next call.
    pub fn update(&mut self, dt: DeltaTime) {
        let mut systems = std::mem::take(&mut self.systems);
        for system in &mut systems {
            system.update(dt, self);
        }
        let added = std::mem::replace(&mut self.systems, systems);
        self.systems.extend(added);
    }

    // -- reset --------------------------------------------------------------

    /// Reset everything: the id counter, live entities, all component stores
    /// (including their registrations) and all systems.
    pub fn clear(&mut self) {
        tracing::debug!(
            entities = self.entities.len(),
            stores = self.stores.len(),
            systems = self.systems.len(),
            "clearing manager"
        );
        self.next_sequence = 0;
        self.entities.clear();
        for store in &mut self.stores {
            store.clear();
        }
        self.stores.clear();
        self.store_index.clear();
        self.name_index.clear();
        self.systems.clear();
    }
}

fn downcast_set<T: 'static>(store: &mut Box<dyn ComponentStore>) -> Option<&mut DualSparseSet<T>> {
    store
        .as_any_mut()
        .downcast_mut::<TypedStore<T>>()
        .map(|s| &mut s.set)
}

#[cold]
#[track_caller]
fn unregistered<T>() -> ! {
    let component = std::any::type_name::<T>();
    tracing::error!(component, "component type is not registered");
    panic!("component type {component} is not registered with the manager");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Position {
        x: f64,
        y: f64,
    }

    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Velocity {
        dx: f64,
        dy: f64,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Health(u32);

    fn setup() -> Manager {
        let mut manager = Manager::new();
        manager.register_serializable::<Position>("position");
        manager.register_serializable::<Velocity>("velocity");
        manager.register::<Health>("health");
        manager
    }

    // -- entities -----------------------------------------------------------

    #[test]
    fn create_is_monotonic_and_live() {
        let mut m = Manager::new();
        let a = m.create();
        let b = m.create();
        assert!(b.sequence() > a.sequence());
        assert!(m.has(a) && m.has(b));
        assert!(Manager::validate(a));
        assert_eq!(m.entity_count(), 2);
    }

    #[test]
    fn destroyed_ids_are_not_reissued() {
        let mut m = Manager::new();
        let a = m.create();
        m.destroy(a);
        let b = m.create();
        assert_ne!(a, b);
        assert!(!m.has(a));
    }

    #[test]
    fn validate_rejects_untagged_values() {
        let mut m = Manager::new();
        let real = m.create();
        let forged = Entity::from_raw(real.sequence() << crate::entity::TAG_BITS);
        assert!(!Manager::validate(forged));
        assert!(!m.has(forged));
        assert!(matches!(
            m.check(forged),
            Err(EcsError::InvalidEntity { .. })
        ));
    }

    #[test]
    fn destroy_drops_components_from_every_store() {
        let mut m = setup();
        let e = m.create();
        m.add(e, Position { x: 1.0, y: 2.0 }).unwrap();
        m.add(e, Health(10)).unwrap();
        m.destroy(e);
        assert!(!m.has_component::<Position>(e));
        assert!(!m.has_component::<Health>(e));
        assert_eq!(m.store::<Position>().unwrap().len(), 0);
    }

    #[test]
    fn double_destroy_is_harmless() {
        let mut m = setup();
        let e = m.create();
        m.add(e, Health(1)).unwrap();
        m.destroy(e);
        m.destroy(e);
        assert_eq!(m.entity_count(), 0);
    }

    // -- components ---------------------------------------------------------

    #[test]
    fn add_and_get() {
        let mut m = setup();
        let e = m.create();
        m.add(e, Position { x: 3.0, y: 4.0 }).unwrap();
        assert_eq!(m.get::<Position>(e), &Position { x: 3.0, y: 4.0 });
        m.get_mut::<Position>(e).x = 9.0;
        assert_eq!(m.try_get::<Position>(e).map(|p| p.x), Some(9.0));
    }

    #[test]
    fn add_to_dead_entity_fails() {
        let mut m = setup();
        let e = m.create();
        m.destroy(e);
        let err = m.add(e, Health(1)).unwrap_err();
        assert!(matches!(err, EcsError::DeadEntity { .. }));
    }

    #[test]
    fn add_unregistered_type_fails() {
        let mut m = Manager::new();
        let e = m.create();
        let err = m.add(e, Health(1)).unwrap_err();
        assert!(matches!(err, EcsError::UnknownComponent { .. }));
    }

    #[test]
    fn add_twice_is_rejected() {
        let mut m = setup();
        let e = m.create();
        m.add(e, Health(1)).unwrap();
        assert!(matches!(
            m.add(e, Health(2)),
            Err(EcsError::DuplicateComponent { .. })
        ));
        assert_eq!(m.get::<Health>(e), &Health(1));
    }

    #[test]
    #[should_panic(expected = "has no component")]
    fn get_missing_component_panics() {
        let mut m = setup();
        let e = m.create();
        let _ = m.get::<Health>(e);
    }

    #[test]
    #[should_panic(expected = "not registered")]
    fn get_unregistered_type_panics() {
        let mut m = Manager::new();
        let e = m.create();
        let _ = m.get::<Health>(e);
    }

    #[test]
    fn remove_missing_is_none() {
        let mut m = setup();
        let e = m.create();
        assert_eq!(m.remove::<Health>(e), None);
        assert_eq!(m.remove::<String>(e), None);
    }

    #[test]
    fn register_twice_keeps_first() {
        let mut m = Manager::new();
        assert!(m.register::<Health>("health"));
        assert!(!m.register::<Health>("hp"));
        assert_eq!(m.component_names(), vec!["health"]);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn register_name_clash_panics() {
        let mut m = Manager::new();
        m.register::<Health>("thing");
        m.register::<Position>("thing");
    }

    // -- operate ------------------------------------------------------------

    #[test]
    fn operate2_visits_only_entities_with_both() {
        let mut m = setup();
        let moving = m.create();
        let still = m.create();
        m.add(moving, Position { x: 0.0, y: 0.0 }).unwrap();
        m.add(moving, Velocity { dx: 1.0, dy: 2.0 }).unwrap();
        m.add(still, Position { x: 5.0, y: 5.0 }).unwrap();

        let mut visited = Vec::new();
        m.operate2::<Position, Velocity, _>(|e, pos, vel| {
            pos.x += vel.dx;
            pos.y += vel.dy;
            visited.push(e);
        });

        assert_eq!(visited, vec![moving]);
        assert_eq!(m.get::<Position>(moving), &Position { x: 1.0, y: 2.0 });
        assert_eq!(m.get::<Position>(still), &Position { x: 5.0, y: 5.0 });
    }

    #[test]
    fn operate3_requires_all_three() {
        let mut m = setup();
        let full = m.create();
        let partial = m.create();
        m.add(full, Position { x: 0.0, y: 0.0 }).unwrap();
        m.add(full, Velocity { dx: 0.0, dy: 0.0 }).unwrap();
        m.add(full, Health(3)).unwrap();
        m.add(partial, Position { x: 0.0, y: 0.0 }).unwrap();
        m.add(partial, Health(3)).unwrap();

        let mut count = 0;
        m.operate3::<Health, Position, Velocity, _>(|_, hp, _, _| {
            hp.0 -= 1;
            count += 1;
        });
        assert_eq!(count, 1);
        assert_eq!(m.get::<Health>(full), &Health(2));
        assert_eq!(m.get::<Health>(partial), &Health(3));
    }

    #[test]
    #[should_panic(expected = "distinct component types")]
    fn operate2_same_type_panics() {
        let mut m = setup();
        m.operate2::<Health, Health, _>(|_, _, _| {});
    }

    #[test]
    fn operate_unregistered_is_noop() {
        let mut m = Manager::new();
        let mut called = false;
        m.operate::<Health, _>(|_, _| called = true);
        m.operate2::<Health, Position, _>(|_, _, _| called = true);
        assert!(!called);
    }

    #[test]
    fn each_visits_live_entities() {
        let mut m = Manager::new();
        let a = m.create();
        let b = m.create();
        let c = m.create();
        m.destroy(b);
        let mut seen = Vec::new();
        m.each(|e| seen.push(e));
        seen.sort();
        assert_eq!(seen, vec![a, c]);
    }

    // -- systems ------------------------------------------------------------

    struct Recorder {
        label: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl System for Recorder {
        fn name(&self) -> &str {
            self.label
        }

        fn event(&mut self, event: &Event) {
            self.log
                .borrow_mut()
                .push(format!("{}:event:{}", self.label, event.name));
        }

        fn update(&mut self, dt: DeltaTime, manager: &mut Manager) {
            self.log.borrow_mut().push(format!(
                "{}:update:{dt}:{}",
                self.label,
                manager.entity_count()
            ));
        }
    }

    #[test]
    fn systems_dispatch_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut m = Manager::new();
        m.create();
        m.add_system(Box::new(Recorder { label: "a", log: Rc::clone(&log) }));
        m.add_system(Box::new(Recorder { label: "b", log: Rc::clone(&log) }));

        m.event(&Event::new("ping"));
        m.update(0.5);

        assert_eq!(
            *log.borrow(),
            vec!["a:event:ping", "b:event:ping", "a:update:0.5:1", "b:update:0.5:1"]
        );
        assert_eq!(m.system_names(), vec!["a", "b"]);
    }

    struct Spawner;

    impl System for Spawner {
        fn event(&mut self, _event: &Event) {}

        fn update(&mut self, _dt: DeltaTime, manager: &mut Manager) {
            let e = manager.create();
            manager.add(e, Health(1)).unwrap();
        }
    }

    struct Adder {
        added: bool,
    }

    impl System for Adder {
        fn event(&mut self, _event: &Event) {}

        fn update(&mut self, _dt: DeltaTime, manager: &mut Manager) {
            if !self.added {
                manager.add_system(Box::new(Spawner));
                self.added = true;
            }
        }
    }

    #[test]
    fn systems_mutate_components_through_manager() {
        let mut m = setup();
        m.add_system(Box::new(Spawner));
        m.update(1.0);
        m.update(1.0);
        assert_eq!(m.store::<Health>().unwrap().len(), 2);
    }

    #[test]
    fn system_added_during_update_runs_next_time() {
        let mut m = setup();
        m.add_system(Box::new(Adder { added: false }));
        m.update(1.0);
        assert_eq!(m.system_count(), 2);
        assert_eq!(m.entity_count(), 0);
        m.update(1.0);
        assert_eq!(m.entity_count(), 1);
    }

    // -- clear --------------------------------------------------------------

    #[test]
    fn clear_resets_everything() {
        let mut m = setup();
        let e = m.create();
        m.add(e, Health(1)).unwrap();
        m.add_system(Box::new(Spawner));

        m.clear();

        assert_eq!(m.entity_count(), 0);
        assert_eq!(m.component_type_count(), 0);
        assert_eq!(m.system_count(), 0);
        assert!(!m.is_registered::<Health>());
        assert_eq!(m.create().sequence(), 0);
    }
}
