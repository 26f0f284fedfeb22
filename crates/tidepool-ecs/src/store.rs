//! Typed component stores and the type-erased store registry.
//!
//! Each registered component type gets its own [`ComponentStore<T>`], a sparse
//! ordered map from [`EntityId`] to one value of `T`. The [`StoreRegistry`]
//! owns every store behind a type-erased [`AnyStore`] handle keyed by the Rust
//! `TypeId`, which is what lets entity destruction cascade across all stores
//! without knowing their concrete types.
//!
//! Registration must happen before any component of that type is added; a
//! forgotten registration is a startup bug and the registry fails loudly on
//! it. Everything else on the read/remove path is total: asking a store about
//! an entity it has never seen is ordinary absence.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};

use crate::entity::EntityId;

// ---------------------------------------------------------------------------
// ComponentStore
// ---------------------------------------------------------------------------

/// A sparse table mapping entities to values of one component type.
///
/// The store exclusively owns each value once set; callers mutate through the
/// reference returned by [`get_mut`](Self::get_mut) rather than re-inserting.
/// Iteration runs in ascending entity order, so a full pass over a store is
/// reproducible across runs. Lookups are O(log n).
///
/// The store itself has no notion of entity liveness; the World enforces the
/// live-entity discipline and drives the destruction cascade.
#[derive(Debug, Clone)]
pub struct ComponentStore<T> {
    entries: BTreeMap<EntityId, T>,
}

impl<T> ComponentStore<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Insert or overwrite the component for `entity`.
    ///
    /// Returns the previous value if one was replaced.
    pub fn insert(&mut self, entity: EntityId, value: T) -> Option<T> {
        self.entries.insert(entity, value)
    }

    /// The component for `entity`, if present.
    pub fn get(&self, entity: EntityId) -> Option<&T> {
        self.entries.get(&entity)
    }

    /// Mutable access to the component for `entity`, if present.
    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        self.entries.get_mut(&entity)
    }

    /// Remove and return the component for `entity`. Absent is a no-op.
    pub fn remove(&mut self, entity: EntityId) -> Option<T> {
        self.entries.remove(&entity)
    }

    /// Whether `entity` has a component in this store.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entries.contains_key(&entity)
    }

    /// Number of entities with a component in this store.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no components.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(entity, component)` pairs in ascending entity order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        self.entries.iter().map(|(id, value)| (*id, value))
    }

    /// Iterate `(entity, &mut component)` pairs in ascending entity order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> + '_ {
        self.entries.iter_mut().map(|(id, value)| (*id, value))
    }

    /// Iterate the entities present in this store, ascending.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entries.keys().copied()
    }

    /// Remove every component from the store.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// AnyStore
// ---------------------------------------------------------------------------

/// Type-erased handle to a [`ComponentStore<T>`].
///
/// This is the seam the destruction cascade runs through: the registry can
/// remove one entity from every store without knowing any concrete component
/// type.
pub trait AnyStore: Send + Sync {
    /// Remove `entity`'s component from this store, if present.
    fn remove_entity(&mut self, entity: EntityId) -> bool;

    /// Remove every component from this store.
    fn clear(&mut self);

    /// Number of entities with a component in this store.
    fn len(&self) -> usize;

    /// The component type's name, for diagnostics.
    fn type_name(&self) -> &'static str;

    /// Downcast support.
    fn as_any(&self) -> &dyn Any;

    /// Downcast support.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Send + Sync + 'static> AnyStore for ComponentStore<T> {
    fn remove_entity(&mut self, entity: EntityId) -> bool {
        self.remove(entity).is_some()
    }

    fn clear(&mut self) {
        ComponentStore::clear(self);
    }

    fn len(&self) -> usize {
        ComponentStore::len(self)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// StoreRegistry
// ---------------------------------------------------------------------------

/// Registry of every component store, keyed by the component's Rust type.
///
/// Registration is a construction-time concern: register every component type
/// the simulation uses before the first tick. Registering the same type twice
/// is last-wins (the old store and all its data are dropped) and logs a
/// warning; it is discouraged rather than rejected so world-building code can
/// stay panic-free.
pub struct StoreRegistry {
    stores: HashMap<TypeId, Box<dyn AnyStore>>,
}

impl StoreRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            stores: HashMap::new(),
        }
    }

    /// Register a store for component type `T`.
    pub fn register<T: Send + Sync + 'static>(&mut self) {
        let previous = self
            .stores
            .insert(TypeId::of::<T>(), Box::new(ComponentStore::<T>::new()));
        if previous.is_some() {
            tracing::warn!(
                "store for `{}` registered again -- replacing it and dropping its contents",
                std::any::type_name::<T>()
            );
        }
    }

    /// Whether a store for `T` has been registered.
    pub fn is_registered<T: Send + Sync + 'static>(&self) -> bool {
        self.stores.contains_key(&TypeId::of::<T>())
    }

    /// The store for `T`, if registered.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&ComponentStore<T>> {
        self.stores
            .get(&TypeId::of::<T>())
            .and_then(|store| store.as_any().downcast_ref())
    }

    /// Mutable access to the store for `T`, if registered.
    pub fn get_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut ComponentStore<T>> {
        self.stores
            .get_mut(&TypeId::of::<T>())
            .and_then(|store| store.as_any_mut().downcast_mut())
    }

    /// The store for `T`, panicking if it was never registered.
    ///
    /// # Panics
    ///
    /// Panics with the list of registered types if `T` has no store. This is
    /// the loud failure for a forgotten registration; it must surface at
    /// startup rather than silently dropping component data.
    pub fn expect_mut<T: Send + Sync + 'static>(&mut self) -> &mut ComponentStore<T> {
        if !self.is_registered::<T>() {
            panic!(
                "component type `{}` is not registered (registered: [{}]). \
                 Did you forget to call register_store?",
                std::any::type_name::<T>(),
                self.registered_names().join(", ")
            );
        }
        match self.get_mut::<T>() {
            Some(store) => store,
            // The registry is keyed by TypeId, so the downcast after a
            // successful registration check cannot fail.
            None => unreachable!("store lookup after successful registration check"),
        }
    }

    /// Remove `entity`'s components from every registered store.
    pub fn remove_entity_from_all(&mut self, entity: EntityId) {
        for store in self.stores.values_mut() {
            store.remove_entity(entity);
        }
    }

    /// Empty every registered store, keeping the registrations themselves.
    pub fn clear_all(&mut self) {
        for store in self.stores.values_mut() {
            store.clear();
        }
    }

    /// Number of registered component types.
    pub fn store_count(&self) -> usize {
        self.stores.len()
    }

    /// Names of all registered component types, sorted.
    pub fn registered_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> =
            self.stores.values().map(|store| store.type_name()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityRegistry;

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f64,
        y: f64,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Energy {
        current: i32,
        max: i32,
    }

    fn two_entities() -> (EntityId, EntityId) {
        let mut reg = EntityRegistry::new();
        (reg.allocate(), reg.allocate())
    }

    #[test]
    fn insert_get_mutate_remove() {
        let (a, _) = two_entities();
        let mut store = ComponentStore::new();

        assert!(store.insert(a, Energy { current: 100, max: 100 }).is_none());
        assert_eq!(store.get(a), Some(&Energy { current: 100, max: 100 }));

        if let Some(energy) = store.get_mut(a) {
            energy.current -= 30;
        }
        assert_eq!(store.get(a).map(|e| e.current), Some(70));

        assert_eq!(store.remove(a), Some(Energy { current: 70, max: 100 }));
        assert_eq!(store.remove(a), None);
        assert!(store.is_empty());
    }

    #[test]
    fn insert_overwrites_and_returns_previous() {
        let (a, _) = two_entities();
        let mut store = ComponentStore::new();
        store.insert(a, Position { x: 1.0, y: 2.0 });
        let old = store.insert(a, Position { x: 3.0, y: 4.0 });
        assert_eq!(old, Some(Position { x: 1.0, y: 2.0 }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn iteration_is_in_entity_order() {
        let mut reg = EntityRegistry::new();
        let ids: Vec<EntityId> = (0..5).map(|_| reg.allocate()).collect();
        let mut store = ComponentStore::new();
        // Insert out of order.
        for &id in ids.iter().rev() {
            store.insert(id, Position { x: 0.0, y: 0.0 });
        }
        let seen: Vec<EntityId> = store.entities().collect();
        assert_eq!(seen, ids);
    }

    #[test]
    fn registry_register_and_typed_access() {
        let (a, _) = two_entities();
        let mut registry = StoreRegistry::new();
        registry.register::<Position>();
        registry.register::<Energy>();
        assert_eq!(registry.store_count(), 2);

        registry
            .expect_mut::<Position>()
            .insert(a, Position { x: 5.0, y: 6.0 });

        let store = registry.get::<Position>().expect("registered");
        assert_eq!(store.get(a), Some(&Position { x: 5.0, y: 6.0 }));
        assert!(registry.get::<u32>().is_none());
    }

    #[test]
    #[should_panic(expected = "is not registered")]
    fn expect_mut_panics_for_unregistered_type() {
        let mut registry = StoreRegistry::new();
        registry.register::<Position>();
        registry.expect_mut::<Energy>();
    }

    #[test]
    fn cascade_removes_from_every_store() {
        let (a, b) = two_entities();
        let mut registry = StoreRegistry::new();
        registry.register::<Position>();
        registry.register::<Energy>();

        registry
            .expect_mut::<Position>()
            .insert(a, Position { x: 0.0, y: 0.0 });
        registry
            .expect_mut::<Energy>()
            .insert(a, Energy { current: 10, max: 10 });
        registry
            .expect_mut::<Position>()
            .insert(b, Position { x: 1.0, y: 1.0 });

        registry.remove_entity_from_all(a);

        assert!(registry.get::<Position>().is_some_and(|s| !s.contains(a)));
        assert!(registry.get::<Energy>().is_some_and(|s| !s.contains(a)));
        assert!(registry.get::<Position>().is_some_and(|s| s.contains(b)));
    }

    #[test]
    fn reregistration_drops_old_contents() {
        let (a, _) = two_entities();
        let mut registry = StoreRegistry::new();
        registry.register::<Energy>();
        registry
            .expect_mut::<Energy>()
            .insert(a, Energy { current: 1, max: 1 });

        registry.register::<Energy>();
        assert!(registry.get::<Energy>().is_some_and(|s| s.is_empty()));
    }

    #[test]
    fn registered_names_are_sorted() {
        let mut registry = StoreRegistry::new();
        registry.register::<Energy>();
        registry.register::<Position>();
        let names = registry.registered_names();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), 2);
    }
}
