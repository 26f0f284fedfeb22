//! The world: entities, components, tags, and resources behind one facade.
//!
//! Systems receive `&mut World` and nothing else; every read and write of
//! simulation state goes through here. The facade keeps the four underlying
//! structures consistent: destroying an entity cascades through every store
//! and the tag index in the same call, so a dead id can never be observed
//! with leftover state.
//!
//! Mutation during iteration is handled by snapshotting: queries and
//! [`World::entities_with_tag`] return owned `Vec`s of ids, safe to walk
//! while spawning and despawning. An id in a snapshot may have died since it
//! was taken, which is why the read operations treat absence as an answer
//! rather than an error.

use std::any::type_name;

use crate::entity::{EntityId, EntityRegistry};
use crate::query::ComponentSet;
use crate::resource::ResourceTable;
use crate::store::StoreRegistry;
use crate::tag::TagIndex;

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// All simulation state. Single-threaded by design: systems run one at a
/// time and take `&mut World`, so no interior locking is needed anywhere.
#[derive(Default)]
pub struct World {
    entities: EntityRegistry,
    stores: StoreRegistry,
    tags: TagIndex,
    resources: ResourceTable,
}

impl World {
    /// Create an empty world with no registered component types.
    pub fn new() -> Self {
        Self::default()
    }

    // -- entities -----------------------------------------------------------

    /// Create a new entity and return its id. Ids ascend monotonically and
    /// are never reused, so a stale id held across destruction can never
    /// alias a newer entity.
    pub fn spawn(&mut self) -> EntityId {
        self.entities.allocate()
    }

    /// Destroy `entity`, removing its components from every store and its
    /// tags from the index. Returns `false` (and does nothing) if the entity
    /// is already dead, so destruction is safe to request twice.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        if !self.entities.release(entity) {
            return false;
        }
        self.stores.remove_entity_from_all(entity);
        self.tags.remove_entity(entity);
        true
    }

    /// Whether `entity` is currently alive.
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.contains(entity)
    }

    /// Iterate every live entity in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter()
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // -- components ---------------------------------------------------------

    /// Register a store for component type `T`. Must be called before any
    /// `T` is added to an entity.
    ///
    /// Registering the same type again replaces the store and drops every
    /// component in it (a warning is logged); do this only during setup.
    pub fn register_store<T: Send + Sync + 'static>(&mut self) {
        self.stores.register::<T>();
    }

    /// Whether a store for `T` has been registered.
    pub fn store_registered<T: Send + Sync + 'static>(&self) -> bool {
        self.stores.is_registered::<T>()
    }

    /// Attach `component` to `entity`, replacing and returning any existing
    /// `T` on it. Adding to a dead entity is a no-op returning `None`: the
    /// caller may be holding an id that was destroyed earlier this tick.
    ///
    /// # Panics
    ///
    /// Panics if no store for `T` is registered. A typo'd or forgotten
    /// registration is a structural bug, and it panics even when the entity
    /// is dead so the bug cannot hide behind timing.
    pub fn add_component<T: Send + Sync + 'static>(
        &mut self,
        entity: EntityId,
        component: T,
    ) -> Option<T> {
        let store = self.stores.expect_mut::<T>();
        if !self.entities.contains(entity) {
            return None;
        }
        store.insert(entity, component)
    }

    /// Shared access to `entity`'s `T`, or `None` if the entity is dead, the
    /// component is absent, or the type was never registered.
    pub fn get_component<T: Send + Sync + 'static>(&self, entity: EntityId) -> Option<&T> {
        self.stores.get::<T>().and_then(|store| store.get(entity))
    }

    /// Exclusive access to `entity`'s `T`, with the same absence rules as
    /// [`get_component`](Self::get_component). Mutate in place through the
    /// returned reference; there is no take-modify-reinsert cycle.
    pub fn get_component_mut<T: Send + Sync + 'static>(
        &mut self,
        entity: EntityId,
    ) -> Option<&mut T> {
        self.stores
            .get_mut::<T>()
            .and_then(|store| store.get_mut(entity))
    }

    /// Whether `entity` currently carries a `T`.
    pub fn has_component<T: Send + Sync + 'static>(&self, entity: EntityId) -> bool {
        self.stores
            .get::<T>()
            .is_some_and(|store| store.contains(entity))
    }

    /// Detach and return `entity`'s `T`. Removing an absent component (or
    /// from a dead entity, or for an unregistered type) is a no-op returning
    /// `None`.
    pub fn remove_component<T: Send + Sync + 'static>(&mut self, entity: EntityId) -> Option<T> {
        self.stores
            .get_mut::<T>()
            .and_then(|store| store.remove(entity))
    }

    /// Shared access to `entity`'s `T` when its presence is an invariant.
    ///
    /// # Panics
    ///
    /// Panics with a description of what is missing: the store registration,
    /// the entity, or the component. Use [`get_component`](Self::get_component)
    /// when absence is expected.
    pub fn require_component<T: Send + Sync + 'static>(&self, entity: EntityId) -> &T {
        match self.get_component::<T>(entity) {
            Some(component) => component,
            None => self.missing_component_panic::<T>(entity),
        }
    }

    /// Exclusive access to `entity`'s `T` when its presence is an invariant.
    ///
    /// # Panics
    ///
    /// Same conditions as [`require_component`](Self::require_component).
    pub fn require_component_mut<T: Send + Sync + 'static>(&mut self, entity: EntityId) -> &mut T {
        if !self.has_component::<T>(entity) {
            self.missing_component_panic::<T>(entity);
        }
        match self.get_component_mut::<T>(entity) {
            Some(component) => component,
            None => unreachable!("component lookup after successful presence check"),
        }
    }

    /// Iterate `(entity, component)` for every `T` in ascending entity
    /// order. Empty if the type was never registered.
    pub fn components<T: Send + Sync + 'static>(
        &self,
    ) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        self.stores
            .get::<T>()
            .into_iter()
            .flat_map(|store| store.iter())
    }

    /// Like [`components`](Self::components) with exclusive access to each
    /// component.
    pub fn components_mut<T: Send + Sync + 'static>(
        &mut self,
    ) -> impl Iterator<Item = (EntityId, &mut T)> + '_ {
        self.stores
            .get_mut::<T>()
            .into_iter()
            .flat_map(|store| store.iter_mut())
    }

    fn missing_component_panic<T: Send + Sync + 'static>(&self, entity: EntityId) -> ! {
        if !self.stores.is_registered::<T>() {
            panic!(
                "component type `{}` is not registered (registered: [{}]). \
                 Did you forget to call register_store?",
                type_name::<T>(),
                self.stores.registered_names().join(", ")
            );
        }
        if !self.entities.contains(entity) {
            panic!(
                "entity {} is not alive; `{}` cannot be read from it",
                entity,
                type_name::<T>()
            );
        }
        panic!(
            "entity {} has no `{}` component",
            entity,
            type_name::<T>()
        );
    }

    // -- tags ---------------------------------------------------------------

    /// Tag `entity` with `tag`. Returns `true` if newly added; tagging a
    /// dead entity is a no-op returning `false`.
    pub fn add_tag(&mut self, entity: EntityId, tag: &str) -> bool {
        if !self.entities.contains(entity) {
            return false;
        }
        self.tags.add(entity, tag)
    }

    /// Remove `tag` from `entity`. Returns `true` if the pair existed;
    /// removing an absent tag is a no-op.
    pub fn remove_tag(&mut self, entity: EntityId, tag: &str) -> bool {
        self.tags.remove(entity, tag)
    }

    /// Whether `entity` carries `tag`.
    pub fn has_tag(&self, entity: EntityId, tag: &str) -> bool {
        self.tags.has(entity, tag)
    }

    /// Iterate the tags on `entity`, sorted.
    pub fn tags_of(&self, entity: EntityId) -> impl Iterator<Item = &str> + '_ {
        self.tags.tags_of(entity)
    }

    /// Snapshot of every entity carrying `tag`, in ascending id order.
    ///
    /// Cost is O(matching entities). The returned `Vec` is yours: spawn,
    /// despawn, and retag freely while walking it, and treat each id as
    /// possibly dead by the time you reach it.
    pub fn entities_with_tag(&self, tag: &str) -> Vec<EntityId> {
        self.tags.entities_with(tag).collect()
    }

    /// Call `f` for each entity carrying `tag`, in ascending id order,
    /// without allocating. The world is borrowed for the duration, so `f`
    /// can read but not mutate; use [`entities_with_tag`](Self::entities_with_tag)
    /// when the loop body needs `&mut World`.
    pub fn for_each_with_tag(&self, tag: &str, mut f: impl FnMut(EntityId)) {
        for entity in self.tags.entities_with(tag) {
            f(entity);
        }
    }

    /// Strip `tag` from every entity carrying it; returns how many were
    /// stripped. This is the end-of-tick reset for transient signal tags.
    pub fn clear_tag_from_all(&mut self, tag: &str) -> usize {
        self.tags.clear_tag_from_all(tag)
    }

    /// Number of entities carrying `tag`.
    pub fn tag_count(&self, tag: &str) -> usize {
        self.tags.count(tag)
    }

    // -- resources ----------------------------------------------------------

    /// Insert a singleton resource, replacing and returning any previous
    /// value of the same type.
    pub fn insert_resource<T: Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.resources.insert(value)
    }

    /// Shared access to the `T` resource, if set.
    pub fn get_resource<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.resources.get::<T>()
    }

    /// Exclusive access to the `T` resource, if set.
    pub fn get_resource_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.resources.get_mut::<T>()
    }

    /// Whether a `T` resource is set.
    pub fn has_resource<T: Send + Sync + 'static>(&self) -> bool {
        self.resources.contains::<T>()
    }

    /// Remove and return the `T` resource. A no-op returning `None` if absent.
    pub fn remove_resource<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.resources.remove::<T>()
    }

    /// Shared access to the `T` resource.
    ///
    /// # Panics
    ///
    /// Panics if the resource was never inserted.
    pub fn require_resource<T: Send + Sync + 'static>(&self) -> &T {
        self.resources.expect::<T>()
    }

    /// Exclusive access to the `T` resource.
    ///
    /// # Panics
    ///
    /// Panics if the resource was never inserted.
    pub fn require_resource_mut<T: Send + Sync + 'static>(&mut self) -> &mut T {
        self.resources.expect_mut::<T>()
    }

    // -- queries ------------------------------------------------------------

    /// Ids of every live entity carrying all component types in `Q`, in
    /// ascending order. `Q` is a tuple of component types, arity 1 to 4:
    /// `world.query::<(Position, Velocity)>()`.
    ///
    /// Walks all live entities (O(entities * arity)); for hot narrow sets,
    /// prefer a tag. The result is a snapshot, safe to mutate against.
    pub fn query<Q: ComponentSet>(&self) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|&entity| Q::matches(&self.stores, entity))
            .collect()
    }

    /// Call `f` for each entity matching `Q`, in ascending id order, without
    /// allocating. Read-only, like [`for_each_with_tag`](Self::for_each_with_tag).
    pub fn query_each<Q: ComponentSet>(&self, mut f: impl FnMut(EntityId)) {
        for entity in self.entities.iter() {
            if Q::matches(&self.stores, entity) {
                f(entity);
            }
        }
    }

    // -- whole-world --------------------------------------------------------

    /// Reset the world to empty: all entities destroyed, all components,
    /// tags, and resources dropped, and the id counter rewound so ids start
    /// from the beginning again. Store registrations survive.
    ///
    /// This is the one operation after which ids repeat; never call it
    /// mid-simulation while anything holds an old id.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.stores.clear_all();
        self.tags.clear();
        self.resources.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Energy {
        current: i32,
        max: i32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f64,
        y: f64,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Loot(u32);

    fn setup_world() -> World {
        let mut world = World::new();
        world.register_store::<Energy>();
        world.register_store::<Position>();
        world.register_store::<Loot>();
        world
    }

    // -- 1. entity lifecycle ------------------------------------------------

    #[test]
    fn spawn_despawn_liveness() {
        let mut world = setup_world();
        let e = world.spawn();
        assert!(world.is_alive(e));
        assert_eq!(world.entity_count(), 1);

        assert!(world.despawn(e));
        assert!(!world.is_alive(e));
        assert_eq!(world.entity_count(), 0);
        assert!(!world.despawn(e), "second despawn is a no-op");
    }

    #[test]
    fn despawn_cascades_components_and_tags() {
        let mut world = setup_world();
        let e = world.spawn();
        world.add_component(e, Energy { current: 5, max: 10 });
        world.add_component(e, Position { x: 1.0, y: 2.0 });
        world.add_tag(e, "player");

        world.despawn(e);

        assert!(world.get_component::<Energy>(e).is_none());
        assert!(world.get_component::<Position>(e).is_none());
        assert!(!world.has_tag(e, "player"));
        assert!(world.entities_with_tag("player").is_empty());
    }

    // -- 2. component access ------------------------------------------------

    #[test]
    fn energy_is_mutated_in_place_and_dies_with_its_entity() {
        let mut world = setup_world();
        let e = world.spawn();
        world.add_component(e, Energy { current: 100, max: 100 });

        world.require_component_mut::<Energy>(e).current -= 30;
        assert_eq!(world.require_component::<Energy>(e).current, 70);

        world.despawn(e);
        assert!(world.query::<(Energy,)>().is_empty());
    }

    #[test]
    fn add_component_replaces_and_returns_previous() {
        let mut world = setup_world();
        let e = world.spawn();
        assert!(world.add_component(e, Loot(1)).is_none());
        assert_eq!(world.add_component(e, Loot(2)), Some(Loot(1)));
        assert_eq!(world.get_component::<Loot>(e), Some(&Loot(2)));
    }

    #[test]
    fn add_component_to_dead_entity_is_a_no_op() {
        let mut world = setup_world();
        let e = world.spawn();
        world.despawn(e);
        assert!(world.add_component(e, Loot(9)).is_none());
        assert!(world.get_component::<Loot>(e).is_none());
    }

    #[test]
    #[should_panic(expected = "is not registered")]
    fn add_component_of_unregistered_type_panics() {
        struct Unregistered;
        let mut world = setup_world();
        let e = world.spawn();
        world.add_component(e, Unregistered);
    }

    #[test]
    #[should_panic(expected = "is not registered")]
    fn add_component_of_unregistered_type_panics_even_for_dead_entity() {
        struct Unregistered;
        let mut world = setup_world();
        let e = world.spawn();
        world.despawn(e);
        world.add_component(e, Unregistered);
    }

    #[test]
    fn get_is_none_for_absent_dead_or_unregistered() {
        struct Unregistered;
        let mut world = setup_world();
        let e = world.spawn();
        assert!(world.get_component::<Energy>(e).is_none());
        assert!(world.get_component::<Unregistered>(e).is_none());
        world.despawn(e);
        assert!(world.get_component::<Energy>(e).is_none());
    }

    #[test]
    #[should_panic(expected = "has no `")]
    fn require_component_panics_when_absent() {
        let mut world = setup_world();
        let e = world.spawn();
        world.require_component::<Energy>(e);
    }

    #[test]
    #[should_panic(expected = "is not alive")]
    fn require_component_panics_for_dead_entity() {
        let mut world = setup_world();
        let e = world.spawn();
        world.add_component(e, Energy { current: 1, max: 1 });
        world.despawn(e);
        world.require_component::<Energy>(e);
    }

    #[test]
    fn remove_component_is_idempotent() {
        let mut world = setup_world();
        let e = world.spawn();
        world.add_component(e, Loot(3));
        assert_eq!(world.remove_component::<Loot>(e), Some(Loot(3)));
        assert_eq!(world.remove_component::<Loot>(e), None);
    }

    #[test]
    fn component_iteration_follows_entity_order() {
        let mut world = setup_world();
        let a = world.spawn();
        let b = world.spawn();
        let c = world.spawn();
        world.add_component(c, Loot(3));
        world.add_component(a, Loot(1));
        world.add_component(b, Loot(2));

        let seen: Vec<(EntityId, Loot)> = world
            .components::<Loot>()
            .map(|(e, loot)| (e, loot.clone()))
            .collect();
        assert_eq!(seen, vec![(a, Loot(1)), (b, Loot(2)), (c, Loot(3))]);

        for (_, loot) in world.components_mut::<Loot>() {
            loot.0 *= 10;
        }
        assert_eq!(world.require_component::<Loot>(b), &Loot(20));
    }

    // -- 3. tags ------------------------------------------------------------

    #[test]
    fn tag_snapshot_survives_mutation_during_iteration() {
        let mut world = setup_world();
        for _ in 0..3 {
            let e = world.spawn();
            world.add_tag(e, "expired");
        }

        for entity in world.entities_with_tag("expired") {
            world.despawn(entity);
        }
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.tag_count("expired"), 0);
    }

    #[test]
    fn tagging_a_dead_entity_is_a_no_op() {
        let mut world = setup_world();
        let e = world.spawn();
        world.despawn(e);
        assert!(!world.add_tag(e, "ghost"));
        assert!(!world.has_tag(e, "ghost"));
    }

    #[test]
    fn for_each_with_tag_reads_without_allocating() {
        let mut world = setup_world();
        let a = world.spawn();
        let b = world.spawn();
        world.add_tag(a, "scored");
        world.add_tag(b, "scored");
        world.add_component(a, Loot(4));
        world.add_component(b, Loot(6));

        let mut total = 0;
        world.for_each_with_tag("scored", |entity| {
            total += world.require_component::<Loot>(entity).0;
        });
        assert_eq!(total, 10);
    }

    // -- 4. resources -------------------------------------------------------

    #[test]
    fn resources_round_trip_through_the_facade() {
        #[derive(Debug, PartialEq)]
        struct Gravity(f64);

        let mut world = setup_world();
        assert!(!world.has_resource::<Gravity>());
        world.insert_resource(Gravity(-9.8));
        world.require_resource_mut::<Gravity>().0 = -1.6;
        assert_eq!(world.get_resource::<Gravity>(), Some(&Gravity(-1.6)));
        assert_eq!(world.remove_resource::<Gravity>(), Some(Gravity(-1.6)));
        assert!(world.get_resource::<Gravity>().is_none());
    }

    #[test]
    #[should_panic(expected = "is not set")]
    fn require_resource_panics_when_absent() {
        struct Missing;
        let world = setup_world();
        world.require_resource::<Missing>();
    }

    // -- 5. queries ---------------------------------------------------------

    #[test]
    fn query_returns_entities_with_all_components_in_id_order() {
        let mut world = setup_world();
        let a = world.spawn();
        let b = world.spawn();
        let c = world.spawn();
        world.add_component(a, Position { x: 0.0, y: 0.0 });
        world.add_component(a, Energy { current: 1, max: 1 });
        world.add_component(b, Position { x: 1.0, y: 1.0 });
        world.add_component(c, Energy { current: 2, max: 2 });
        world.add_component(c, Position { x: 2.0, y: 2.0 });

        assert_eq!(world.query::<(Position, Energy)>(), vec![a, c]);
        assert_eq!(world.query::<(Position,)>(), vec![a, b, c]);
    }

    #[test]
    fn query_each_visits_matches_in_order() {
        let mut world = setup_world();
        let a = world.spawn();
        let b = world.spawn();
        world.add_component(a, Loot(1));
        world.add_component(b, Loot(2));

        let mut visited = Vec::new();
        world.query_each::<(Loot,)>(|entity| visited.push(entity));
        assert_eq!(visited, vec![a, b]);
    }

    // -- 6. clear -----------------------------------------------------------

    #[test]
    fn clear_resets_everything_but_registrations() {
        struct Tally(u32);

        let mut world = setup_world();
        let first = world.spawn();
        world.add_component(first, Loot(5));
        world.add_tag(first, "player");
        world.insert_resource(Tally(1));

        world.clear();

        assert_eq!(world.entity_count(), 0);
        assert!(world.entities_with_tag("player").is_empty());
        assert!(!world.has_resource::<Tally>());
        assert!(world.store_registered::<Loot>());

        // The counter rewinds, so the next spawn repeats the first id.
        let reborn = world.spawn();
        assert_eq!(reborn, first);
        assert!(world.add_component(reborn, Loot(7)).is_none());
    }
}
