//! All-of component matching over entities.
//!
//! A query names a set of component types as a tuple and asks which live
//! entities carry every one of them: `world.query::<(Position, Velocity)>()`.
//! Matching walks all live entities and probes each store, so it costs
//! O(entities * set size); when a cheap narrow index is needed every tick,
//! tag queries are the right tool instead.

use crate::entity::EntityId;
use crate::store::StoreRegistry;

// ---------------------------------------------------------------------------
// ComponentSet
// ---------------------------------------------------------------------------

/// A tuple of component types that an entity either carries in full or not.
///
/// Implemented for tuples of arity 1 through 4. The single-type form still
/// uses tuple syntax: `world.query::<(Position,)>()`.
///
/// A type that was never registered simply matches nothing; queries report
/// membership, they do not enforce registration.
pub trait ComponentSet {
    /// Whether `entity` carries every component type in the set.
    fn matches(stores: &StoreRegistry, entity: EntityId) -> bool;
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name),+> ComponentSet for ($($name,)+)
        where
            $($name: Send + Sync + 'static,)+
        {
            fn matches(stores: &StoreRegistry, entity: EntityId) -> bool {
                true $(&& stores
                    .get::<$name>()
                    .is_some_and(|store| store.contains(entity)))+
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityRegistry;

    #[derive(Debug)]
    struct Position {
        #[allow(dead_code)]
        x: f64,
    }

    #[derive(Debug)]
    struct Velocity {
        #[allow(dead_code)]
        dx: f64,
    }

    #[derive(Debug)]
    struct Health(#[allow(dead_code)] i32);

    fn setup() -> (StoreRegistry, Vec<EntityId>) {
        let mut stores = StoreRegistry::new();
        stores.register::<Position>();
        stores.register::<Velocity>();
        stores.register::<Health>();

        let mut reg = EntityRegistry::new();
        let ids: Vec<EntityId> = (0..3).map(|_| reg.allocate()).collect();

        // ids[0]: position + velocity, ids[1]: position only, ids[2]: all three.
        let positions = stores.expect_mut::<Position>();
        positions.insert(ids[0], Position { x: 0.0 });
        positions.insert(ids[1], Position { x: 1.0 });
        positions.insert(ids[2], Position { x: 2.0 });
        let velocities = stores.expect_mut::<Velocity>();
        velocities.insert(ids[0], Velocity { dx: 1.0 });
        velocities.insert(ids[2], Velocity { dx: -1.0 });
        stores.expect_mut::<Health>().insert(ids[2], Health(10));

        (stores, ids)
    }

    #[test]
    fn single_type_matches_component_presence() {
        let (stores, ids) = setup();
        assert!(<(Velocity,)>::matches(&stores, ids[0]));
        assert!(!<(Velocity,)>::matches(&stores, ids[1]));
    }

    #[test]
    fn pair_requires_both_components() {
        let (stores, ids) = setup();
        assert!(<(Position, Velocity)>::matches(&stores, ids[0]));
        assert!(!<(Position, Velocity)>::matches(&stores, ids[1]));
        assert!(<(Position, Velocity)>::matches(&stores, ids[2]));
    }

    #[test]
    fn order_of_types_does_not_matter() {
        let (stores, ids) = setup();
        assert_eq!(
            <(Position, Velocity)>::matches(&stores, ids[2]),
            <(Velocity, Position)>::matches(&stores, ids[2]),
        );
    }

    #[test]
    fn triple_and_quad_narrow_further() {
        let (stores, ids) = setup();
        assert!(<(Position, Velocity, Health)>::matches(&stores, ids[2]));
        assert!(!<(Position, Velocity, Health)>::matches(&stores, ids[0]));
        assert!(<(Position, Velocity, Health, Position)>::matches(
            &stores, ids[2]
        ));
    }

    #[test]
    fn unregistered_type_matches_nothing() {
        struct Mana(#[allow(dead_code)] u32);
        let (stores, ids) = setup();
        assert!(!<(Mana,)>::matches(&stores, ids[2]));
        assert!(!<(Position, Mana)>::matches(&stores, ids[2]));
    }
}
