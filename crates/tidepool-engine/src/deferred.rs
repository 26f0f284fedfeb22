//! Future work as data: deferred-action marker entities.
//!
//! Nothing in the runtime sets a timer. Anything that must happen "at time T"
//! becomes an ordinary entity carrying a [`Deferred<P>`] component with the
//! due timestamp and a payload describing the action. A system in
//! [`Phase::Deferred`](crate::phase::Phase::Deferred) calls [`drain_due`]
//! each tick, receives the payloads that have come due, and enacts them. The
//! marker entities are destroyed in the same call.
//!
//! Because pending work is plain world data, it survives nothing it
//! shouldn't: a world reset drops it with everything else, and there is no
//! out-of-band callback left to fire against entities that no longer exist.
//! It is also inspectable and replayable like any other component.
//!
//! Each payload type `P` is a distinct component type; register its store up
//! front with `world.register_store::<Deferred<P>>()`.

use tidepool_ecs::entity::EntityId;
use tidepool_ecs::world::World;

use crate::clock::Clock;

// ---------------------------------------------------------------------------
// Deferred
// ---------------------------------------------------------------------------

/// The marker component: an action payload and the simulation time at which
/// it comes due.
#[derive(Debug, Clone, PartialEq)]
pub struct Deferred<P> {
    /// Simulation time (seconds, compared against [`Clock::elapsed`]) at
    /// which the payload should fire. Due means `due_at <= now`.
    pub due_at: f64,
    /// The action to enact when due.
    pub payload: P,
}

/// Schedule `payload` to fire at absolute simulation time `due_at`.
///
/// Spawns a fresh marker entity carrying only the [`Deferred<P>`] component
/// and returns its id (useful for cancellation via `despawn`).
///
/// # Panics
///
/// Panics if no store for `Deferred<P>` is registered.
pub fn defer_until<P: Send + Sync + 'static>(
    world: &mut World,
    due_at: f64,
    payload: P,
) -> EntityId {
    let marker = world.spawn();
    world.add_component(marker, Deferred { due_at, payload });
    marker
}

/// Schedule `payload` to fire `delay` seconds from the current clock time.
///
/// # Panics
///
/// Panics if the [`Clock`] resource is not installed, or if no store for
/// `Deferred<P>` is registered.
pub fn defer_after<P: Send + Sync + 'static>(
    world: &mut World,
    delay: f64,
    payload: P,
) -> EntityId {
    let now = world.require_resource::<Clock>().elapsed;
    defer_until(world, now + delay, payload)
}

/// Collect every `P` whose marker is due at `now` (inclusive), destroying
/// the markers, and return the payloads.
///
/// Payloads come back in ascending marker-id order, which is scheduling
/// order; ties and interleavings are therefore deterministic and unrelated
/// to the due timestamps themselves. Markers not yet due are left untouched
/// for a later tick.
pub fn drain_due<P: Send + Sync + 'static>(world: &mut World, now: f64) -> Vec<P> {
    let due: Vec<EntityId> = world
        .components::<Deferred<P>>()
        .filter(|(_, deferred)| deferred.due_at <= now)
        .map(|(marker, _)| marker)
        .collect();

    let mut payloads = Vec::with_capacity(due.len());
    for marker in due {
        if let Some(deferred) = world.remove_component::<Deferred<P>>(marker) {
            payloads.push(deferred.payload);
            world.despawn(marker);
        }
    }
    payloads
}

/// Number of `P` actions still pending, due or not.
pub fn pending_count<P: Send + Sync + 'static>(world: &World) -> usize {
    world.components::<Deferred<P>>().count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
