//! Entity identifiers and the live-entity registry.
//!
//! An [`EntityId`] is an opaque 64-bit handle allocated from a monotonic
//! counter. Ids are never reused while the registry lives: once an entity is
//! released its id stays dead forever, so a stale handle held by domain code
//! can never silently alias a newer entity. [`EntityRegistry::clear`] is the
//! one exception -- it resets the counter, and is only safe as part of a
//! complete world reset, never mid-simulation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// An opaque, process-unique entity identifier.
///
/// Carries no data itself; it is purely a key into component stores and the
/// tag index. Ids order by allocation time, which is what makes whole-world
/// iteration reproducible across runs.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Raw `u64` representation, for embedders that put ids on the wire.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw `u64` previously obtained via [`to_raw`](Self::to_raw).
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntityRegistry
// ---------------------------------------------------------------------------

/// Allocates [`EntityId`]s and tracks which are alive.
///
/// Allocation is monotonic: the registry hands out 1, 2, 3, ... and never
/// recycles a released id. A released id simply drops out of the live set, so
/// liveness checks double as stale-handle detection. The live set is ordered;
/// [`iter`](Self::iter) walks entities in ascending allocation order. Callers
/// may rely on that order being stable across runs, but not on any particular
/// id landing in any particular position.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    /// Next id to hand out. Starts at 1; 0 is never allocated.
    next: u64,
    /// Currently live ids, in ascending order.
    alive: BTreeSet<EntityId>,
}

impl EntityRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self {
            next: 1,
            alive: BTreeSet::new(),
        }
    }

    /// Allocate a fresh [`EntityId`] and mark it alive.
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        self.alive.insert(id);
        id
    }

    /// Release (kill) an entity id.
    ///
    /// Returns `true` if the id was alive and is now released, `false` if it
    /// was already dead or never allocated. Releasing a dead id is a no-op,
    /// not an error, so two callers racing to destroy the same entity within
    /// one tick are both safe.
    pub fn release(&mut self, id: EntityId) -> bool {
        self.alive.remove(&id)
    }

    /// Whether `id` refers to a currently live entity.
    pub fn contains(&self, id: EntityId) -> bool {
        self.alive.contains(&id)
    }

    /// Iterate all live ids in ascending allocation order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.alive.iter().copied()
    }

    /// Number of currently live entities.
    pub fn len(&self) -> usize {
        self.alive.len()
    }

    /// Whether no entities are alive.
    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }

    /// Drop every live entity and reset the id counter.
    ///
    /// After this, allocation starts over from the beginning, so previously
    /// released ids can reappear. Only safe as part of a complete world
    /// reset where no handle from the old run survives.
    pub fn clear(&mut self) {
        self.alive.clear();
        self.next = 1;
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
