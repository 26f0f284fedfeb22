//! Per-tick at-most-once bookkeeping.
//!
//! A snapshot taken at the start of a system can contain many potential
//! matches for the same target (two pickups overlapping one collector, two
//! collision pairs hitting the same entity). When the rule is "at most one
//! effect per target per tick", the system records each target it acts on in
//! a [`HandledSet`] and skips targets already present. The scheduler resets
//! the set at the start of every tick, so the bookkeeping never leaks across
//! tick boundaries.

use std::collections::BTreeSet;

use tidepool_ecs::entity::EntityId;

// ---------------------------------------------------------------------------
// HandledSet
// ---------------------------------------------------------------------------

/// Entities already acted upon this tick. Install it as a world resource;
/// the scheduler clears it before the first system of each tick runs.
#[derive(Debug, Clone, Default)]
pub struct HandledSet {
    entries: BTreeSet<EntityId>,
}

impl HandledSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `entity` for this tick. Returns `true` the first time an entity
    /// is claimed and `false` on every later attempt this tick, so the call
    /// doubles as the guard:
    ///
    /// ```
    /// # use tidepool_engine::handled::HandledSet;
    /// # use tidepool_ecs::entity::EntityId;
    /// # let mut handled = HandledSet::new();
    /// # let target = EntityId::from_raw(1);
    /// if handled.mark(target) {
    ///     // apply the effect exactly once
    /// }
    /// ```
    pub fn mark(&mut self, entity: EntityId) -> bool {
        self.entries.insert(entity)
    }

    /// Whether `entity` has already been claimed this tick.
    pub fn is_marked(&self, entity: EntityId) -> bool {
        self.entries.contains(&entity)
    }

    /// Forget every claim. The scheduler calls this at the start of each
    /// tick.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Number of entities claimed this tick.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been claimed this tick.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
