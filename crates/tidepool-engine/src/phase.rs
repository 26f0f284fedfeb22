//! Fixed execution phases for the tick schedule.
//!
//! Systems communicate through shared world state rather than explicit data
//! dependencies, so execution order cannot be inferred; it is declared.
//! Every system registers into exactly one [`Phase`], phases run in the
//! order the variants are written, and systems within a phase run in
//! registration order. Each variant's documentation states its cross-phase
//! data contract: what it may read from earlier phases and what it produces
//! for later ones.

use std::fmt;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// One band of the per-tick execution order. Lower variants run first; the
/// derived `Ord` follows declaration order, which is the execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Deferred-action resolution: drain due marker entities and enact their
    /// payloads (spawns, expiries). Runs first so everything scheduled for
    /// this tick exists before any other system looks at the world.
    Deferred,
    /// AI decision-making: reads world state, writes intent and
    /// movement-input components for later phases to act on.
    Ai,
    /// Lifecycle and growth ticks for passive entities.
    Lifecycle,
    /// Force and field accumulation into velocity-like components.
    Forces,
    /// Ability and action resolution: consumes intent written in
    /// [`Phase::Ai`], produces effects and may set transient tags.
    Abilities,
    /// Collision detection and cross-entity interaction. May set transient
    /// tags ("slowed", "hit") consumed later this same tick.
    Collision,
    /// Movement integration: applies velocity to position, honoring
    /// transient debuff tags set by [`Phase::Collision`].
    Movement,
    /// Passive decay and resource drain.
    Decay,
    /// Pickup and consumption collision. Pairs with the handled-set idiom
    /// for at-most-one-effect-per-target semantics.
    Pickups,
    /// Death and removal resolution: despawns entities marked for removal
    /// by earlier phases.
    Removal,
    /// Observable broadcast: the sink write. Runs last so the output
    /// reflects this tick's final state.
    Broadcast,
}

impl Phase {
    /// Every phase, in execution order.
    pub const ALL: [Phase; 11] = [
        Phase::Deferred,
        Phase::Ai,
        Phase::Lifecycle,
        Phase::Forces,
        Phase::Abilities,
        Phase::Collision,
        Phase::Movement,
        Phase::Decay,
        Phase::Pickups,
        Phase::Removal,
        Phase::Broadcast,
    ];

    /// Stable lowercase name, used in logs and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Phase::Deferred => "deferred",
            Phase::Ai => "ai",
            Phase::Lifecycle => "lifecycle",
            Phase::Forces => "forces",
            Phase::Abilities => "abilities",
            Phase::Collision => "collision",
            Phase::Movement => "movement",
            Phase::Decay => "decay",
            Phase::Pickups => "pickups",
            Phase::Removal => "removal",
            Phase::Broadcast => "broadcast",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
