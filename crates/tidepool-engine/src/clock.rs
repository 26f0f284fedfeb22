//! Simulation time as a world resource.
//!
//! The clock is advanced by the scheduler at the very start of each tick,
//! before any system runs, so every system in a tick observes the same
//! timestamp. Time only moves at tick boundaries; nothing in the runtime
//! consults wall-clock time, which is what keeps a run replayable from its
//! inputs alone.

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// The current simulation time. Inserted (if absent) and advanced by the
/// scheduler; systems read it via `world.require_resource::<Clock>()`.
///
/// `tick` is 0 before the first tick and 1 inside it: a system can tell
/// "which tick am I in" directly from the counter. `elapsed` accumulates the
/// `dt` of every tick run so far, so with a variable-step driver it is the
/// true total; with a fixed-step driver it tracks `tick * dt` up to
/// floating-point accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Clock {
    /// Completed-or-running tick number, starting at 1 inside the first tick.
    pub tick: u64,
    /// Total simulation seconds elapsed, including the current tick's `dt`.
    pub elapsed: f64,
    /// The time step of the current tick, in seconds.
    pub dt: f64,
}

impl Clock {
    /// A clock at time zero, before any tick has run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Step into the next tick. Called by the scheduler once per tick,
    /// before the first system.
    pub(crate) fn advance(&mut self, dt: f64) {
        self.tick += 1;
        self.dt = dt;
        self.elapsed += dt;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
