//! Tidepool Engine -- deterministic, phase-ordered simulation scheduling.
//!
//! This crate builds on [`tidepool_ecs`] to provide the simulation driver.
//! A [`Schedule`](schedule::Schedule) runs systems in a fixed phase order
//! each tick, advances the [`Clock`](clock::Clock), enforces the
//! transient-tag ordering contract, and sweeps signal tags at end of tick;
//! a [`Simulation`](sim::Simulation) steps the schedule at a fixed rate with
//! seeded randomness, so a run is reproducible from its configuration alone.
//! Future work is scheduled as data via [`deferred`] marker entities rather
//! than timers.
//!
//! # Quick Start
//!
//! ```
//! use tidepool_engine::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Depth(f64);
//!
//! let mut world = World::new();
//! world.register_store::<Depth>();
//! let drifter = world.spawn();
//! world.add_component(drifter, Depth(0.0));
//!
//! let mut schedule: Schedule<()> = Schedule::new();
//! schedule.add_system(Phase::Movement, "sink_slowly", |world, dt, _sink| {
//!     for (_, depth) in world.components_mut::<Depth>() {
//!         depth.0 += 2.0 * dt;
//!     }
//! });
//!
//! let mut sim = Simulation::new(world, schedule, SimConfig::default());
//! sim.run_ticks(60, &mut ());
//!
//! assert_eq!(sim.tick_count(), 60);
//! let depth = sim.world().require_component::<Depth>(drifter).0;
//! assert!((depth - 2.0).abs() < 1e-9);
//! ```

#![deny(unsafe_code)]

pub mod clock;
pub mod deferred;
pub mod handled;
pub mod phase;
pub mod rng;
pub mod schedule;
pub mod sim;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the ECS crate for convenience.
pub use tidepool_ecs;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Re-export everything from the ECS prelude.
    pub use tidepool_ecs::prelude::*;

    // Engine-specific exports.
    pub use crate::clock::Clock;
    pub use crate::deferred::{defer_after, defer_until, drain_due, pending_count, Deferred};
    pub use crate::handled::HandledSet;
    pub use crate::phase::Phase;
    pub use crate::rng::SimRng;
    pub use crate::schedule::{Schedule, ScheduleError, SystemFn, TagAccess, TickDiagnostics};
    pub use crate::sim::{SimConfig, Simulation};
}
