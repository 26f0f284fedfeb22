//! Fixed-timestep simulation driver.
//!
//! [`Simulation`] owns a world and a schedule and steps them with a constant
//! `dt` from a [`SimConfig`]. It is the outermost piece of the runtime: an
//! external driver (a server loop, a test, a replay harness) decides *when*
//! ticks happen; the simulation guarantees *what* happens in one is a pure
//! function of the initial world, the schedule, and the seed.

use tidepool_ecs::world::World;

use crate::clock::Clock;
use crate::handled::HandledSet;
use crate::rng::SimRng;
use crate::schedule::{Schedule, TickDiagnostics};

// ---------------------------------------------------------------------------
// SimConfig
// ---------------------------------------------------------------------------

/// Run configuration. Serializable so a run can be reproduced from a config
/// file or a logged header.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SimConfig {
    /// Fixed time step in seconds per tick. Must be positive and finite.
    pub fixed_dt: f64,
    /// Seed for the [`SimRng`] resource. Equal seeds reproduce equal runs.
    pub seed: u64,
}

impl Default for SimConfig {
    /// Defaults to 60 Hz and seed 0.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            seed: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// A world plus a schedule, stepped at a fixed rate.
pub struct Simulation<S> {
    world: World,
    schedule: Schedule<S>,
    config: SimConfig,
    tick_counter: u64,
    last_diagnostics: TickDiagnostics,
}

impl<S> Simulation<S> {
    /// Assemble a simulation and install its standard resources.
    ///
    /// The schedule is validated here, so a broken transient-tag ordering
    /// fails at startup rather than on the first tick. A fresh [`SimRng`]
    /// seeded from the config always replaces any existing one; the [`Clock`]
    /// and [`HandledSet`] are installed only if the world lacks them, so a
    /// world carried over from a previous run keeps its time.
    ///
    /// # Panics
    ///
    /// Panics if `config.fixed_dt` is not positive and finite, or if the
    /// schedule fails validation.
    pub fn new(mut world: World, mut schedule: Schedule<S>, config: SimConfig) -> Self {
        assert!(
            config.fixed_dt > 0.0 && config.fixed_dt.is_finite(),
            "fixed_dt must be positive and finite, got {}",
            config.fixed_dt
        );
        schedule.ensure_validated();

        if !world.has_resource::<Clock>() {
            world.insert_resource(Clock::new());
        }
        world.insert_resource(SimRng::seeded(config.seed));
        if !world.has_resource::<HandledSet>() {
            world.insert_resource(HandledSet::new());
        }

        tracing::info!(
            "simulation ready -- {} systems, fixed_dt {}, seed {}",
            schedule.system_count(),
            config.fixed_dt,
            config.seed
        );

        Self {
            world,
            schedule,
            config,
            tick_counter: 0,
            last_diagnostics: TickDiagnostics::default(),
        }
    }

    /// Execute one tick and return its diagnostics.
    pub fn tick(&mut self, sink: &mut S) -> &TickDiagnostics {
        self.last_diagnostics =
            self.schedule
                .run_tick(&mut self.world, self.config.fixed_dt, sink);
        self.tick_counter += 1;
        &self.last_diagnostics
    }

    /// Run `count` ticks in sequence.
    pub fn run_ticks(&mut self, count: u64, sink: &mut S) {
        for _ in 0..count {
            self.tick(sink);
        }
    }

    // -- accessors ----------------------------------------------------------

    /// The number of ticks executed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// The simulation time in seconds, computed as `tick_count * fixed_dt`
    /// rather than accumulated, so it carries no floating-point drift. The
    /// [`Clock`] resource's `elapsed` tracks it up to accumulation error.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.config.fixed_dt
    }

    /// The fixed time step in seconds per tick.
    pub fn fixed_dt(&self) -> f64 {
        self.config.fixed_dt
    }

    /// The run configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Read-only access to the world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world.
    ///
    /// Use sparingly -- simulation state should change inside systems.
    /// Direct access is appropriate for initial setup and test assertions.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Read-only access to the schedule.
    pub fn schedule(&self) -> &Schedule<S> {
        &self.schedule
    }

    /// Mutable access to the schedule, for registering systems after
    /// assembly. Anything added is validated before the next tick runs.
    pub fn schedule_mut(&mut self) -> &mut Schedule<S> {
        &mut self.schedule
    }

    /// Diagnostics from the last tick.
    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
