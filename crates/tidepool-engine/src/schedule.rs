//! Phase-ordered system schedule for deterministic ticks.
//!
//! The [`Schedule`] drives the simulation forward. Each tick:
//!
//! 1. The [`Clock`] resource is advanced (and installed first if absent), so
//!    every system observes the same timestamp.
//! 2. The [`HandledSet`] resource, if installed, is reset.
//! 3. All registered systems run in a fixed order: by [`Phase`], and by
//!    registration order within a phase. Each receives
//!    `(&mut World, dt, &mut sink)`.
//! 4. Every transient tag known to the schedule is cleared from all
//!    entities, so the next tick starts with clean signals.
//!
//! Systems communicate within a tick through transient tags, and the
//! ordering is the contract: a tag reader must run strictly after every
//! writer of that tag. Systems declare their tag reads and writes with
//! [`TagAccess`] at registration, and the schedule refuses to run while a
//! declared reader precedes a declared writer ([`Schedule::validate`]).
//! Misordering would otherwise break signaling silently; validation turns it
//! into a loud setup failure.
//!
//! # Example
//!
//! ```
//! use tidepool_engine::prelude::*;
//!
//! let mut world = World::new();
//! let mut schedule: Schedule<Vec<String>> = Schedule::new();
//!
//! schedule.add_system_with_tags(
//!     Phase::Collision,
//!     "mark_overlaps",
//!     TagAccess::writes(&["bumped"]),
//!     |world, _dt, _sink| {
//!         let everyone: Vec<EntityId> = world.entities().collect();
//!         for entity in everyone {
//!             world.add_tag(entity, "bumped");
//!         }
//!     },
//! );
//! schedule.add_system_with_tags(
//!     Phase::Broadcast,
//!     "report",
//!     TagAccess::reads(&["bumped"]),
//!     |world, _dt, sink| {
//!         sink.push(format!("bumped: {}", world.tag_count("bumped")));
//!     },
//! );
//!
//! world.spawn();
//! let mut sink = Vec::new();
//! schedule.run_tick(&mut world, 1.0 / 60.0, &mut sink);
//!
//! assert_eq!(sink, vec!["bumped: 1".to_owned()]);
//! assert_eq!(world.tag_count("bumped"), 0); // cleared at end of tick
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use tidepool_ecs::world::World;

use crate::clock::Clock;
use crate::handled::HandledSet;
use crate::phase::Phase;

// ---------------------------------------------------------------------------
// TagAccess
// ---------------------------------------------------------------------------

/// A system's declared transient-tag contract: which signal tags it reads
/// and which it writes within a tick.
///
/// Declarations serve two purposes: they let [`Schedule::validate`] check
/// that every writer runs before every reader, and every mentioned tag is
/// cleared from all entities at end of tick. Persistent tags ("player",
/// "projectile") are not declared here; they carry no ordering hazard and
/// must survive the tick boundary.
#[derive(Debug, Clone, Default)]
pub struct TagAccess {
    reads: BTreeSet<String>,
    writes: BTreeSet<String>,
}

impl TagAccess {
    /// No transient-tag traffic.
    pub fn none() -> Self {
        Self::default()
    }

    /// Declare read tags.
    pub fn reads(tags: &[&str]) -> Self {
        Self::none().and_reads(tags)
    }

    /// Declare written tags.
    pub fn writes(tags: &[&str]) -> Self {
        Self::none().and_writes(tags)
    }

    /// Add read tags to an existing declaration.
    pub fn and_reads(mut self, tags: &[&str]) -> Self {
        self.reads.extend(tags.iter().map(|t| (*t).to_owned()));
        self
    }

    /// Add written tags to an existing declaration.
    pub fn and_writes(mut self, tags: &[&str]) -> Self {
        self.writes.extend(tags.iter().map(|t| (*t).to_owned()));
        self
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by schedule validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    /// A system declares a read of a transient tag but runs before a system
    /// that writes it, so the signal could never be observed in the tick it
    /// was sent.
    #[error(
        "transient tag `{tag}` is read by `{reader}` before `{writer}` writes it; \
         every writer of a transient tag must run strictly before every reader"
    )]
    TagReadBeforeWrite {
        tag: String,
        reader: String,
        writer: String,
    },
}

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing and bookkeeping from the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Wall-clock time per system, in execution order.
    pub system_times: Vec<(String, Duration)>,
    /// Total time for the tick (clock, systems, and tag clearing).
    pub total_time: Duration,
    /// How many entity/tag pairs the end-of-tick transient sweep removed.
    pub transient_tags_cleared: usize,
}

// ---------------------------------------------------------------------------
// RegisteredSystem
// ---------------------------------------------------------------------------

/// A boxed system closure. Systems receive exclusive world access, the tick
/// time step in seconds, and the external sink.
pub type SystemFn<S> = Box<dyn FnMut(&mut World, f64, &mut S)>;

struct RegisteredSystem<S> {
    /// Human-readable name (e.g. `"movement"`), used in logs, diagnostics,
    /// and validation errors.
    name: String,
    phase: Phase,
    /// Global registration index; the within-phase tiebreaker.
    seq: usize,
    tags: TagAccess,
    func: SystemFn<S>,
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// The ordered system list, generic over the external sink type `S` that
/// systems may write observable output to (a broadcast buffer, a transcript,
/// or `()` when there is none).
///
/// # Determinism Guarantee
///
/// Given the same initial world, the same registered systems, and the same
/// sequence of `dt` values, a schedule produces identical results across
/// runs: execution order is fixed by `(phase, registration order)`, all
/// world iteration orders are defined, and the end-of-tick tag sweep is
/// derived from the registered declarations rather than observation order.
pub struct Schedule<S> {
    /// Registered systems, kept sorted by `(phase, seq)`.
    systems: Vec<RegisteredSystem<S>>,
    /// Transient tags declared via [`mark_transient`](Self::mark_transient)
    /// on top of those mentioned in system [`TagAccess`] declarations.
    extra_transient: BTreeSet<String>,
    next_seq: usize,
    /// Cleared on every registration; set once validation passes.
    validated: bool,
}

impl<S> Schedule<S> {
    /// Create an empty schedule.
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            extra_transient: BTreeSet::new(),
            next_seq: 0,
            validated: false,
        }
    }

    /// Register a system with no transient-tag traffic.
    ///
    /// Within `phase`, systems run in the order they were registered.
    ///
    /// # Panics
    ///
    /// Panics if a system with the same name is already registered.
    pub fn add_system(
        &mut self,
        phase: Phase,
        name: &str,
        func: impl FnMut(&mut World, f64, &mut S) + 'static,
    ) {
        self.add_system_with_tags(phase, name, TagAccess::none(), func);
    }

    /// Register a system along with its transient-tag declaration.
    ///
    /// # Panics
    ///
    /// Panics if a system with the same name is already registered.
    pub fn add_system_with_tags(
        &mut self,
        phase: Phase,
        name: &str,
        tags: TagAccess,
        func: impl FnMut(&mut World, f64, &mut S) + 'static,
    ) {
        assert!(
            !self.systems.iter().any(|s| s.name == name),
            "duplicate system name: {name:?}"
        );

        self.systems.push(RegisteredSystem {
            name: name.to_owned(),
            phase,
            seq: self.next_seq,
            tags,
            func: Box::new(func),
        });
        self.next_seq += 1;
        self.systems.sort_by_key(|s| (s.phase, s.seq));
        self.validated = false;
    }

    /// Declare `tag` transient even though no registered system declares it.
    ///
    /// Use this for signal tags set by code outside the schedule (setup
    /// code, a command ingress) that must still be swept at end of tick.
    pub fn mark_transient(&mut self, tag: &str) {
        self.extra_transient.insert(tag.to_owned());
    }

    /// Every tag the end-of-tick sweep will clear: the union of
    /// [`mark_transient`](Self::mark_transient) declarations and all tags
    /// mentioned in any system's [`TagAccess`].
    pub fn transient_tags(&self) -> BTreeSet<&str> {
        let mut tags: BTreeSet<&str> = self.extra_transient.iter().map(String::as_str).collect();
        for system in &self.systems {
            tags.extend(system.tags.reads.iter().map(String::as_str));
            tags.extend(system.tags.writes.iter().map(String::as_str));
        }
        tags
    }

    /// Check the transient-tag ordering contract: every declared writer of a
    /// tag must run strictly before every declared reader of it.
    ///
    /// A system that declares both read and write of the same tag is
    /// consuming its own signal and is allowed. A declared read with no
    /// writer anywhere is not an error (the tag may be set from outside the
    /// schedule) but logs a warning, since it is usually a missing
    /// registration.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        let mut readers: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        let mut writers: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (position, system) in self.systems.iter().enumerate() {
            for tag in &system.tags.reads {
                readers.entry(tag.as_str()).or_default().push(position);
            }
            for tag in &system.tags.writes {
                writers.entry(tag.as_str()).or_default().push(position);
            }
        }

        for (tag, reader_positions) in &readers {
            let writer_positions = match writers.get(tag) {
                Some(positions) => positions,
                None => {
                    tracing::warn!(
                        "transient tag `{}` is read by `{}` but no system writes it -- \
                         the signal can never be raised from inside the schedule",
                        tag,
                        self.systems[reader_positions[0]].name
                    );
                    continue;
                }
            };
            for &reader in reader_positions {
                for &writer in writer_positions {
                    // Equal positions mean one system reading its own write.
                    if writer > reader {
                        return Err(ScheduleError::TagReadBeforeWrite {
                            tag: (*tag).to_owned(),
                            reader: self.systems[reader].name.clone(),
                            writer: self.systems[writer].name.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Validate once after the latest registration, panicking on failure.
    /// Registration is setup-time code, so a broken ordering is a structural
    /// bug and not a recoverable condition.
    pub(crate) fn ensure_validated(&mut self) {
        if self.validated {
            return;
        }
        if let Err(err) = self.validate() {
            panic!("system schedule is misordered: {err}");
        }
        self.validated = true;
    }

    /// Execute one simulation tick. See the module documentation for the
    /// exact sequence.
    ///
    /// # Panics
    ///
    /// Panics if `dt` is not positive and finite, or if the schedule fails
    /// [`validate`](Self::validate).
    pub fn run_tick(&mut self, world: &mut World, dt: f64, sink: &mut S) -> TickDiagnostics {
        assert!(
            dt > 0.0 && dt.is_finite(),
            "dt must be positive and finite, got {dt}"
        );
        self.ensure_validated();

        let tick_start = Instant::now();

        if !world.has_resource::<Clock>() {
            world.insert_resource(Clock::new());
        }
        world.require_resource_mut::<Clock>().advance(dt);

        if let Some(handled) = world.get_resource_mut::<HandledSet>() {
            handled.reset();
        }

        let mut system_times = Vec::with_capacity(self.systems.len());
        for system in &mut self.systems {
            let sys_start = Instant::now();
            (system.func)(world, dt, sink);
            system_times.push((system.name.clone(), sys_start.elapsed()));
        }

        let mut transient_tags_cleared = 0;
        for tag in self.transient_tags() {
            transient_tags_cleared += world.clear_tag_from_all(tag);
        }

        TickDiagnostics {
            system_times,
            total_time: tick_start.elapsed(),
            transient_tags_cleared,
        }
    }

    // -- accessors ----------------------------------------------------------

    /// The number of registered systems.
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// The names of all registered systems, in execution order.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name.as_str()).collect()
    }

    /// Whether no system is registered.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

impl<S> Default for Schedule<S> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
