//! Headless drift-tank demo -- a population of drifters wanders on a tide,
//! grazes on deferred pellet drops, and thins out as energy runs dry.
//!
//! Run with:
//!   cargo run --example drift_sim -p tidepool-engine
//!
//! Set RUST_LOG=debug for per-phase detail; every tick emits one JSON frame
//! and the last frame is printed on exit.

use rand::Rng;
use serde::Serialize;
use tidepool_engine::prelude::*;

// ---------------------------------------------------------------------------
// Components and payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct Position {
    x: f64,
    y: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct Velocity {
    dx: f64,
    dy: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct Energy {
    current: i32,
}

#[derive(Debug, Clone, PartialEq)]
struct Pellet {
    value: i32,
}

/// Deferred payload: a pellet landing at a position half a second from now.
#[derive(Debug, Clone, PartialEq)]
struct PelletDrop {
    x: f64,
    y: f64,
}

/// One broadcast frame per tick, serialized into the sink as JSON.
#[derive(Debug, Serialize)]
struct Frame {
    tick: u64,
    time: f64,
    drifters: usize,
    pellets: usize,
    boosted: usize,
    mean_energy: f64,
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

fn hatch_pellets(world: &mut World, _dt: f64, _sink: &mut Vec<String>) {
    let now = world.require_resource::<Clock>().elapsed;
    for drop in drain_due::<PelletDrop>(world, now) {
        let pellet = world.spawn();
        world.add_component(pellet, Position { x: drop.x, y: drop.y });
        world.add_component(pellet, Pellet { value: 25 });
        world.add_tag(pellet, "pellet");
    }
}

fn wander(world: &mut World, dt: f64, _sink: &mut Vec<String>) {
    for drifter in world.query::<(Velocity, Energy)>() {
        let (jx, jy) = {
            let rng = world.require_resource_mut::<SimRng>();
            (rng.gen_range(-0.3..0.3), rng.gen_range(-0.3..0.3))
        };
        let velocity = world.require_component_mut::<Velocity>(drifter);
        velocity.dx += jx * dt;
        velocity.dy += jy * dt;
    }
}

/// Every 45 ticks, schedule a burst of three pellet drops for half a second
/// out, at tide-chosen spots.
fn ration_drops(world: &mut World, _dt: f64, _sink: &mut Vec<String>) {
    let tick = world.require_resource::<Clock>().tick;
    if tick % 45 != 0 {
        return;
    }
    for _ in 0..3 {
        let (x, y) = {
            let rng = world.require_resource_mut::<SimRng>();
            (rng.gen_range(-6.0..6.0), rng.gen_range(-6.0..6.0))
        };
        defer_after(world, 0.5, PelletDrop { x, y });
    }
    tracing::debug!("scheduled pellet burst at tick {tick}");
}

fn tide(world: &mut World, dt: f64, _sink: &mut Vec<String>) {
    let t = world.require_resource::<Clock>().elapsed;
    let pull = (t * 0.7).sin() * 0.4;
    for (_, velocity) in world.components_mut::<Velocity>() {
        velocity.dx += pull * dt;
    }
}

/// Drifters flush with energy burn five of it for a one-tick speed surge.
fn surge(world: &mut World, _dt: f64, _sink: &mut Vec<String>) {
    for drifter in world.query::<(Energy, Velocity)>() {
        let flush = world.require_component::<Energy>(drifter).current >= 60;
        if flush {
            world.require_component_mut::<Energy>(drifter).current -= 5;
            world.add_tag(drifter, "boosted");
        }
    }
}

fn wall_bounce(world: &mut World, _dt: f64, _sink: &mut Vec<String>) {
    for drifter in world.query::<(Position, Velocity)>() {
        let x = world.require_component::<Position>(drifter).x;
        if x.abs() > 8.0 {
            let velocity = world.require_component_mut::<Velocity>(drifter);
            velocity.dx = -x.signum() * velocity.dx.abs();
        }
    }
}

fn drift(world: &mut World, dt: f64, _sink: &mut Vec<String>) {
    for mover in world.query::<(Position, Velocity)>() {
        let factor = if world.has_tag(mover, "boosted") { 2.0 } else { 1.0 };
        let velocity = world.require_component::<Velocity>(mover).clone();
        let position = world.require_component_mut::<Position>(mover);
        position.x += velocity.dx * dt * factor;
        position.y += velocity.dy * dt * factor;
    }
}

fn metabolize(world: &mut World, _dt: f64, _sink: &mut Vec<String>) {
    let tick = world.require_resource::<Clock>().tick;
    if tick % 4 != 0 {
        return;
    }
    for drifter in world.query::<(Energy,)>() {
        let energy = world.require_component_mut::<Energy>(drifter);
        energy.current -= 1;
        let spent = energy.current <= 0;
        if spent {
            world.add_tag(drifter, "expired");
        }
    }
}

/// A drifter within one unit of a pellet eats it; the handled set keeps a
/// pellet from feeding two drifters in the same tick.
fn graze(world: &mut World, _dt: f64, _sink: &mut Vec<String>) {
    let pellets = world.entities_with_tag("pellet");
    let drifters = world.query::<(Position, Energy)>();
    for pellet in pellets {
        let pellet_pos = match world.get_component::<Position>(pellet) {
            Some(position) => position.clone(),
            None => continue,
        };
        let value = match world.get_component::<Pellet>(pellet) {
            Some(pellet) => pellet.value,
            None => continue,
        };
        for &drifter in &drifters {
            let close = {
                let position = world.require_component::<Position>(drifter);
                (position.x - pellet_pos.x).abs() < 1.0 && (position.y - pellet_pos.y).abs() < 1.0
            };
            if close && world.require_resource_mut::<HandledSet>().mark(pellet) {
                world.require_component_mut::<Energy>(drifter).current += value;
                world.despawn(pellet);
            }
        }
    }
}

fn cull(world: &mut World, _dt: f64, _sink: &mut Vec<String>) {
    for expired in world.entities_with_tag("expired") {
        tracing::debug!("culling drained drifter {expired}");
        world.despawn(expired);
    }
}

fn frame(world: &mut World, _dt: f64, sink: &mut Vec<String>) {
    let clock = world.require_resource::<Clock>();
    let (tick, time) = (clock.tick, clock.elapsed);

    let drifters = world.query::<(Position, Energy)>();
    let total: i64 = drifters
        .iter()
        .map(|&d| world.require_component::<Energy>(d).current as i64)
        .sum();
    let mean_energy = if drifters.is_empty() {
        0.0
    } else {
        total as f64 / drifters.len() as f64
    };

    let report = Frame {
        tick,
        time,
        drifters: drifters.len(),
        pellets: world.tag_count("pellet"),
        boosted: world.tag_count("boosted"),
        mean_energy,
    };
    match serde_json::to_string(&report) {
        Ok(line) => sink.push(line),
        Err(err) => tracing::error!("failed to serialize frame -- {err}"),
    }
}

// ---------------------------------------------------------------------------
// Scene setup
// ---------------------------------------------------------------------------

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut world = World::new();
    world.register_store::<Position>();
    world.register_store::<Velocity>();
    world.register_store::<Energy>();
    world.register_store::<Pellet>();
    world.register_store::<Deferred<PelletDrop>>();

    // 16 drifters around a loose ring, with staggered energy reserves.
    for i in 0..16 {
        let angle = f64::from(i) * std::f64::consts::TAU / 16.0;
        let drifter = world.spawn();
        world.add_component(
            drifter,
            Position {
                x: angle.cos() * 4.0,
                y: angle.sin() * 4.0,
            },
        );
        world.add_component(drifter, Velocity { dx: 0.0, dy: 0.0 });
        world.add_component(
            drifter,
            Energy {
                current: 50 + (i * 3) % 40,
            },
        );
        world.add_tag(drifter, "drifter");
    }

    let mut schedule: Schedule<Vec<String>> = Schedule::new();
    schedule.add_system(Phase::Deferred, "hatch_pellets", hatch_pellets);
    schedule.add_system(Phase::Ai, "wander", wander);
    schedule.add_system(Phase::Lifecycle, "ration_drops", ration_drops);
    schedule.add_system(Phase::Forces, "tide", tide);
    schedule.add_system_with_tags(
        Phase::Abilities,
        "surge",
        TagAccess::writes(&["boosted"]),
        surge,
    );
    schedule.add_system(Phase::Collision, "wall_bounce", wall_bounce);
    schedule.add_system_with_tags(
        Phase::Movement,
        "drift",
        TagAccess::reads(&["boosted"]),
        drift,
    );
    schedule.add_system_with_tags(
        Phase::Decay,
        "metabolize",
        TagAccess::writes(&["expired"]),
        metabolize,
    );
    schedule.add_system(Phase::Pickups, "graze", graze);
    schedule.add_system_with_tags(Phase::Removal, "cull", TagAccess::reads(&["expired"]), cull);
    schedule.add_system_with_tags(
        Phase::Broadcast,
        "frame",
        TagAccess::reads(&["boosted"]),
        frame,
    );

    let config = SimConfig {
        fixed_dt: 1.0 / 60.0,
        seed: 42,
    };
    let mut sim = Simulation::new(world, schedule, config);

    let mut frames: Vec<String> = Vec::new();
    for second in 1..=6 {
        sim.run_ticks(60, &mut frames);
        let survivors = sim.world().tag_count("drifter");
        let pending = pending_count::<PelletDrop>(sim.world());
        tracing::info!(
            "t={second}s -- {survivors} drifters, {} pellets on the floor, {pending} drops inbound",
            sim.world().tag_count("pellet"),
        );
    }

    if let Some(last) = frames.last() {
        println!("final frame: {last}");
    }
    println!(
        "{} of 16 drifters survived {} ticks",
        sim.world().tag_count("drifter"),
        sim.tick_count(),
    );
    Ok(())
}
