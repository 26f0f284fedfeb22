//! Tidepool ECS -- sparse-store Entity Component System with tag indexing.
//!
//! This crate provides the world model for the Tidepool engine. Entities are
//! plain ids handed out monotonically and never reused; each component type
//! lives in its own ordered sparse store; string tags classify entities
//! through an inverted index; and singleton resources hang off the world
//! keyed by their Rust type. Everything a system touches goes through the
//! [`World`](world::World) facade, and all iteration orders are defined
//! (ascending entity id), so a simulation built on it replays identically
//! from the same inputs.
//!
//! # Quick Start
//!
//! ```
//! use tidepool_ecs::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Position { x: f64, y: f64 }
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Energy { current: i32, max: i32 }
//!
//! let mut world = World::new();
//! world.register_store::<Position>();
//! world.register_store::<Energy>();
//!
//! let diver = world.spawn();
//! world.add_component(diver, Position { x: 0.0, y: 0.0 });
//! world.add_component(diver, Energy { current: 100, max: 100 });
//! world.add_tag(diver, "player");
//!
//! world.require_component_mut::<Energy>(diver).current -= 30;
//!
//! assert_eq!(world.require_component::<Energy>(diver).current, 70);
//! assert_eq!(world.query::<(Position, Energy)>(), vec![diver]);
//! assert!(world.has_tag(diver, "player"));
//! ```

#![deny(unsafe_code)]

pub mod entity;
pub mod query;
pub mod resource;
pub mod store;
pub mod tag;
pub mod world;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::entity::EntityId;
    pub use crate::query::ComponentSet;
    pub use crate::resource::ResourceTable;
    pub use crate::store::{ComponentStore, StoreRegistry};
    pub use crate::tag::TagIndex;
    pub use crate::world::World;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
