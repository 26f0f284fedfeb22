//! Singleton world state, keyed by Rust type.
//!
//! A resource is a value the whole simulation shares exactly one of: the
//! clock, the RNG, a spatial index, a message sink. One value per type; a
//! second insert of the same type replaces the first and hands it back.
//! Unlike components, resources are not tied to any entity and survive until
//! removed or the table is cleared.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// ResourceTable
// ---------------------------------------------------------------------------

/// Type-keyed singleton storage.
///
/// Backed by a `HashMap` keyed on `TypeId`: resource iteration is never
/// exposed, so hash ordering cannot leak into simulation behavior.
#[derive(Default)]
pub struct ResourceTable {
    entries: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ResourceTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value`, replacing any existing resource of the same type.
    /// Returns the replaced value, if there was one.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.entries
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|previous| previous.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// Shared access to the resource of type `T`, if set.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }

    /// Exclusive access to the resource of type `T`, if set.
    pub fn get_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut::<T>())
    }

    /// Whether a resource of type `T` is set.
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Remove and return the resource of type `T`. Removing an absent
    /// resource is a no-op returning `None`.
    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.entries
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// Shared access to the resource of type `T`.
    ///
    /// # Panics
    ///
    /// Panics if no resource of type `T` has been inserted. Use this for
    /// resources the simulation cannot run without; use [`get`](Self::get)
    /// when absence is an answer.
    pub fn expect<T: Send + Sync + 'static>(&self) -> &T {
        match self.get::<T>() {
            Some(value) => value,
            None => missing_resource_panic::<T>(),
        }
    }

    /// Exclusive access to the resource of type `T`.
    ///
    /// # Panics
    ///
    /// Panics if no resource of type `T` has been inserted.
    pub fn expect_mut<T: Send + Sync + 'static>(&mut self) -> &mut T {
        if !self.contains::<T>() {
            missing_resource_panic::<T>();
        }
        match self.get_mut::<T>() {
            Some(value) => value,
            None => unreachable!("resource lookup after successful contains check"),
        }
    }

    /// Number of resources set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no resource is set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every resource.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn missing_resource_panic<T>() -> ! {
    panic!(
        "resource `{}` is not set. Did you forget to insert it?",
        type_name::<T>()
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
