//! Many-to-many string-label classification of entities.
//!
//! Tags answer "which entities are of kind X" in O(matching entities): the
//! index is inverted (tag -> ordered entity set) with a reverse map (entity ->
//! ordered tag set) so both directions are cheap and destruction can cascade.
//! Persistent tags classify an entity for its whole life ("player",
//! "projectile"); transient tags signal between systems within one tick
//! ("slowed") and are bulk-reset via [`TagIndex::clear_tag_from_all`].
//!
//! Tag membership says nothing about components: code that requires a
//! component after testing a tag must still handle its absence.

use std::collections::{BTreeMap, BTreeSet};

use crate::entity::EntityId;

// ---------------------------------------------------------------------------
// TagIndex
// ---------------------------------------------------------------------------

/// The two-sided tag index. Both maps are kept exactly consistent: an
/// `(entity, tag)` pair is either in both or in neither, and sets that drain
/// to empty are pruned so dead tags cost nothing.
#[derive(Debug, Clone, Default)]
pub struct TagIndex {
    by_tag: BTreeMap<String, BTreeSet<EntityId>>,
    by_entity: BTreeMap<EntityId, BTreeSet<String>>,
}

impl TagIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag `entity` with `tag`. Returns `true` if the pair was newly added.
    pub fn add(&mut self, entity: EntityId, tag: &str) -> bool {
        if let Some(set) = self.by_tag.get_mut(tag) {
            if !set.insert(entity) {
                return false;
            }
        } else {
            self.by_tag.insert(tag.to_owned(), BTreeSet::from([entity]));
        }
        self.by_entity
            .entry(entity)
            .or_default()
            .insert(tag.to_owned());
        true
    }

    /// Remove `tag` from `entity`. Returns `true` if the pair existed.
    /// Removing an absent pair is a no-op.
    pub fn remove(&mut self, entity: EntityId, tag: &str) -> bool {
        let removed = match self.by_tag.get_mut(tag) {
            Some(set) => {
                let removed = set.remove(&entity);
                if set.is_empty() {
                    self.by_tag.remove(tag);
                }
                removed
            }
            None => false,
        };
        if removed {
            let now_empty = match self.by_entity.get_mut(&entity) {
                Some(tags) => {
                    tags.remove(tag);
                    tags.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.by_entity.remove(&entity);
            }
        }
        removed
    }

    /// Whether `entity` carries `tag`.
    pub fn has(&self, entity: EntityId, tag: &str) -> bool {
        self.by_tag
            .get(tag)
            .is_some_and(|set| set.contains(&entity))
    }

    /// Iterate the tags on `entity`, in sorted order. Empty if none.
    pub fn tags_of(&self, entity: EntityId) -> impl Iterator<Item = &str> + '_ {
        self.by_entity
            .get(&entity)
            .into_iter()
            .flat_map(|tags| tags.iter().map(String::as_str))
    }

    /// Iterate the entities carrying `tag`, in ascending id order.
    ///
    /// This borrows the index; callers that need to mutate the world while
    /// walking the result should materialize it first (the World facade's
    /// `entities_with_tag` does exactly that).
    pub fn entities_with(&self, tag: &str) -> impl Iterator<Item = EntityId> + '_ {
        self.by_tag.get(tag).into_iter().flatten().copied()
    }

    /// Number of entities carrying `tag`.
    pub fn count(&self, tag: &str) -> usize {
        self.by_tag.get(tag).map_or(0, BTreeSet::len)
    }

    /// Iterate every tag currently carried by at least one entity, sorted.
    pub fn tags(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_tag.keys().map(String::as_str)
    }

    /// Remove `tag` from every entity carrying it, in one pass.
    ///
    /// Returns how many entities were stripped. This is the scheduler's
    /// transient-tag reset primitive: no per-entity bookkeeping is needed to
    /// find who received a signal this tick.
    pub fn clear_tag_from_all(&mut self, tag: &str) -> usize {
        let set = match self.by_tag.remove(tag) {
            Some(set) => set,
            None => return 0,
        };
        for entity in &set {
            let now_empty = match self.by_entity.get_mut(entity) {
                Some(tags) => {
                    tags.remove(tag);
                    tags.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.by_entity.remove(entity);
            }
        }
        set.len()
    }

    /// Remove every tag from `entity` (the destruction cascade).
    pub fn remove_entity(&mut self, entity: EntityId) {
        let tags = match self.by_entity.remove(&entity) {
            Some(tags) => tags,
            None => return,
        };
        for tag in &tags {
            let now_empty = match self.by_tag.get_mut(tag) {
                Some(set) => {
                    set.remove(&entity);
                    set.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.by_tag.remove(tag);
            }
        }
    }

    /// Drop every tag pair.
    pub fn clear(&mut self) {
        self.by_tag.clear();
        self.by_entity.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
