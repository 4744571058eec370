//! # Entity Cache
//!
//! Everything one screen has fetched: a set of named collections plus the
//! queue of entities whose detail must be refetched and a short memory of
//! removed comments.
//!
//! A cache is owned by exactly one screen and dropped with it. Screens never
//! hand out references into their cache; they reconcile through change
//! events instead.

use super::collection::EntityCollection;
use super::errors::CacheError;
use shared_types::entities::{Entity, EntityId};
use std::collections::{BTreeSet, VecDeque};

/// Removed comments remembered for restoration, oldest dropped first.
pub const REMOVED_COMMENT_CAPACITY: usize = 64;

/// Where a removed comment sat before a remove event took it out.
///
/// A later add of the same comment under the same root (a failed removal
/// being undone) puts it back at these positions and leaves the counters
/// that the removal could not decrement alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedComment {
    pub root: EntityId,
    pub comment: EntityId,
    /// Collection name and index of the first removed copy.
    pub positions: Vec<(String, usize)>,
    /// Collections whose counter was already at zero.
    pub clamped: BTreeSet<String>,
}

impl RemovedComment {
    pub fn position_in(&self, collection: &str) -> Option<usize> {
        self.positions
            .iter()
            .find(|(name, _)| name == collection)
            .map(|&(_, index)| index)
    }
}

/// Per-screen entity cache.
#[derive(Debug, Clone, Default)]
pub struct EntityCache {
    /// Collections in registration order.
    collections: Vec<EntityCollection>,

    /// Entities a revision event asked us to refetch.
    stale: BTreeSet<EntityId>,

    /// Recently removed comments, newest last.
    removed: VecDeque<RemovedComment>,
}

impl EntityCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a collection.
    ///
    /// # Errors
    /// - `DuplicateCollection` if the name is taken
    pub fn add_collection(&mut self, collection: EntityCollection) -> Result<(), CacheError> {
        if self.collection(collection.name()).is_some() {
            return Err(CacheError::DuplicateCollection(collection.name().to_string()));
        }
        self.collections.push(collection);
        Ok(())
    }

    /// Builder-style `add_collection`.
    pub fn with_collection(mut self, collection: EntityCollection) -> Result<Self, CacheError> {
        self.add_collection(collection)?;
        Ok(self)
    }

    pub fn collections(&self) -> &[EntityCollection] {
        &self.collections
    }

    pub fn collections_mut(&mut self) -> &mut [EntityCollection] {
        &mut self.collections
    }

    pub fn collection(&self, name: &str) -> Option<&EntityCollection> {
        self.collections.iter().find(|c| c.name() == name)
    }

    pub fn collection_mut(&mut self, name: &str) -> Option<&mut EntityCollection> {
        self.collections.iter_mut().find(|c| c.name() == name)
    }

    fn require_mut(&mut self, name: &str) -> Result<&mut EntityCollection, CacheError> {
        self.collection_mut(name)
            .ok_or_else(|| CacheError::UnknownCollection(name.to_string()))
    }

    /// Appends a fetched page to a collection.
    pub fn append_page(&mut self, name: &str, page: Vec<Entity>) -> Result<usize, CacheError> {
        Ok(self.require_mut(name)?.append_page(page))
    }

    /// Replaces a collection's contents after a full refetch.
    ///
    /// Refetched entities are no longer stale.
    pub fn replace_collection(&mut self, name: &str, entities: Vec<Entity>) -> Result<(), CacheError> {
        let collection = self.require_mut(name)?;
        let refetched: Vec<EntityId> = entities.iter().map(|e| e.id().clone()).collect();
        collection.replace_all(entities);
        for id in &refetched {
            self.stale.remove(id);
        }
        Ok(())
    }

    /// Checks whether any collection holds `id`.
    pub fn contains(&self, id: &EntityId) -> bool {
        self.collections.iter().any(|c| c.contains(id))
    }

    /// First cached copy of `id`, searching collections in order.
    pub fn find(&self, id: &EntityId) -> Option<&Entity> {
        self.collections.iter().find_map(|c| c.get(id))
    }

    /// Number of cached copies of `id` across all collections.
    pub fn copies(&self, id: &EntityId) -> usize {
        self.collections
            .iter()
            .flat_map(|c| c.entities())
            .filter(|entity| entity.id() == id)
            .count()
    }

    /// Names of collections awaiting a redraw.
    pub fn dirty_collections(&self) -> Vec<&str> {
        self.collections
            .iter()
            .filter(|c| c.is_dirty())
            .map(|c| c.name())
            .collect()
    }

    /// Whether anything awaits a redraw.
    pub fn is_dirty(&self) -> bool {
        self.collections.iter().any(|c| c.is_dirty())
    }

    /// Queues `id` for a detail refetch.
    pub fn mark_stale(&mut self, id: EntityId) -> bool {
        self.stale.insert(id)
    }

    pub fn is_stale(&self, id: &EntityId) -> bool {
        self.stale.contains(id)
    }

    /// Drains the refetch queue.
    pub fn take_stale(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.stale).into_iter().collect()
    }

    /// Forgets a queued refetch, e.g. after the entity was removed.
    pub(crate) fn clear_stale(&mut self, id: &EntityId) {
        self.stale.remove(id);
    }

    /// Remembers a removed comment. The first removal wins: a repeated
    /// delivery finds nothing left to restore.
    pub(crate) fn remember_removed(&mut self, removed: RemovedComment) {
        if self.removed.iter().any(|r| r.comment == removed.comment) {
            return;
        }
        while self.removed.len() >= REMOVED_COMMENT_CAPACITY {
            self.removed.pop_front();
        }
        self.removed.push_back(removed);
    }

    /// Takes the record of `comment` removed under `root`, if any.
    pub(crate) fn take_removed(&mut self, root: &EntityId, comment: &EntityId) -> Option<RemovedComment> {
        let index = self
            .removed
            .iter()
            .position(|r| &r.root == root && &r.comment == comment)?;
        self.removed.remove(index)
    }

    /// Drops records of comments under `id`, or of `id` itself.
    pub(crate) fn forget_removed(&mut self, id: &EntityId) {
        self.removed.retain(|r| &r.root != id && &r.comment != id);
    }

    /// Number of removed comments remembered.
    pub fn removed_len(&self) -> usize {
        self.removed.len()
    }
}
