//! # Entity Collection
//!
//! One ordered, lazily paginated list of entity snapshots as a screen shows
//! it: a feed ("for you", "latest", bookmarks, people) or the comment thread
//! of one entity at one nesting level.

use shared_types::entities::{CommentPath, Entity, EntityId};

/// What a collection holds, which decides how comment events affect it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionKind {
    /// Any entities, in fetch order.
    Feed,
    /// Comments of `root` located at `path` (empty path: top-level comments).
    Thread { root: EntityId, path: CommentPath },
}

/// An ordered collection of entity snapshots with a dirty flag.
#[derive(Debug, Clone)]
pub struct EntityCollection {
    name: String,
    kind: CollectionKind,
    entities: Vec<Entity>,
    dirty: bool,
}

impl EntityCollection {
    /// Create an empty feed collection.
    pub fn feed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: CollectionKind::Feed,
            entities: Vec::new(),
            dirty: false,
        }
    }

    /// Create an empty comment thread collection.
    pub fn thread(name: impl Into<String>, root: EntityId, path: CommentPath) -> Self {
        Self {
            name: name.into(),
            kind: CollectionKind::Thread { root, path },
            entities: Vec::new(),
            dirty: false,
        }
    }

    /// Builder-style initial contents.
    #[must_use]
    pub fn with_entities(mut self, entities: impl IntoIterator<Item = Entity>) -> Self {
        self.entities.extend(entities);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &CollectionKind {
        &self.kind
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether this collection needs a redraw.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clear the dirty flag, returning its previous value.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// True if this is the thread of `root` at exactly `path`.
    pub fn is_thread_of(&self, root: &EntityId, path: &CommentPath) -> bool {
        match &self.kind {
            CollectionKind::Thread {
                root: thread_root,
                path: thread_path,
            } => thread_root == root && thread_path == path,
            CollectionKind::Feed => false,
        }
    }

    /// True if this is any thread under `root`.
    pub fn is_thread_under(&self, root: &EntityId) -> bool {
        matches!(&self.kind, CollectionKind::Thread { root: r, .. } if r == root)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.iter().any(|entity| entity.id() == id)
    }

    /// First copy of `id` in display order.
    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id() == id)
    }

    pub fn position(&self, id: &EntityId) -> Option<usize> {
        self.entities.iter().position(|entity| entity.id() == id)
    }

    /// Apply `update` to every copy of `id`; marks the collection dirty if any
    /// call reports a change. Returns the number of changed copies.
    pub fn update_each<F>(&mut self, id: &EntityId, mut update: F) -> usize
    where
        F: FnMut(&mut Entity) -> bool,
    {
        let mut changed = 0;
        for entity in self.entities.iter_mut().filter(|entity| entity.id() == id) {
            if update(entity) {
                changed += 1;
            }
        }
        if changed > 0 {
            self.dirty = true;
        }
        changed
    }

    /// Remove every copy of `id`. Returns how many were removed.
    pub fn remove(&mut self, id: &EntityId) -> usize {
        let before = self.entities.len();
        self.entities.retain(|entity| entity.id() != id);
        let removed = before - self.entities.len();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    /// Splice an entity in at the head (newest first).
    pub fn insert_head(&mut self, entity: Entity) {
        self.entities.insert(0, entity);
        self.dirty = true;
    }

    /// Insert at `index`, clamped to the current length.
    pub fn insert_at(&mut self, index: usize, entity: Entity) {
        let index = index.min(self.entities.len());
        self.entities.insert(index, entity);
        self.dirty = true;
    }

    /// Append the next fetched page, skipping ids already present.
    pub fn append_page(&mut self, page: impl IntoIterator<Item = Entity>) -> usize {
        let mut appended = 0;
        for entity in page {
            if self.contains(entity.id()) {
                continue;
            }
            self.entities.push(entity);
            appended += 1;
        }
        if appended > 0 {
            self.dirty = true;
        }
        appended
    }

    /// Replace the contents after a full refetch.
    pub fn replace_all(&mut self, entities: Vec<Entity>) {
        self.entities = entities;
        self.dirty = true;
    }

    /// Drop every entity.
    pub fn clear(&mut self) -> usize {
        let removed = self.entities.len();
        self.entities.clear();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }
}
