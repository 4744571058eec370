//! # Reconciliation Rules
//!
//! Applies one `ChangeEvent` to one screen's `EntityCache`.
//!
//! `apply_change` is total over the event variants and synchronous. An
//! event naming an entity the cache does not hold changes nothing and marks
//! nothing dirty.
//!
//! ## Counter Rules
//!
//! - Like counters move only when the viewer flag actually flips, so
//!   re-applying the same like is harmless.
//! - Comment counters never drop below zero.
//! - A comment event with an empty path counts against the root entity;
//!   otherwise only against the direct parent comment (`path.last`).
//! - Re-adding a comment this cache saw removed puts it back at its old
//!   positions and does not bump counters the removal left at zero.

use super::cache::{EntityCache, RemovedComment};
use super::errors::CacheError;
use shared_bus::events::{ChangeEvent, CommentAction};
use shared_types::entities::{Comment, CommentPath, ConnectionPhase, Diagnosis, Entity, EntityId};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// What a reconciliation touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Collections that changed and were marked dirty.
    pub touched: BTreeSet<String>,

    /// Entities removed across all collections.
    pub removed: usize,

    /// Counter decrements that hit the zero floor.
    pub clamped: usize,

    /// Entity newly queued for a detail refetch.
    pub refetch: Option<EntityId>,
}

impl ReconcileReport {
    /// True if the event had no effect on the cache.
    pub fn is_noop(&self) -> bool {
        self.touched.is_empty() && self.refetch.is_none()
    }

    fn touch(&mut self, name: &str) {
        self.touched.insert(name.to_string());
    }
}

/// Applies `event` to every collection of `cache`.
///
/// # Errors
/// - `PathMismatch` if a comment event's path disagrees with its comment
/// - `IdMismatch` if an edit event carries a different entity
///
/// Validation happens before any mutation, so an error leaves the cache
/// untouched.
pub fn apply_change(cache: &mut EntityCache, event: &ChangeEvent) -> Result<ReconcileReport, CacheError> {
    let report = match event {
        ChangeEvent::LikeChange { entity_id, did_like } => {
            update_all(cache, entity_id, |entity| entity.engagement_mut().set_liked(*did_like))
        }
        ChangeEvent::BookmarkChange {
            entity_id,
            did_bookmark,
        } => update_all(cache, entity_id, |entity| {
            entity.engagement_mut().set_bookmarked(*did_bookmark)
        }),
        ChangeEvent::CommentChange {
            entity_id,
            path,
            comment,
            action,
        } => {
            if &comment.path != path {
                return Err(CacheError::PathMismatch {
                    comment: comment.id.clone(),
                    expected: path.clone(),
                    found: comment.path.clone(),
                });
            }
            match action {
                CommentAction::Add => add_comment(cache, entity_id, path, comment),
                CommentAction::Remove => remove_comment(cache, entity_id, path, comment),
                CommentAction::Edit => edit_comment(cache, comment),
            }
        }
        ChangeEvent::VisibilityChange { entity_id } => remove_entity(cache, entity_id),
        ChangeEvent::RevisionChange { entity_id } => mark_revised(cache, entity_id),
        ChangeEvent::SolveChange {
            entity_id,
            diagnosis,
        } => solve_case(cache, entity_id, diagnosis.as_ref()),
        ChangeEvent::EditChange {
            entity_id,
            full_entity,
        } => {
            if full_entity.id() != entity_id {
                return Err(CacheError::IdMismatch {
                    expected: entity_id.clone(),
                    found: full_entity.id().clone(),
                });
            }
            replace_entity(cache, entity_id, full_entity)
        }
        ChangeEvent::ConnectionChange { user_id, phase } => set_connection(cache, user_id, *phase),
    };

    if report.is_noop() {
        debug!(kind = event.kind(), entity = %event.subject_id(), "Change not relevant to cache");
    } else {
        debug!(
            kind = event.kind(),
            entity = %event.subject_id(),
            touched = ?report.touched,
            removed = report.removed,
            "Change reconciled"
        );
    }

    Ok(report)
}

/// Runs `update` on every copy of `id`, recording touched collections.
fn update_all<F>(cache: &mut EntityCache, id: &EntityId, mut update: F) -> ReconcileReport
where
    F: FnMut(&mut Entity) -> bool,
{
    let mut report = ReconcileReport::default();
    for collection in cache.collections_mut() {
        if collection.update_each(id, &mut update) > 0 {
            report.touch(collection.name());
        }
    }
    report
}

/// The entity whose comment counter a comment at `path` under `root` affects.
fn counter_target<'a>(root: &'a EntityId, path: &'a CommentPath) -> &'a EntityId {
    path.last().unwrap_or(root)
}

/// Adds a comment. A comment this cache saw removed goes back where it was,
/// and counters its removal left at zero are not bumped.
fn add_comment(
    cache: &mut EntityCache,
    root: &EntityId,
    path: &CommentPath,
    comment: &Comment,
) -> ReconcileReport {
    let target = counter_target(root, path);
    let restored = cache.take_removed(root, &comment.id);
    let mut report = ReconcileReport::default();

    for collection in cache.collections_mut() {
        let skip_counter = restored
            .as_ref()
            .is_some_and(|r| r.clamped.contains(collection.name()));
        if !skip_counter {
            let bumped = collection.update_each(target, |entity| {
                entity.engagement_mut().increment_comments();
                true
            });
            if bumped > 0 {
                report.touch(collection.name());
            }
        }

        if collection.contains(&comment.id) {
            continue;
        }
        match restored.as_ref().and_then(|r| r.position_in(collection.name())) {
            Some(index) => collection.insert_at(index, Entity::Comment(comment.clone())),
            None if collection.is_thread_of(root, path) => {
                collection.insert_head(Entity::Comment(comment.clone()));
            }
            None => continue,
        }
        report.touch(collection.name());
    }

    if restored.is_some() {
        debug!(comment = %comment.id, "Removed comment restored in place");
    }
    report
}

fn remove_comment(
    cache: &mut EntityCache,
    root: &EntityId,
    path: &CommentPath,
    comment: &Comment,
) -> ReconcileReport {
    let target = counter_target(root, path);
    let mut report = ReconcileReport::default();
    let mut record = RemovedComment {
        root: root.clone(),
        comment: comment.id.clone(),
        positions: Vec::new(),
        clamped: BTreeSet::new(),
    };

    for collection in cache.collections_mut() {
        let name = collection.name().to_string();

        let mut clamped = 0;
        let decremented = collection.update_each(target, |entity| {
            if entity.engagement_mut().decrement_comments() {
                true
            } else {
                clamped += 1;
                false
            }
        });
        if decremented > 0 {
            report.touch(&name);
        }
        if clamped > 0 {
            report.clamped += clamped;
            record.clamped.insert(name.clone());
        }

        if let Some(index) = collection.position(&comment.id) {
            report.removed += collection.remove(&comment.id);
            record.positions.push((name.clone(), index));
            report.touch(&name);
        }
    }

    if report.clamped > 0 {
        debug!(entity = %target, clamped = report.clamped, "Comment counter already at zero");
    }
    if !report.is_noop() || report.clamped > 0 {
        cache.remember_removed(record);
    }
    report
}

fn edit_comment(cache: &mut EntityCache, comment: &Comment) -> ReconcileReport {
    update_all(cache, &comment.id, |entity| match entity {
        Entity::Comment(cached) if cached.body != comment.body => {
            // Engagement stays local: the editor's counters may be older
            cached.body = comment.body.clone();
            true
        }
        _ => false,
    })
}

fn remove_entity(cache: &mut EntityCache, id: &EntityId) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    for collection in cache.collections_mut() {
        let removed = collection.remove(id);
        // A deleted root orphans its comment threads
        let orphaned = if collection.is_thread_under(id) {
            collection.clear()
        } else {
            0
        };
        if removed + orphaned > 0 {
            report.removed += removed + orphaned;
            report.touch(collection.name());
        }
    }
    cache.clear_stale(id);
    cache.forget_removed(id);
    report
}

fn mark_revised(cache: &mut EntityCache, id: &EntityId) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    let holders: Vec<String> = cache
        .collections()
        .iter()
        .filter(|c| c.contains(id))
        .map(|c| c.name().to_string())
        .collect();
    if holders.is_empty() {
        return report;
    }

    for name in holders {
        if let Some(collection) = cache.collection_mut(&name) {
            collection.mark_dirty();
        }
        report.touched.insert(name);
    }
    if cache.mark_stale(id.clone()) {
        report.refetch = Some(id.clone());
    }
    report
}

fn solve_case(cache: &mut EntityCache, id: &EntityId, diagnosis: Option<&Diagnosis>) -> ReconcileReport {
    update_all(cache, id, |entity| match entity {
        Entity::Case(case) => {
            let changed = !case.solved || case.diagnosis.as_ref() != diagnosis;
            case.solved = true;
            if let Some(diagnosis) = diagnosis {
                case.diagnosis = Some(diagnosis.clone());
            }
            changed
        }
        other => {
            warn!(entity = %id, kind = other.kind().as_str(), "Solve event for non-case entity");
            false
        }
    })
}

fn replace_entity(cache: &mut EntityCache, id: &EntityId, full_entity: &Entity) -> ReconcileReport {
    update_all(cache, id, |entity| {
        if entity == full_entity {
            return false;
        }
        *entity = full_entity.clone();
        true
    })
}

fn set_connection(cache: &mut EntityCache, user_id: &EntityId, phase: ConnectionPhase) -> ReconcileReport {
    update_all(cache, user_id, |entity| match entity {
        Entity::User(user) if user.connection != phase => {
            user.connection = phase;
            true
        }
        _ => false,
    })
}
