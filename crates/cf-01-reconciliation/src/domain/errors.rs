//! Entity cache error types.

use shared_types::entities::{CommentPath, EntityId};
use thiserror::Error;

/// Errors raised while building or reconciling an entity cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// A collection with this name is already registered.
    #[error("Duplicate collection: {0}")]
    DuplicateCollection(String),

    /// No collection with this name exists.
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// A comment event's path disagrees with the comment it carries.
    #[error("Comment {comment} carries path {found:?}, event path is {expected:?}")]
    PathMismatch {
        comment: EntityId,
        expected: CommentPath,
        found: CommentPath,
    },

    /// A full-entity replacement names a different entity than its event.
    #[error("Replacement entity {found} does not match event entity {expected}")]
    IdMismatch { expected: EntityId, found: EntityId },
}
