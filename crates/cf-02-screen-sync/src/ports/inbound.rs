//! Inbound (Driving) ports for a screen.
//!
//! The user-action API. Every operation returns once the remote call has
//! resolved; the local change (for optimistic kinds) and its broadcast have
//! already happened by the time the remote call starts.

use crate::domain::{MutationError, MutationOutcome};
use async_trait::async_trait;
use shared_types::entities::{Comment, ConnectionPhase, Diagnosis, Entity, EntityId};

/// Mutations a user can trigger from a screen.
#[async_trait]
pub trait ScreenApi: Send + Sync {
    /// Flip the viewer's like on `id`, reading the current state from the
    /// cache.
    ///
    /// # Errors
    /// - `NotCached` if the screen holds no copy of `id`
    async fn toggle_like(&self, id: &EntityId) -> Result<MutationOutcome, MutationError>;

    /// Flip the viewer's bookmark on `id`.
    ///
    /// # Errors
    /// - `NotCached` if the screen holds no copy of `id`
    async fn toggle_bookmark(&self, id: &EntityId) -> Result<MutationOutcome, MutationError>;

    /// Add `comment` under `root` at `comment.path`.
    async fn add_comment(
        &self,
        root: &EntityId,
        comment: Comment,
    ) -> Result<MutationOutcome, MutationError>;

    /// Replace the body of an existing comment.
    async fn edit_comment(
        &self,
        root: &EntityId,
        comment: Comment,
    ) -> Result<MutationOutcome, MutationError>;

    /// Remove a cached comment. Re-added and re-broadcast if the remote call
    /// fails.
    ///
    /// # Errors
    /// - `NotCached` / `WrongKind` if `comment_id` is not a cached comment
    async fn remove_comment(
        &self,
        root: &EntityId,
        comment_id: &EntityId,
    ) -> Result<MutationOutcome, MutationError>;

    /// Move the viewer's relationship with `user` to `phase`. The previous
    /// phase is restored and re-broadcast if the remote call fails.
    ///
    /// # Errors
    /// - `NotCached` / `WrongKind` if `user` is not a cached user
    async fn change_connection(
        &self,
        user: &EntityId,
        phase: ConnectionPhase,
    ) -> Result<MutationOutcome, MutationError>;

    /// Soft-delete `id`. Removed everywhere only once the server agrees.
    async fn delete_entity(&self, id: &EntityId) -> Result<MutationOutcome, MutationError>;

    /// Persist a full replacement of an entity.
    async fn edit_entity(&self, entity: Entity) -> Result<MutationOutcome, MutationError>;

    /// Mark a case solved, optionally accepting a diagnosis.
    async fn mark_solved(
        &self,
        case: &EntityId,
        diagnosis: Option<Diagnosis>,
    ) -> Result<MutationOutcome, MutationError>;

    /// Record a new revision of a case.
    async fn add_revision(&self, case: &EntityId) -> Result<MutationOutcome, MutationError>;
}
