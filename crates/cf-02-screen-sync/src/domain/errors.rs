//! Screen mutation error types.

use cf_01_reconciliation::CacheError;
use shared_types::entities::{EntityId, EntityKind};
use thiserror::Error;

/// Errors that stop a mutation before anything is applied or sent.
///
/// Remote failures are not errors here: they are reported through
/// `MutationOutcome` and the alert presenter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// The screen holds no copy to read the current state from.
    #[error("Entity {0} is not cached on this screen")]
    NotCached(EntityId),

    /// The cached entity is not of the kind the mutation needs.
    #[error("Entity {id} is a {found:?}, expected {expected:?}")]
    WrongKind {
        id: EntityId,
        expected: EntityKind,
        found: EntityKind,
    },

    /// The local reconciliation rejected the change.
    #[error("Local apply failed: {0}")]
    Cache(#[from] CacheError),
}
