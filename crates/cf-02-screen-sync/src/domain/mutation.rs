//! # Mutation Kinds and Policies
//!
//! Every user action a screen can persist, with its timing and what happens
//! locally when the remote call fails.
//!
//! | Kind | Timing | On failure |
//! |------|--------|------------|
//! | Like, Bookmark | optimistic | alert, left inconsistent |
//! | CommentAdd, CommentEdit | optimistic | alert, left inconsistent |
//! | CommentRemove | optimistic | alert, re-add and broadcast |
//! | Connection | optimistic | alert, restore phase and broadcast |
//! | Delete, Edit, Solve, Revision | after success | alert only |

use shared_types::entities::{Comment, CommentPath, ConnectionPhase, Diagnosis, Entity, EntityId};

/// A persisted user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Like,
    Bookmark,
    CommentAdd,
    CommentEdit,
    CommentRemove,
    Connection,
    Delete,
    Edit,
    Solve,
    Revision,
}

/// When the local change happens and how a failure is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackPolicy {
    /// Applied before the remote call; a failure is left in place until the
    /// next full refetch.
    LeaveInconsistent,
    /// Applied before the remote call; a failure is undone locally and the
    /// undo is broadcast.
    Corrective,
    /// Applied and broadcast only after the remote call succeeds.
    SuccessDriven,
}

impl MutationKind {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Bookmark => "bookmark",
            Self::CommentAdd => "comment_add",
            Self::CommentEdit => "comment_edit",
            Self::CommentRemove => "comment_remove",
            Self::Connection => "connection",
            Self::Delete => "delete",
            Self::Edit => "edit",
            Self::Solve => "solve",
            Self::Revision => "revision",
        }
    }

    pub fn policy(&self) -> RollbackPolicy {
        match self {
            Self::Like | Self::Bookmark | Self::CommentAdd | Self::CommentEdit => {
                RollbackPolicy::LeaveInconsistent
            }
            Self::CommentRemove | Self::Connection => RollbackPolicy::Corrective,
            Self::Delete | Self::Edit | Self::Solve | Self::Revision => {
                RollbackPolicy::SuccessDriven
            }
        }
    }

    /// Whether the local change precedes the remote call.
    pub fn is_optimistic(&self) -> bool {
        self.policy() != RollbackPolicy::SuccessDriven
    }

    /// Phrase completing "We couldn't ..." in alerts.
    pub fn action_phrase(&self) -> &'static str {
        match self {
            Self::Like => "update your like",
            Self::Bookmark => "update your bookmark",
            Self::CommentAdd => "post your comment",
            Self::CommentEdit => "save your comment",
            Self::CommentRemove => "delete your comment",
            Self::Connection => "update this connection",
            Self::Delete => "delete this item",
            Self::Edit => "save your changes",
            Self::Solve => "mark this case as solved",
            Self::Revision => "add this revision",
        }
    }
}

/// What the gateway is asked to persist.
///
/// Like and bookmark carry the state *before* the toggle: the remote API
/// flips from the state it is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationPayload {
    UndoLike { was_liked: bool },
    UndoBookmark { was_bookmarked: bool },
    Comment { path: CommentPath, comment: Comment },
    RemoveComment { path: CommentPath, comment_id: EntityId },
    Connection { phase: ConnectionPhase },
    Entity(Entity),
    Solve { diagnosis: Option<Diagnosis> },
    Empty,
}

/// One call to the remote gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRequest {
    pub kind: MutationKind,
    pub entity_id: EntityId,
    pub payload: MutationPayload,
}

impl MutationRequest {
    pub fn new(kind: MutationKind, entity_id: EntityId, payload: MutationPayload) -> Self {
        Self {
            kind,
            entity_id,
            payload,
        }
    }
}

/// How a mutation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The remote service accepted it; local state and other screens agree.
    Confirmed,
    /// The remote call failed and the local change was undone and broadcast.
    RolledBack,
    /// The remote call failed; the optimistic change stays until a refetch.
    LeftInconsistent,
    /// The remote call failed before anything was applied.
    Rejected,
}

impl MutationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::RolledBack => "rolled_back",
            Self::LeftInconsistent => "left_inconsistent",
            Self::Rejected => "rejected",
        }
    }

    /// Outcome of a failed remote call under `policy`.
    pub fn on_failure(policy: RollbackPolicy) -> Self {
        match policy {
            RollbackPolicy::LeaveInconsistent => Self::LeftInconsistent,
            RollbackPolicy::Corrective => Self::RolledBack,
            RollbackPolicy::SuccessDriven => Self::Rejected,
        }
    }
}
