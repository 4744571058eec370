//! # Change Events
//!
//! Defines every mutation that flows through the change bus. Each variant is
//! self-contained: a screen can apply it to its own cached copies without
//! fetching anything, except `RevisionChange`, which only tells consumers to
//! refetch detail.
//!
//! Events never say which screen produced them. Screens tell their own
//! echoes apart through the origin id on the envelope (see `envelope.rs`).

use serde::{Deserialize, Serialize};
use shared_types::entities::{Comment, CommentPath, ConnectionPhase, Diagnosis, Entity, EntityId};

/// What happened to a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommentAction {
    Add,
    Remove,
    Edit,
}

impl CommentAction {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Edit => "edit",
        }
    }
}

/// All mutations that can be published to the change bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeEvent {
    // =========================================================================
    // ENGAGEMENT
    // =========================================================================
    /// The viewer liked or unliked an entity.
    LikeChange {
        entity_id: EntityId,
        /// The new viewer-relative state.
        did_like: bool,
    },

    /// The viewer bookmarked or un-bookmarked an entity.
    BookmarkChange {
        entity_id: EntityId,
        did_bookmark: bool,
    },

    // =========================================================================
    // COMMENTS
    // =========================================================================
    /// A comment was added, removed or edited under `entity_id`.
    ///
    /// `path` locates the comment: empty for a top-level comment, otherwise
    /// the ancestor chain whose last element is the direct parent.
    CommentChange {
        entity_id: EntityId,
        path: CommentPath,
        comment: Comment,
        action: CommentAction,
    },

    // =========================================================================
    // LIFECYCLE
    // =========================================================================
    /// The entity was soft-deleted and must leave every cache.
    VisibilityChange { entity_id: EntityId },

    /// A case gained a revision. Consumers refetch detail rather than patch.
    RevisionChange { entity_id: EntityId },

    /// A case was solved, optionally with the accepted diagnosis.
    SolveChange {
        entity_id: EntityId,
        diagnosis: Option<Diagnosis>,
    },

    /// Full replacement after an edit touching more than counters.
    EditChange {
        entity_id: EntityId,
        full_entity: Entity,
    },

    // =========================================================================
    // CONNECTIONS
    // =========================================================================
    /// A user's relationship phase with the viewer changed.
    ConnectionChange {
        user_id: EntityId,
        phase: ConnectionPhase,
    },
}

impl ChangeEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> ChangeTopic {
        match self {
            Self::LikeChange { .. } | Self::BookmarkChange { .. } => ChangeTopic::Engagement,
            Self::CommentChange { .. } => ChangeTopic::Comments,
            Self::VisibilityChange { .. }
            | Self::RevisionChange { .. }
            | Self::SolveChange { .. }
            | Self::EditChange { .. } => ChangeTopic::Lifecycle,
            Self::ConnectionChange { .. } => ChangeTopic::Connections,
        }
    }

    /// The entity (or user) the event is about.
    #[must_use]
    pub fn subject_id(&self) -> &EntityId {
        match self {
            Self::LikeChange { entity_id, .. }
            | Self::BookmarkChange { entity_id, .. }
            | Self::CommentChange { entity_id, .. }
            | Self::VisibilityChange { entity_id }
            | Self::RevisionChange { entity_id }
            | Self::SolveChange { entity_id, .. }
            | Self::EditChange { entity_id, .. } => entity_id,
            Self::ConnectionChange { user_id, .. } => user_id,
        }
    }

    /// Short variant label for logs and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LikeChange { .. } => "like",
            Self::BookmarkChange { .. } => "bookmark",
            Self::CommentChange { .. } => "comment",
            Self::VisibilityChange { .. } => "visibility",
            Self::RevisionChange { .. } => "revision",
            Self::SolveChange { .. } => "solve",
            Self::EditChange { .. } => "edit",
            Self::ConnectionChange { .. } => "connection",
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeTopic {
    /// Likes and bookmarks.
    Engagement,
    /// Comment add/remove/edit.
    Comments,
    /// Visibility, revision, solve and full edits.
    Lifecycle,
    /// Relationship phase changes.
    Connections,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<ChangeTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<ChangeTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&ChangeTopic::All)
            || self.topics.contains(&event.topic())
    }
}
