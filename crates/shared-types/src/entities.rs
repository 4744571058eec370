//! # Core Domain Entities
//!
//! Defines the social entities every screen caches and mutates.
//!
//! ## Clusters
//!
//! - **Content**: `Case`, `Post`
//! - **Discussion**: `Comment`, `CommentPath`
//! - **People**: `User`, `ConnectionPhase`
//! - **Engagement**: `Engagement` (viewer-relative counters and flags)
//!
//! Entities are plain values. Each screen holds its own copies; nothing here
//! is shared by reference across screens.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Stable identifier of a case, post, comment or user.
///
/// All entity kinds share one identifier space, as the remote store does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    /// Create an identifier from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Chain of ancestor comment ids, root-most first, excluding the comment itself.
///
/// An empty path addresses a top-level comment on the parent entity.
pub type CommentPath = Vec<EntityId>;

// =============================================================================
// ENGAGEMENT
// =============================================================================

/// Viewer-relative engagement state carried by every entity.
///
/// Counters never go below zero: every decrement saturates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    /// Number of likes.
    pub like_count: u32,
    /// Whether the viewing user has liked the entity.
    pub liked_by_viewer: bool,
    /// Whether the viewing user has bookmarked the entity.
    pub bookmarked_by_viewer: bool,
    /// Top-level comments (for a comment: its direct replies).
    pub comment_count: u32,
}

impl Engagement {
    /// Set the viewer's like flag, adjusting the counter by one.
    ///
    /// Returns `false` (and changes nothing) if the flag already matches.
    pub fn set_liked(&mut self, liked: bool) -> bool {
        if self.liked_by_viewer == liked {
            return false;
        }
        self.liked_by_viewer = liked;
        self.like_count = if liked {
            self.like_count.saturating_add(1)
        } else {
            self.like_count.saturating_sub(1)
        };
        true
    }

    /// Set the viewer's bookmark flag. Returns whether it changed.
    pub fn set_bookmarked(&mut self, bookmarked: bool) -> bool {
        if self.bookmarked_by_viewer == bookmarked {
            return false;
        }
        self.bookmarked_by_viewer = bookmarked;
        true
    }

    /// Count one more comment.
    pub fn increment_comments(&mut self) {
        self.comment_count = self.comment_count.saturating_add(1);
    }

    /// Count one comment fewer, never dropping below zero.
    ///
    /// Returns `false` if the counter was already at zero.
    pub fn decrement_comments(&mut self) -> bool {
        if self.comment_count == 0 {
            return false;
        }
        self.comment_count -= 1;
        true
    }
}

// =============================================================================
// CONTENT
// =============================================================================

/// Who can see a case, and whether it has been soft-deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    /// Shown with the author's identity.
    #[default]
    Public,
    /// Shown without the author's identity.
    Anonymous,
    /// Soft-deleted; must not be shown anywhere.
    Deleted,
}

/// A diagnosis accepted as the solution of a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    /// The revision that carried the accepted diagnosis.
    pub revision_id: EntityId,
    /// Free-text diagnosis.
    pub text: String,
}

/// A clinical case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub id: EntityId,
    pub author: EntityId,
    pub title: String,
    pub body: String,
    pub visibility: Visibility,
    /// Number of revisions appended after the original publication.
    pub revision: u32,
    pub solved: bool,
    pub diagnosis: Option<Diagnosis>,
    pub engagement: Engagement,
}

impl Case {
    /// Create an unsolved, public case with no engagement.
    pub fn new(id: impl Into<EntityId>, author: impl Into<EntityId>, title: &str) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            title: title.to_string(),
            body: String::new(),
            visibility: Visibility::Public,
            revision: 0,
            solved: false,
            diagnosis: None,
            engagement: Engagement::default(),
        }
    }
}

/// A free-form post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: EntityId,
    pub author: EntityId,
    pub body: String,
    pub visibility: Visibility,
    /// Set once the author has edited the post.
    pub edited: bool,
    pub engagement: Engagement,
}

impl Post {
    /// Create an unedited public post with no engagement.
    pub fn new(id: impl Into<EntityId>, author: impl Into<EntityId>, body: &str) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            body: body.to_string(),
            visibility: Visibility::Public,
            edited: false,
            engagement: Engagement::default(),
        }
    }
}

// =============================================================================
// DISCUSSION
// =============================================================================

/// A comment on a case or post, possibly nested under other comments.
///
/// `engagement.comment_count` counts this comment's direct replies, which is
/// distinct from the parent entity's top-level comment counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: EntityId,
    pub author: EntityId,
    pub body: String,
    pub path: CommentPath,
    pub engagement: Engagement,
}

impl Comment {
    pub fn new(
        id: impl Into<EntityId>,
        author: impl Into<EntityId>,
        body: &str,
        path: CommentPath,
    ) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            body: body.to_string(),
            path,
            engagement: Engagement::default(),
        }
    }

    /// Nesting depth; zero for a top-level comment.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// The comment this one replies to, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&EntityId> {
        self.path.last()
    }
}

// =============================================================================
// PEOPLE
// =============================================================================

/// Relationship between a user and the viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionPhase {
    #[default]
    Unconnected,
    /// The viewer sent a request that is still pending.
    Requested,
    /// The user sent the viewer a request that is still pending.
    Received,
    Connected,
}

/// A user profile as shown in people lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub name: String,
    pub connection: ConnectionPhase,
    pub engagement: Engagement,
}

impl User {
    pub fn new(id: impl Into<EntityId>, name: &str) -> Self {
        Self {
            id: id.into(),
            name: name.to_string(),
            connection: ConnectionPhase::Unconnected,
            engagement: Engagement::default(),
        }
    }
}

// =============================================================================
// POLYMORPHIC ENTITY
// =============================================================================

/// Discriminant of [`Entity`], used for logging and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Case,
    Post,
    Comment,
    User,
}

impl EntityKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Case => "case",
            Self::Post => "post",
            Self::Comment => "comment",
            Self::User => "user",
        }
    }
}

/// Any cacheable entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entity {
    Case(Case),
    Post(Post),
    Comment(Comment),
    User(User),
}

impl Entity {
    #[must_use]
    pub fn id(&self) -> &EntityId {
        match self {
            Self::Case(case) => &case.id,
            Self::Post(post) => &post.id,
            Self::Comment(comment) => &comment.id,
            Self::User(user) => &user.id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Case(_) => EntityKind::Case,
            Self::Post(_) => EntityKind::Post,
            Self::Comment(_) => EntityKind::Comment,
            Self::User(_) => EntityKind::User,
        }
    }

    #[must_use]
    pub fn engagement(&self) -> &Engagement {
        match self {
            Self::Case(case) => &case.engagement,
            Self::Post(post) => &post.engagement,
            Self::Comment(comment) => &comment.engagement,
            Self::User(user) => &user.engagement,
        }
    }

    pub fn engagement_mut(&mut self) -> &mut Engagement {
        match self {
            Self::Case(case) => &mut case.engagement,
            Self::Post(post) => &mut post.engagement,
            Self::Comment(comment) => &mut comment.engagement,
            Self::User(user) => &mut user.engagement,
        }
    }

    #[must_use]
    pub fn as_comment(&self) -> Option<&Comment> {
        match self {
            Self::Comment(comment) => Some(comment),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_case(&self) -> Option<&Case> {
        match self {
            Self::Case(case) => Some(case),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_user(&self) -> Option<&User> {
        match self {
            Self::User(user) => Some(user),
            _ => None,
        }
    }
}

impl From<Case> for Entity {
    fn from(value: Case) -> Self {
        Self::Case(value)
    }
}

impl From<Post> for Entity {
    fn from(value: Post) -> Self {
        Self::Post(value)
    }
}

impl From<Comment> for Entity {
    fn from(value: Comment) -> Self {
        Self::Comment(value)
    }
}

impl From<User> for Entity {
    fn from(value: User) -> Self {
        Self::User(value)
    }
}
