//! # Error Types
//!
//! Defines error types shared by the screens and the remote gateway.

use crate::entities::EntityId;
use thiserror::Error;

/// Failures reported by the remote mutation gateway.
///
/// Calls are at-most-once; none of these is retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The entity was deleted server-side since it was fetched.
    #[error("Entity not found: {0}")]
    NotFound(EntityId),

    /// Transient transport failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The request was malformed. The UI should never allow this.
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl GatewayError {
    /// Short label for logs and metrics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Network(_) => "network",
            Self::Validation(_) => "validation",
        }
    }

    /// Whether the user may sensibly retry the action.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}
