//! User-facing alert copy for failed mutations.

use super::mutation::MutationKind;
use shared_types::errors::GatewayError;

/// A modal alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
    /// Whether the alert offers a retry button. Retrying is up to the user;
    /// nothing is retried automatically.
    pub retry: bool,
}

impl Alert {
    /// Copy for a failed `kind` mutation.
    pub fn for_failure(kind: MutationKind, error: &GatewayError) -> Self {
        match error {
            GatewayError::NotFound(_) => Self {
                title: "No Longer Available".to_string(),
                message: "This item has been deleted and can't be changed.".to_string(),
                retry: false,
            },
            GatewayError::Network(_) => Self {
                title: "Connection Problem".to_string(),
                message: format!(
                    "We couldn't {}. Check your connection and try again.",
                    kind.action_phrase()
                ),
                retry: true,
            },
            GatewayError::Validation(_) => Self {
                title: "Something Went Wrong".to_string(),
                message: format!("We couldn't {}.", kind.action_phrase()),
                retry: false,
            },
        }
    }
}
