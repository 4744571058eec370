//! # Change Subscriber
//!
//! Defines the subscription side of the change bus.

use crate::envelope::ChangeEnvelope;
use crate::publisher::Registry;
use std::sync::{RwLock, Weak};
use thiserror::Error;
use tracing::debug;

/// Errors a subscriber may report while applying a delivery.
///
/// The bus logs these and moves on to the next subscriber; they never reach
/// the publisher.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriberError {
    /// The event could not be applied to the subscriber's cache.
    #[error("Reconciliation failed: {0}")]
    Reconcile(String),

    /// The subscriber is being torn down.
    #[error("Subscriber closed")]
    Closed,
}

/// What a subscriber did with a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The event changed at least one cached entity.
    Applied,
    /// The delivery was the subscriber's own echo and was skipped.
    Echo,
    /// The subscriber holds nothing the event refers to.
    Ignored,
}

/// A screen (or anything else) that reacts to published changes.
///
/// Deliveries run synchronously on the publisher's thread, in publish order.
pub trait ChangeSubscriber: Send + Sync {
    /// Name used in logs.
    fn label(&self) -> &str;

    /// Apply one delivery.
    fn on_change(&self, envelope: &ChangeEnvelope) -> Result<Delivery, SubscriberError>;
}

/// Identifier of a registration on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// A subscription handle.
///
/// When dropped, the subscription is automatically cleaned up.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,

    /// Reference to the bus registry (for cleanup).
    registry: Weak<RwLock<Registry>>,

    /// Subscriber label, for logs.
    label: String,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, registry: Weak<RwLock<Registry>>, label: String) -> Self {
        Self {
            id,
            registry,
            label,
        }
    }

    /// The registration id.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Label of the subscriber behind this handle.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Check whether the registration is still present on the bus.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .and_then(|registry| registry.read().ok().map(|r| r.contains(self.id)))
            .unwrap_or(false)
    }

    /// Unsubscribe explicitly. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // The bus may already be gone
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let Ok(mut registry) = registry.write() else {
            return;
        };

        registry.remove(self.id);
        debug!(subscriber = %self.label, id = self.id.0, "Subscription dropped");
    }
}
