//! # Change Envelope
//!
//! Wraps every `ChangeEvent` on its way through the bus.
//!
//! The `origin_id` is generated by whoever publishes. The publishing screen
//! remembers it so it can recognise the echo of its own publish; no other
//! screen can tell where an event came from.

use crate::events::ChangeEvent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Correlation id attached to a single publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OriginId(pub Uuid);

impl OriginId {
    /// Generate a fresh, random origin id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A change event as delivered by the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEnvelope {
    /// Correlation id of this publish.
    pub origin_id: OriginId,

    /// Unix timestamp (milliseconds) when the envelope was created.
    pub published_at: u64,

    /// The mutation itself.
    pub event: ChangeEvent,
}

impl ChangeEnvelope {
    /// Wrap an event under a freshly generated origin id.
    #[must_use]
    pub fn new(event: ChangeEvent) -> Self {
        Self::with_origin(OriginId::generate(), event)
    }

    /// Wrap an event under an origin id the caller already holds.
    #[must_use]
    pub fn with_origin(origin_id: OriginId, event: ChangeEvent) -> Self {
        Self {
            origin_id,
            published_at: current_millis(),
            event,
        }
    }
}

fn current_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
