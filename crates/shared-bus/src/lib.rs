//! # Shared Bus - Change Bus for Cross-Screen Propagation
//!
//! Carries typed mutation events from the screen that performed a mutation
//! to every other screen holding a cached copy of the mutated entity.
//!
//! ## Rules
//!
//! - Screens never share entity references; they exchange `ChangeEvent`s only.
//! - Delivery is synchronous, in publish order, on the publisher's thread.
//! - The publisher also receives its own event and skips it via its
//!   `EchoGuard`.
//! - Fire and forget: nothing is persisted or replayed to late subscribers.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │   Screen A   │                    │   Screen B   │
//! │ (optimistic) │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!        ↑               ▼                    ↑
//!        │         ┌──────────────┐          │
//!        └─ echo ──│  Change Bus  │ ─────────┘
//!                  │              │  on_change()
//!                  └──────────────┘
//! ```
//!
//! ## Failure Isolation
//!
//! A subscriber that errors or panics while applying a change is logged and
//! skipped; fan-out to the remaining subscribers continues.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod echo_guard;
pub mod envelope;
pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use echo_guard::{EchoGuard, EchoGuardConfig, EchoStrategy, EchoVerdict};
pub use envelope::{ChangeEnvelope, OriginId};
pub use events::{ChangeEvent, ChangeTopic, CommentAction, EventFilter};
pub use publisher::{ChangeBus, ChangePublisher, PublishReport};
pub use subscriber::{ChangeSubscriber, Delivery, SubscriberError, Subscription, SubscriptionId};
