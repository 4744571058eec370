//! # Screen Sync
//!
//! Keeps every screen's cached entities consistent with the mutations made
//! on any screen.
//!
//! ## Responsibilities
//!
//! - Subscribe each screen to the shared `ChangeBus` for its lifetime
//! - Skip a screen's own echoes (`EchoGuard`) and reconcile everything else
//! - Run user mutations optimistically or after success, per kind
//! - Surface remote failures as alerts and roll back where a kind allows it
//!
//! ## Guarantees
//!
//! | Guarantee | Enforcement Location |
//! |-----------|---------------------|
//! | Own mutation applied exactly once | `service.rs` - `apply_and_publish()`, `adapters/bus.rs` - echo check |
//! | Toggles read the cached state | `service.rs` - `engagement_of()` |
//! | Gateway errors never reach the bus | `service.rs` - `persist()` |
//! | Unsubscribe on teardown | `service.rs` - subscription dropped with the screen |
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  adapters/bus.rs   - ChangeSubscriber impl (echo guard + reducer)│
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ports/inbound.rs  - ScreenApi trait                            │
//! │  ports/outbound.rs - MutationGateway, AlertPresenter,           │
//! │                      RenderSurface                              │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  domain/mutation.rs - MutationKind, RollbackPolicy, outcomes    │
//! │  domain/alerts.rs   - Alert copy                                │
//! │  domain/errors.rs   - MutationError                             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::ScreenConfig;
pub use domain::*;
pub use ports::*;
pub use service::Screen;
