//! # Domain Layer - Screen Sync
//!
//! - `mutation`: MutationKind, RollbackPolicy, MutationRequest, MutationOutcome
//! - `alerts`: Alert copy per gateway failure
//! - `errors`: MutationError

pub mod alerts;
pub mod errors;
pub mod mutation;

pub use alerts::*;
pub use errors::*;
pub use mutation::*;
