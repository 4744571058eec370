//! # Shared Types Crate
//!
//! This crate contains the social entities every screen caches and the
//! error taxonomy of the remote mutation gateway.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate entity types are defined here.
//! - **Copy Semantics**: Entities are values; each screen owns its own copies
//!   and reconciles them through change events, never through shared references.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
