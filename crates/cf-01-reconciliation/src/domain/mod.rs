//! # Domain Layer - Reconciliation
//!
//! Pure cache logic with no I/O and no bus access.
//!
//! ## Components
//!
//! - `collection`: EntityCollection, CollectionKind
//! - `cache`: EntityCache (collections, refetch queue, removed comments)
//! - `rules`: apply_change, ReconcileReport
//! - `errors`: CacheError

pub mod cache;
pub mod collection;
pub mod errors;
pub mod rules;

pub use cache::*;
pub use collection::*;
pub use errors::*;
pub use rules::*;
