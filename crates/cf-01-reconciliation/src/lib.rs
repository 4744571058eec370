//! # Reconciliation
//!
//! Per-screen entity cache and the rules that patch it from change events.
//!
//! A screen owns one `EntityCache`. Every change, whether the screen made it
//! or another screen published it, reaches the cache through the same
//! reducer: `apply_change`. Renderers then redraw the dirty collections from
//! the cache instead of patching rows themselves.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Counters never go below zero | `Engagement::decrement_comments`, `rules::remove_comment` |
//! | Like count moves only when the viewer flag flips | `Engagement::set_liked` |
//! | A deleted entity leaves every collection | `rules::remove_entity` |
//! | Unknown entities are a no-op | `EntityCollection::update_each` |
//! | Invalid events leave the cache untouched | `rules::apply_change` (validates first) |
//!
//! ## Comment Addressing
//!
//! ```text
//! path = []          → counter on the root entity, splice into thread(root, [])
//! path = [k1]        → counter on comment k1,      splice into thread(root, [k1])
//! path = [k1, k2]    → counter on comment k2,      splice into thread(root, [k1, k2])
//! ```

pub mod domain;

pub use domain::*;
