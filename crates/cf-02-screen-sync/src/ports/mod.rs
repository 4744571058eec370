//! Ports layer: `inbound` is what drives a screen, `outbound` is what a
//! screen drives.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
