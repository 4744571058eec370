//! Adapters layer: connects a screen to the change bus.

pub mod bus;
