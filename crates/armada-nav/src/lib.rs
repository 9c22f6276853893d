//! Collision prediction and obstacle-avoiding navigation.
//!
//! Pure geometry over a [`WorldSnapshot`](armada_core::snapshot::WorldSnapshot)
//! and the current cycle's scratch table. Nothing here mutates state; the
//! planner records the courses it accepts.

pub mod airspace;
pub mod collision;
pub mod navigator;

pub use armada_core as core;
pub use navigator::{Course, Goal, GoalKind, Mover, NavOptions, Navigator, Steering};

#[cfg(test)]
mod tests;
