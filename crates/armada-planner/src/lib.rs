//! Per-cycle fleet planning.
//!
//! Scores targets for every unit, tracks how much strength each target has
//! drawn, moves clusters as one body, manoeuvres units caught at close
//! quarters and degrades to cheap fallback commands when the cycle's
//! wall-clock budget runs short.

pub mod capacity;
pub mod clock;
pub mod cluster;
pub mod memory;
pub mod neighbours;
pub mod params;
pub mod scheduler;
pub mod skirmish;
pub mod utility;

pub use armada_core as core;
pub use clock::TurnClock;
pub use scheduler::{CyclePlan, Planner};
