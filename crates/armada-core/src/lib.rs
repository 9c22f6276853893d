//! Core types and definitions for the ARMADA fleet planner.
//!
//! This crate defines the vocabulary shared across all other crates:
//! geometry, the world snapshot, target references, motion commands,
//! configuration, the per-cycle scratch table and constants.
//! It has no dependency on any runtime or wire protocol.

pub mod commands;
pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod scratch;
pub mod snapshot;
pub mod target;
pub mod types;
