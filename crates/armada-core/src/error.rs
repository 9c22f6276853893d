//! Error types for snapshot ingestion and configuration.

use thiserror::Error;

/// Which kind of entity a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Unit,
    Node,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Unit => write!(f, "unit"),
            EntityKind::Node => write!(f, "node"),
        }
    }
}

/// A snapshot rejected before any planning starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("arena dimensions must be positive and finite, got {width}x{height}")]
    InvalidArena { width: f64, height: f64 },

    #[error("{kind} {id} has a non-finite coordinate")]
    NonFinitePosition { kind: EntityKind, id: u32 },

    #[error("{kind} {id} has invalid radius {radius}")]
    InvalidRadius { kind: EntityKind, id: u32, radius: f64 },

    #[error("{kind} {id} has invalid health {health}")]
    InvalidHealth { kind: EntityKind, id: u32, health: f64 },

    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: EntityKind, id: u32 },

    #[error("unit {unit} is docked to unknown node {node}")]
    UnknownNode { unit: u32, node: u32 },

    #[error("unit {unit} is marked docked but names no node")]
    MissingDockedNode { unit: u32 },
}

/// Planner configuration that could not be loaded or is inconsistent.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("posture {posture} has non-positive horizon {horizon}")]
    InvalidHorizon { posture: String, horizon: f64 },

    #[error("posture {posture} has non-positive combat ratio {ratio}")]
    InvalidCombatRatio { posture: String, ratio: f64 },

    #[error("deadline fractions must satisfy 0 <= soft <= hard <= fallback <= 1, got {soft}/{hard}/{fallback}")]
    InvalidDeadlines { soft: f64, hard: f64, fallback: f64 },
}
