//! Enumeration types used throughout the planner.

use serde::{Deserialize, Serialize};

/// Docking lifecycle of a unit relative to a resource node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DockingState {
    #[default]
    Undocked,
    Docking,
    Docked,
    Undocking,
}

impl DockingState {
    /// Anything other than `Undocked` is tied to a node and cannot move.
    pub fn is_docked(self) -> bool {
        !matches!(self, DockingState::Undocked)
    }
}

/// Coarse strategic posture chosen by the external strategy selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Posture {
    /// Two-player game, balanced expansion and aggression.
    #[default]
    Normal,
    /// Three or more opponents.
    MultiOpponent,
    /// Early all-in attack.
    Rush,
}

/// Coarse kind of a target, used for standoff and utility dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    HostileUnit,
    ResourceNode,
    Anchor,
}
