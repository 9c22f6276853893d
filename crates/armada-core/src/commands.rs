//! Motion commands emitted by the planner, one per controlled unit.

use serde::{Deserialize, Serialize};

/// The action a unit takes this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MotionCommand {
    /// Move at an integer speed in `0..=MAX_SPEED` along an integer heading in `0..360`.
    Thrust { unit_id: u32, speed: u32, heading: u32 },
    /// Dock at a resource node within dock range.
    Dock { unit_id: u32, node_id: u32 },
    /// Leave the node this unit is docked at.
    Undock { unit_id: u32 },
    /// Stay put this cycle.
    Hold { unit_id: u32 },
}

impl MotionCommand {
    pub fn unit_id(&self) -> u32 {
        match *self {
            MotionCommand::Thrust { unit_id, .. }
            | MotionCommand::Dock { unit_id, .. }
            | MotionCommand::Undock { unit_id }
            | MotionCommand::Hold { unit_id } => unit_id,
        }
    }

    pub fn is_hold(&self) -> bool {
        matches!(self, MotionCommand::Hold { .. })
    }
}
