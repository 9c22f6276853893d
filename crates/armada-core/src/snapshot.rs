//! World snapshot: the immutable per-cycle view of the arena.
//!
//! The snapshot is produced by the external protocol layer and consumed
//! read-only by the planner. It must pass [`WorldSnapshot::validate`] before
//! any planning begins.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::enums::{DockingState, Posture};
use crate::error::{EntityKind, ValidationError};
use crate::types::{centroid, Position};

fn default_unit_radius() -> f64 {
    UNIT_RADIUS
}

/// A mobile unit, friendly or hostile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: u32,
    /// Player id of the owning faction.
    pub owner: u32,
    pub position: Position,
    #[serde(default = "default_unit_radius")]
    pub radius: f64,
    pub health: f64,
    #[serde(default)]
    pub docking: DockingState,
    /// Node this unit is docking/docked/undocking at.
    #[serde(default)]
    pub docked_node: Option<u32>,
    #[serde(default)]
    pub weapon_cooldown: bool,
}

impl Unit {
    pub fn is_docked(&self) -> bool {
        self.docking.is_docked()
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}

/// A static resource node units can dock at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    pub id: u32,
    pub position: Position,
    pub radius: f64,
    pub health: f64,
    pub docking_slots: u32,
    /// Owning player, if any unit is docked.
    #[serde(default)]
    pub owner: Option<u32>,
    #[serde(default)]
    pub docked_units: Vec<u32>,
    /// Production the node can still yield. Zero means exhausted.
    #[serde(default)]
    pub remaining_production: f64,
}

impl ResourceNode {
    pub fn is_owned_by(&self, player: u32) -> bool {
        self.owner == Some(player)
    }

    /// Whether `unit` is close enough to dock.
    pub fn in_dock_range(&self, unit: &Position) -> bool {
        unit.is_within(&self.position, self.radius + DOCK_RADIUS)
    }
}

/// Everything the planner knows about the arena for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub turn: u32,
    pub width: f64,
    pub height: f64,
    /// Player id of the fleet being planned.
    pub my_id: u32,
    #[serde(default)]
    pub posture: Posture,
    /// Strategy flag: retreat towards the arena anchors.
    #[serde(default)]
    pub deserting: bool,
    /// Hostile unit the whole fleet is hunting.
    #[serde(default)]
    pub focus_target: Option<u32>,
    pub units: Vec<Unit>,
    pub nodes: Vec<ResourceNode>,
}

impl WorldSnapshot {
    pub fn unit(&self, id: u32) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn node(&self, id: u32) -> Option<&ResourceNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn is_mine(&self, unit: &Unit) -> bool {
        unit.owner == self.my_id
    }

    pub fn my_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(move |u| u.owner == self.my_id)
    }

    pub fn hostile_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(move |u| u.owner != self.my_id)
    }

    /// Our units that are free to move this cycle.
    pub fn my_undocked_units(&self) -> impl Iterator<Item = &Unit> {
        self.my_units().filter(|u| !u.is_docked())
    }

    pub fn mid_map(&self) -> Position {
        Position::new(self.width / 2.0, self.height / 2.0)
    }

    /// The four retreat anchors: arena corners inset by one unit.
    pub fn anchors(&self) -> [Position; 4] {
        let (w, h) = (self.width, self.height);
        [
            Position::new(1.0, 1.0),
            Position::new(w - 1.0, 1.0),
            Position::new(1.0, h - 1.0),
            Position::new(w - 1.0, h - 1.0),
        ]
    }

    /// Centroid of our fleet (all units, docked or not).
    pub fn fleet_centroid(&self) -> Option<Position> {
        self.centroid_of(self.my_id)
    }

    /// Centroid of one player's units.
    pub fn centroid_of(&self, player: u32) -> Option<Position> {
        let positions: Vec<&Position> = self
            .units
            .iter()
            .filter(|u| u.owner == player)
            .map(|u| &u.position)
            .collect();
        if positions.is_empty() {
            None
        } else {
            Some(centroid(positions))
        }
    }

    /// Distinct hostile player ids, in first-seen order.
    pub fn opponents(&self) -> Vec<u32> {
        let mut seen = Vec::new();
        for u in self.hostile_units() {
            if !seen.contains(&u.owner) {
                seen.push(u.owner);
            }
        }
        seen
    }

    /// Reject malformed input before any planning starts.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let arena_ok = self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0;
        if !arena_ok {
            return Err(ValidationError::InvalidArena {
                width: self.width,
                height: self.height,
            });
        }

        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            let kind = EntityKind::Node;
            if !node_ids.insert(node.id) {
                return Err(ValidationError::DuplicateId { kind, id: node.id });
            }
            if !node.position.is_finite() {
                return Err(ValidationError::NonFinitePosition { kind, id: node.id });
            }
            if !node.radius.is_finite() || node.radius <= 0.0 {
                return Err(ValidationError::InvalidRadius {
                    kind,
                    id: node.id,
                    radius: node.radius,
                });
            }
            if !node.health.is_finite() || node.health < 0.0 {
                return Err(ValidationError::InvalidHealth {
                    kind,
                    id: node.id,
                    health: node.health,
                });
            }
        }

        let mut unit_ids = HashSet::new();
        for unit in &self.units {
            let kind = EntityKind::Unit;
            if !unit_ids.insert(unit.id) {
                return Err(ValidationError::DuplicateId { kind, id: unit.id });
            }
            if !unit.position.is_finite() {
                return Err(ValidationError::NonFinitePosition { kind, id: unit.id });
            }
            if !unit.radius.is_finite() || unit.radius <= 0.0 {
                return Err(ValidationError::InvalidRadius {
                    kind,
                    id: unit.id,
                    radius: unit.radius,
                });
            }
            if !unit.health.is_finite() || unit.health < 0.0 {
                return Err(ValidationError::InvalidHealth {
                    kind,
                    id: unit.id,
                    health: unit.health,
                });
            }
            if unit.is_docked() {
                let node = unit
                    .docked_node
                    .ok_or(ValidationError::MissingDockedNode { unit: unit.id })?;
                if !node_ids.contains(&node) {
                    return Err(ValidationError::UnknownNode { unit: unit.id, node });
                }
            }
        }
        Ok(())
    }
}
