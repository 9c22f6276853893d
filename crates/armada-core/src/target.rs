//! Target references.
//!
//! A target is one of three kinds. Each is referenced by id (or anchor
//! index) and resolved against the snapshot when geometry is needed.

use serde::{Deserialize, Serialize};

use crate::enums::TargetKind;
use crate::snapshot::WorldSnapshot;
use crate::types::Position;

/// Reference to something a unit can be committed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetRef {
    /// A hostile mobile unit, by unit id.
    Hostile(u32),
    /// A resource node, by node id.
    Node(u32),
    /// One of the four arena anchors, by index.
    Anchor(usize),
}

/// Geometry of a resolved target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedTarget {
    pub position: Position,
    pub radius: f64,
    pub kind: TargetKind,
}

impl TargetRef {
    pub fn kind(&self) -> TargetKind {
        match self {
            TargetRef::Hostile(_) => TargetKind::HostileUnit,
            TargetRef::Node(_) => TargetKind::ResourceNode,
            TargetRef::Anchor(_) => TargetKind::Anchor,
        }
    }

    /// Look the target up in the snapshot. `None` if it no longer exists.
    pub fn resolve(&self, snapshot: &WorldSnapshot) -> Option<ResolvedTarget> {
        let kind = self.kind();
        match *self {
            TargetRef::Hostile(id) => snapshot.unit(id).map(|u| ResolvedTarget {
                position: u.position,
                radius: u.radius,
                kind,
            }),
            TargetRef::Node(id) => snapshot.node(id).map(|n| ResolvedTarget {
                position: n.position,
                radius: n.radius,
                kind,
            }),
            TargetRef::Anchor(index) => {
                snapshot.anchors().get(index).map(|p| ResolvedTarget {
                    position: *p,
                    radius: 0.0,
                    kind,
                })
            }
        }
    }

    pub fn position(&self, snapshot: &WorldSnapshot) -> Option<Position> {
        self.resolve(snapshot).map(|t| t.position)
    }
}
