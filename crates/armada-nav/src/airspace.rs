//! Obstacle scan: find the first body a straight-line move would hit.

use armada_core::constants::UNIT_RADIUS;
use armada_core::scratch::CycleScratch;
use armada_core::snapshot::{Unit, WorldSnapshot};
use armada_core::types::Position;
use glam::DVec2;

use crate::collision::{predict_with_velocity, Obstacle};

/// Identity of something that can block a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObstacleRef {
    Node(u32),
    Unit(u32),
}

/// The earliest predicted contact along a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub obstacle: ObstacleRef,
    pub geometry: Obstacle,
    pub time: f64,
    /// Node the blocking unit is tied to, if it is docked.
    pub docked_node: Option<u32>,
    pub friendly: bool,
}

impl Contact {
    pub fn is_moving_friend(&self) -> bool {
        self.friendly && self.geometry.end.is_some()
    }
}

/// Parameters of one scan.
#[derive(Debug, Clone, Copy)]
pub struct Scan<'s> {
    pub origin: Position,
    pub radius: f64,
    pub velocity: DVec2,
    pub fudge: f64,
    /// Unit ids that never block (the mover, or a cluster's members).
    pub members: &'s [u32],
    /// Obstacles already accounted for (the goal, a body just avoided).
    pub skip: &'s [ObstacleRef],
    /// Undocked hostiles block too.
    pub avoid_hostiles: bool,
}

/// Read-only view of everything that can block movement this cycle.
pub struct Airspace<'a> {
    snapshot: &'a WorldSnapshot,
    scratch: &'a CycleScratch,
}

impl<'a> Airspace<'a> {
    pub fn new(snapshot: &'a WorldSnapshot, scratch: &'a CycleScratch) -> Self {
        Self { snapshot, scratch }
    }

    pub fn snapshot(&self) -> &'a WorldSnapshot {
        self.snapshot
    }

    pub fn scratch(&self) -> &'a CycleScratch {
        self.scratch
    }

    /// The obstacle hit first along the scanned path. Ties keep the first found.
    pub fn closest_obstacle(&self, scan: &Scan<'_>) -> Option<Contact> {
        let mut best: Option<Contact> = None;
        let mut consider = |contact: Contact| {
            if best.map_or(true, |b| contact.time < b.time) {
                best = Some(contact);
            }
        };

        for node in &self.snapshot.nodes {
            let id = ObstacleRef::Node(node.id);
            if scan.skip.contains(&id) {
                continue;
            }
            let geometry = Obstacle::stationary(node.position, node.radius);
            if let Some(time) = self.hit(scan, &geometry) {
                consider(Contact {
                    obstacle: id,
                    geometry,
                    time,
                    docked_node: None,
                    friendly: false,
                });
            }
        }

        for unit in &self.snapshot.units {
            let id = ObstacleRef::Unit(unit.id);
            if scan.members.contains(&unit.id) || scan.skip.contains(&id) {
                continue;
            }
            let friendly = self.snapshot.is_mine(unit);
            if !friendly && !unit.is_docked() && !scan.avoid_hostiles {
                continue;
            }

            let geometry = match (friendly, self.scratch.planned(unit.id)) {
                (true, Some(planned)) => Obstacle::moving(unit.position, unit.radius, planned.end),
                _ => Obstacle::stationary(unit.position, unit.radius),
            };
            let time = self
                .hit(scan, &geometry)
                .or_else(|| self.phantom_hit(scan, unit, friendly));

            if let Some(time) = time {
                consider(Contact {
                    obstacle: id,
                    geometry,
                    time,
                    docked_node: unit.docked_node.filter(|_| unit.is_docked()),
                    friendly,
                });
            }
        }
        best
    }

    fn hit(&self, scan: &Scan<'_>, obstacle: &Obstacle) -> Option<f64> {
        predict_with_velocity(&scan.origin, scan.radius, scan.velocity, obstacle, scan.fudge)
    }

    /// A friendly docked unit extends a line of unit-sized phantoms to its node.
    fn phantom_hit(&self, scan: &Scan<'_>, unit: &Unit, friendly: bool) -> Option<f64> {
        if !friendly || !unit.is_docked() {
            return None;
        }
        let node = unit.docked_node.and_then(|id| self.snapshot.node(id))?;
        let gap = unit.position.distance_to(&node.position) - unit.radius - node.radius;
        let count = (gap + 1.0).round().max(0.0) as usize;
        let angle = unit.position.angle_to(&node.position);
        (0..count).find_map(|i| {
            let phantom = Obstacle::stationary(unit.position.offset(i as f64, angle), UNIT_RADIUS);
            self.hit(scan, &phantom)
        })
    }
}
