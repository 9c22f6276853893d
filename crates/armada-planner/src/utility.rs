//! Utility scoring: how much one of our units wants one target.
//!
//! Scores are pure functions of the snapshot, the cycle's scratch table,
//! current commitments and cross-cycle memory. They are never negative, and a
//! saturated target scores zero for every unit except one forced onto it.

use armada_core::config::{PlannerConfig, PostureProfile};
use armada_core::constants::*;
use armada_core::enums::Posture;
use armada_core::scratch::CycleScratch;
use armada_core::snapshot::{Unit, WorldSnapshot};
use armada_core::target::TargetRef;
use armada_core::types::Position;

use crate::capacity::CapacityTracker;
use crate::cluster::ClusterRegistry;
use crate::memory::FleetMemory;
use crate::params::CycleParameters;

/// A scored target for one unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub target: TargetRef,
    pub utility: f64,
    /// Edge-to-edge distance from the unit.
    pub distance: f64,
}

/// Read-only view over everything scoring depends on.
pub struct UtilityScorer<'a> {
    pub snapshot: &'a WorldSnapshot,
    pub scratch: &'a CycleScratch,
    pub capacity: &'a CapacityTracker,
    pub memory: &'a FleetMemory,
    pub clusters: &'a ClusterRegistry,
    pub config: &'a PlannerConfig,
    pub params: &'a CycleParameters,
}

impl<'a> UtilityScorer<'a> {
    fn profile(&self) -> &'a PostureProfile {
        self.config.profile(self.snapshot.posture)
    }

    /// Utility of `target` for `unit`. Zero if the target is gone or saturated.
    pub fn score(&self, unit: &Unit, target: TargetRef) -> f64 {
        let Some(resolved) = target.resolve(self.snapshot) else {
            return 0.0;
        };
        let profile = self.profile();
        let forced = self.scratch.get(unit.id).and_then(|s| s.forced_target) == Some(target);
        if !forced
            && self
                .capacity
                .is_saturated(target, profile.combat_ratio, self.snapshot, self.scratch)
        {
            return 0.0;
        }

        let distance = edge_distance(unit, &resolved.position, resolved.radius);
        let value = match target {
            TargetRef::Anchor(_) => return self.config.anchor_utility.max(0.0),
            TargetRef::Node(id) => self.node_value(id),
            TargetRef::Hostile(id) => self.hostile_value(unit, id, self.distance_discount(distance)),
        };
        (self.overall_discount(distance, &resolved.position) * value).max(0.0)
    }

    /// Every target within the posture horizon, best first.
    ///
    /// Targets are visited nearest first; the search stops widening once
    /// `max_candidates` of them score above zero. Anchors are added when the
    /// fleet is deserting. Ties keep visiting order.
    pub fn candidates(&self, unit: &Unit) -> Vec<Candidate> {
        let reach = self.profile().horizon_turns * MAX_SPEED_F;
        let mut pool: Vec<(TargetRef, f64)> = self
            .snapshot
            .hostile_units()
            .map(|h| {
                (
                    TargetRef::Hostile(h.id),
                    edge_distance(unit, &h.position, h.radius),
                )
            })
            .chain(self.snapshot.nodes.iter().map(|n| {
                (
                    TargetRef::Node(n.id),
                    edge_distance(unit, &n.position, n.radius),
                )
            }))
            .filter(|(_, d)| *d <= reach)
            .collect();
        pool.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut found = Vec::new();
        let mut positive = 0;
        for (target, distance) in pool {
            if positive >= self.params.max_candidates {
                break;
            }
            let utility = self.score(unit, target);
            if utility > 0.0 {
                positive += 1;
            }
            found.push(Candidate {
                target,
                utility,
                distance,
            });
        }

        if self.snapshot.deserting {
            for (i, anchor) in self.snapshot.anchors().iter().enumerate() {
                let target = TargetRef::Anchor(i);
                found.push(Candidate {
                    target,
                    utility: self.score(unit, target),
                    distance: edge_distance(unit, anchor, 0.0),
                });
            }
        }

        found.sort_by(|a, b| b.utility.total_cmp(&a.utility));
        found
    }

    /// Linear decay to zero at the posture horizon.
    pub fn distance_discount(&self, distance: f64) -> f64 {
        let horizon = self.profile().horizon_turns;
        1.0 - (distance / MAX_SPEED_F).min(horizon) / horizon
    }

    fn overall_discount(&self, distance: f64, at: &Position) -> f64 {
        let profile = self.profile();
        let horizon = profile.horizon_turns;

        let from_centre = self.params.fleet_centroid.map_or(0.0, |c| c.distance_to(at));
        let mass = 1.0 - profile.mass_proximity_discount * (from_centre / MAX_SPEED_F).min(horizon) / horizon;

        let m = profile.mid_map_multiplier;
        let half_width = 0.5 * self.snapshot.width;
        let from_mid = at.distance_to(&self.snapshot.mid_map());
        let mid = m + (1.0 - m) * (from_mid / half_width).min(1.0);

        (self.distance_discount(distance) * mass * mid).max(0.0)
    }

    fn node_value(&self, id: u32) -> f64 {
        let Some(node) = self.snapshot.node(id) else {
            return 0.0;
        };
        let planet = match self.snapshot.posture {
            Posture::MultiOpponent => 1.0,
            _ => self.config.planet_multiplier,
        };
        let mut value = self.params.docking_discount * self.profile().node_utility * planet;
        let approaching = self.capacity.commitment(TargetRef::Node(id)).approaching;
        if approaching > 1 || !node.docked_units.is_empty() {
            value *= CONTESTED_NODE_BONUS;
        }
        value
    }

    fn hostile_value(&self, unit: &Unit, id: u32, distance_discount: f64) -> f64 {
        let Some(hostile) = self.snapshot.unit(id) else {
            return 0.0;
        };
        if self.scratch.effective_health(id) <= 0.0 {
            return 0.0;
        }
        let profile = self.profile();

        if hostile.is_docked() {
            let clustered = if self.clusters.cluster_of(unit.id).is_some() {
                CLUSTER_DOCKED_BONUS
            } else {
                1.0
            };
            return profile.docked_hostile_utility * self.config.aggression_multiplier * clustered;
        }

        if let Some(memory) = self.memory.get(unit.id) {
            let target = TargetRef::Hostile(id);
            // Holding the same distance still counts as closing in.
            if memory.last_target == Some(target)
                && unit.position.distance_sq_to(&hostile.position) > memory.last_target_dist_sq
            {
                return 0.0;
            }
            if let Some(engaged) = memory.last_engaged {
                if engaged.hostile == id
                    && engaged.turn + 1 == self.snapshot.turn
                    && engaged.health >= hostile.health + self.config.reengage_tolerance
                {
                    return 0.0;
                }
            }
        }

        let proximity = match self.snapshot.posture {
            Posture::Rush => 1.0,
            _ => self
                .scratch
                .get(id)
                .and_then(|s| s.proximity_discount)
                .unwrap_or(distance_discount),
        };
        proximity * profile.undocked_hostile_utility
    }
}

/// Gap between the unit's edge and the target's edge, never negative.
pub fn edge_distance(unit: &Unit, at: &Position, radius: f64) -> f64 {
    (unit.position.distance_to(at) - radius - unit.radius).max(0.0)
}
