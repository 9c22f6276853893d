//! Close-quarters manoeuvres.
//!
//! A unit with a hostile inside its nearby radius gets a chance to fight
//! locally before it takes a fleet-level target: run from a fight it cannot
//! win, attack together with the friends in reach, hold just outside the
//! hostile's reach, close to the edge of it, or swing round it towards a
//! better target. The functions here decide and compute geometry; the
//! scheduler issues the resulting commands.

use armada_core::constants::*;
use armada_core::scratch::CycleScratch;
use armada_core::snapshot::{Unit, WorldSnapshot};
use armada_core::target::TargetRef;
use armada_core::types::{centroid, Position};
use armada_nav::Goal;

use crate::capacity::CapacityTracker;
use crate::cluster::ClusterRegistry;
use crate::memory::FleetMemory;

/// Where a retreating unit may head.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Escape {
    /// Side step on the side of our own units.
    pub preferred: Position,
    /// Side step on the other side.
    pub alternative: Position,
    /// Directly away from the threats.
    pub straight_back: Position,
}

/// Read-only view over everything skirmish decisions depend on.
pub struct Skirmish<'a> {
    pub snapshot: &'a WorldSnapshot,
    pub scratch: &'a CycleScratch,
    pub capacity: &'a CapacityTracker,
    pub memory: &'a FleetMemory,
    pub clusters: &'a ClusterRegistry,
    pub combat_ratio: f64,
    /// Health margin for the baiting check.
    pub reengage_tolerance: f64,
}

impl<'a> Skirmish<'a> {
    fn saturated(&self, hostile: u32) -> bool {
        self.capacity.is_saturated(
            TargetRef::Hostile(hostile),
            self.combat_ratio,
            self.snapshot,
            self.scratch,
        )
    }

    fn health(&self, id: u32) -> f64 {
        self.scratch.effective_health(id)
    }

    /// The hostile `unit` should skirmish with, if any.
    ///
    /// Docked units, units that already have a command, units pulled into a
    /// neighbour's attack and units about to die take no part. The hostile is
    /// the nearest one in nearby reach that is alive and not saturated.
    pub fn opponent(&self, unit: &Unit) -> Option<u32> {
        let entry = self.scratch.get(unit.id)?;
        if unit.is_docked() || entry.has_command || entry.aggressive || entry.effective_health <= 0.0 {
            return None;
        }
        entry
            .nearby_enemies
            .iter()
            .copied()
            .find(|id| self.health(*id) > 0.0 && !self.saturated(*id))
    }

    /// Whether the hostile's owner has any unit docked.
    pub fn owner_has_docked(&self, hostile: &Unit) -> bool {
        self.snapshot
            .hostile_units()
            .any(|u| u.owner == hostile.owner && u.is_docked())
    }

    /// Too few friends around and enough undocked threats to finish the unit.
    ///
    /// Units guarding a dock or moving as a cluster never run.
    pub fn should_run(&self, unit: &Unit) -> bool {
        let Some(entry) = self.scratch.get(unit.id) else {
            return false;
        };
        if !entry.nearby_docked_friends.is_empty() || self.clusters.cluster_of(unit.id).is_some() {
            return false;
        }
        let threats = entry
            .nearby_enemies
            .iter()
            .filter(|id| self.snapshot.unit(**id).is_some_and(|h| !h.is_docked()))
            .filter(|id| !self.saturated(**id))
            .count();
        if threats == 0 || entry.nearby_friends.len() as f64 >= RUN_FRIEND_RATIO * threats as f64 {
            return false;
        }
        threats as f64 * WEAPON_DAMAGE >= entry.effective_health
    }

    /// Escape points to either side of straight back from the threats.
    pub fn escape(&self, unit: &Unit) -> Option<Escape> {
        let entry = self.scratch.get(unit.id)?;
        let threats: Vec<Position> = entry
            .nearby_enemies
            .iter()
            .filter_map(|id| self.snapshot.unit(*id))
            .filter(|h| !h.is_docked())
            .map(|h| h.position)
            .collect();
        if threats.is_empty() {
            return None;
        }

        let toward = unit.position.angle_to(&centroid(&threats));
        let left = unit.position.offset(ESCAPE_DISTANCE, toward + ESCAPE_SPREAD_DEG);
        let right = unit.position.offset(ESCAPE_DISTANCE, toward - ESCAPE_SPREAD_DEG);

        let friends: Vec<Position> = entry
            .nearby_friends
            .iter()
            .chain(&entry.nearby_docked_friends)
            .filter_map(|id| self.snapshot.unit(*id))
            .map(|u| u.position)
            .collect();
        let home = if friends.is_empty() {
            self.snapshot.fleet_centroid().unwrap_or(unit.position)
        } else {
            centroid(&friends)
        };
        let (preferred, alternative) = if home.is_nearer(&right, &left) {
            (right, left)
        } else {
            (left, right)
        };

        Some(Escape {
            preferred,
            alternative,
            straight_back: unit.position.offset(ESCAPE_DISTANCE, toward + 180.0),
        })
    }

    /// Whether an undocked hostile near `unit` could fire on it at `at`.
    pub fn exposed_at(&self, unit: &Unit, at: &Position) -> bool {
        self.scratch.get(unit.id).is_some_and(|entry| {
            entry
                .nearby_enemies
                .iter()
                .filter_map(|id| self.snapshot.unit(*id))
                .any(|h| !h.is_docked() && h.position.is_within(at, WEAPON_RADIUS))
        })
    }

    fn ready_to_fire(&self, id: u32) -> bool {
        self.scratch
            .get(id)
            .is_some_and(|s| !s.has_command && !s.weapon_cooldown && s.effective_health > 0.0)
    }

    /// Whether the units in reach of `hostile` can take it on together.
    ///
    /// A friend that engaged the hostile last cycle without it losing health
    /// calls the attack off: the hostile is baiting.
    pub fn friends_can_engage(&self, hostile: u32) -> bool {
        let (Some(target), Some(entry)) = (self.snapshot.unit(hostile), self.scratch.get(hostile)) else {
            return false;
        };
        if entry.ready_friends.is_empty() {
            return false;
        }
        let cooldown = entry.weapon_cooldown;

        let mut ready = 0;
        let mut health = 0.0;
        for id in &entry.ready_friends {
            if !self.ready_to_fire(*id) {
                continue;
            }
            let friend_health = self.health(*id);
            if !cooldown && friend_health < WEAPON_DAMAGE {
                continue;
            }
            let baited = self
                .memory
                .get(*id)
                .and_then(|m| m.last_engaged)
                .is_some_and(|e| {
                    e.hostile == hostile
                        && e.turn + 1 == self.snapshot.turn
                        && e.health >= target.health + self.reengage_tolerance
                });
            if baited {
                log::debug!("hostile {} kept its health against unit {}, holding off", hostile, id);
                return false;
            }
            ready += 1;
            health += friend_health;
        }

        let dock_close = entry
            .guarded_dock
            .and_then(|id| self.snapshot.unit(id))
            .is_some_and(|dock| dock.position.is_within(&target.position, MAX_SPEED_F));
        entry.threatens_dock
            || ready >= ENGAGE_PARTNERS
            || health > self.health(hostile)
            || cooldown
            || target.is_docked()
            || dock_close
    }

    /// How many attackers `hostile` and its clump call for.
    pub fn attack_size(&self, hostile: u32) -> usize {
        let clumped: f64 = self
            .scratch
            .get(hostile)
            .map_or(0.0, |s| s.clumped_hostiles.iter().map(|id| self.health(*id).max(0.0)).sum());
        let total = self.health(hostile).max(0.0) + clumped;
        1 + (total / WEAPON_DAMAGE).floor() as usize
    }

    /// Friends in reach of `hostile` that may join an attack, nearest first.
    /// Against an armed hostile only friends that survive a full shot join.
    pub fn attackers(&self, hostile: u32) -> Vec<u32> {
        let Some(entry) = self.scratch.get(hostile) else {
            return Vec::new();
        };
        entry
            .ready_friends
            .iter()
            .copied()
            .filter(|id| entry.weapon_cooldown || self.health(*id) > WEAPON_DAMAGE)
            .collect()
    }

    /// Where an attacker aims: past the hostile towards the fleet's focus when
    /// crowded, between the hostile and our docks when guarding, else at the
    /// hostile itself.
    pub fn attack_goal(&self, friend: &Unit, hostile: &Unit, focus: Option<TargetRef>) -> Option<Goal> {
        let entry = self.scratch.get(friend.id)?;
        if entry.nearby_friends.len() > CROWDED_ENGAGEMENT {
            if let Some(at) = focus.and_then(|t| t.position(self.snapshot)) {
                let angle = hostile.position.angle_to(&at);
                return Some(Goal::point(hostile.position.offset(COMBAT_STANDOFF, angle)));
            }
        }
        let docks: Vec<Position> = entry
            .nearby_docked_friends
            .iter()
            .filter_map(|id| self.snapshot.unit(*id))
            .map(|u| u.position)
            .collect();
        if !docks.is_empty() {
            let angle = hostile.position.angle_to(&centroid(&docks));
            return Some(Goal::point(hostile.position.offset(COMBAT_STANDOFF, angle)));
        }
        Goal::from_target(TargetRef::Hostile(hostile.id), self.snapshot)
    }

    /// A point just outside the hostile's move-and-fire reach, or between it
    /// and the dock it is closing on.
    pub fn zone_out_point(&self, unit: &Unit, hostile: &Unit, cluster_radius: Option<f64>) -> Position {
        let distance = unit.position.distance_to(&hostile.position);
        let mut step = (1.0 + MOVE_AND_FIRE_RADIUS - distance).max(MIN_ZONE_STEP);
        let mut angle = hostile.position.angle_to(&unit.position);

        let dock = self
            .scratch
            .get(hostile.id)
            .and_then(|s| s.guarded_dock)
            .and_then(|id| self.snapshot.unit(id));
        if let Some(dock) = dock {
            let screen = dock
                .position
                .offset(DOCK_SCREEN_OFFSET, dock.position.angle_to(&hostile.position));
            angle = unit.position.angle_to(&screen);
            step = (unit.position.distance_to(&screen) - unit.radius).clamp(0.0, MAX_SPEED_F);
        }
        if let Some(radius) = cluster_radius {
            step = (step - radius - NAV_FUDGE).max(0.0);
        }
        unit.position.offset(step.min(MAX_SPEED_F), angle)
    }

    /// A point on the edge of our reach on the hostile: weapon reach when
    /// rushing, move-and-fire reach otherwise. Backs off when already inside.
    pub fn zone_in_point(&self, unit: &Unit, hostile: &Unit, cluster_radius: Option<f64>, rush: bool) -> Position {
        let mut reach = if rush { WEAPON_RADIUS } else { MOVE_AND_FIRE_RADIUS };
        reach -= cluster_radius.unwrap_or(0.0);
        let gap = unit.position.distance_to(&hostile.position) - reach + ZONE_MARGIN;
        let mut angle = unit.position.angle_to(&hostile.position);
        if gap <= 0.0 {
            angle += 180.0;
        }
        unit.position
            .offset(gap.abs().max(MIN_ZONE_STEP).min(MAX_SPEED_F), angle)
    }

    /// Swing round `hostile` on the side facing `best`, or head for `best`
    /// outright when it is closer to us than to the hostile.
    pub fn round_goal(&self, unit: &Unit, hostile: &Unit, best: TargetRef) -> Option<Goal> {
        let at = best.position(self.snapshot)?;
        if at.is_nearer(&unit.position, &hostile.position) {
            return Goal::from_target(best, self.snapshot);
        }
        let distance = unit.position.distance_to(&hostile.position);
        if distance <= 0.0 {
            return None;
        }

        let tangent = if unit.position.is_within(&self.snapshot.mid_map(), ROUND_MID_MAP_RADIUS) {
            (ROUND_MID_MAP_STEP.min(distance) / distance).asin().to_degrees()
        } else if distance <= NEARBY_RADIUS {
            90.0
        } else {
            (MAX_SPEED_F / distance).asin().to_degrees()
        };
        let angle = unit.position.angle_to(&hostile.position);
        let left = unit.position.offset(MAX_SPEED_F, angle + tangent);
        let right = unit.position.offset(MAX_SPEED_F, angle - tangent);
        Some(Goal::point(if at.is_nearer(&left, &right) { left } else { right }))
    }
}
