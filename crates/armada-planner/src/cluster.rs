//! Clusters: groups of our units that move and navigate as one body.
//!
//! A cluster composes unit ids; its geometry is derived from its members each
//! time it is needed. The registry outlives cycles, so membership is
//! reconciled against every new snapshot before planning starts.

use std::collections::{BTreeMap, HashMap};

use armada_core::constants::*;
use armada_core::scratch::CycleScratch;
use armada_core::snapshot::WorldSnapshot;
use armada_core::types::{centroid, Position};
use armada_nav::{Course, Goal, Mover, NavOptions, Navigator};

/// Aggregate body of a cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    pub position: Position,
    pub radius: f64,
    pub health: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub id: u32,
    pub members: Vec<u32>,
    /// Set once the members have been pulled into formation.
    pub formed: bool,
}

impl Cluster {
    /// Centroid, enclosing radius and summed health of the live members.
    pub fn aggregate(&self, snapshot: &WorldSnapshot) -> Option<Aggregate> {
        let units: Vec<_> = self.members.iter().filter_map(|id| snapshot.unit(*id)).collect();
        if units.is_empty() {
            return None;
        }
        let position = centroid(units.iter().map(|u| &u.position));
        let spread = units
            .iter()
            .map(|u| u.position.distance_to(&position))
            .fold(0.0, f64::max);
        Some(Aggregate {
            position,
            radius: CLUSTER_RADIUS_MARGIN + spread,
            health: units.iter().map(|u| u.health).sum(),
        })
    }

    /// Formation slots one step ahead of the centroid, facing `target`.
    ///
    /// Rows of three: centre, left, right. Each further row sits one spacing
    /// behind the previous. Slots come back nearest-to-target first.
    pub fn formation_slots(&self, snapshot: &WorldSnapshot, target: &Position) -> Vec<Position> {
        let Some(body) = self.aggregate(snapshot) else {
            return Vec::new();
        };
        let heading = body.position.angle_to(target);
        let front = body
            .position
            .offset(body.position.distance_to(target).min(MAX_SPEED_F), heading);

        let mut slots: Vec<Position> = (0..self.members.len())
            .map(|i| {
                let row = (i / 3) as f64;
                let lateral = match i % 3 {
                    0 => 0.0,
                    1 => CLUSTER_SPACING,
                    _ => -CLUSTER_SPACING,
                };
                front
                    .offset(lateral, heading + 90.0)
                    .offset(row * CLUSTER_SPACING, heading + 180.0)
            })
            .collect();
        slots.sort_by(|a, b| a.distance_sq_to(target).total_cmp(&b.distance_sq_to(target)));
        slots
    }

    /// Direct thrusts that pull every member into formation toward `target`.
    ///
    /// Greedy matching: each slot, nearest to the target first, takes the
    /// nearest member not yet placed.
    pub fn clump_to(&self, snapshot: &WorldSnapshot, target: &Position) -> Vec<(u32, Course)> {
        let mut remaining: Vec<_> = self.members.iter().filter_map(|id| snapshot.unit(*id)).collect();
        let mut orders = Vec::with_capacity(remaining.len());

        for slot in self.formation_slots(snapshot, target) {
            let Some(pick) = remaining
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    a.position
                        .distance_sq_to(&slot)
                        .total_cmp(&b.position.distance_sq_to(&slot))
                        .then(a.id.cmp(&b.id))
                })
                .map(|(i, _)| i)
            else {
                break;
            };
            let unit = remaining.swap_remove(pick);
            let distance = unit.position.distance_to(&slot);
            let course = Course {
                speed: distance.min(MAX_SPEED_F).floor() as u32,
                heading: (unit.position.angle_to(&slot).round() as i64).rem_euclid(360) as u32,
            };
            orders.push((unit.id, course));
        }
        orders
    }

    /// One navigator call for the whole body.
    pub fn navigate_as_unit(
        &self,
        navigator: &Navigator<'_>,
        snapshot: &WorldSnapshot,
        goal: &Goal,
        options: &NavOptions,
    ) -> Option<Course> {
        let body = self.aggregate(snapshot)?;
        let mover = Mover {
            position: body.position,
            radius: body.radius,
            members: &self.members,
            is_cluster: true,
        };
        navigator.navigate(&mover, goal, options)
    }

    /// The same course for every member that has no command yet.
    pub fn broadcast(&self, course: Course, scratch: &CycleScratch) -> Vec<(u32, Course)> {
        self.members
            .iter()
            .copied()
            .filter(|m| !scratch.has_command(*m))
            .map(|m| (m, course))
            .collect()
    }
}

/// All live clusters and the unit-to-cluster index.
#[derive(Debug, Clone, Default)]
pub struct ClusterRegistry {
    clusters: BTreeMap<u32, Cluster>,
    membership: HashMap<u32, u32>,
    next_id: u32,
}

impl ClusterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bond the unclustered units among `members` into a new cluster.
    ///
    /// Returns `None` when fewer than two of them are free.
    pub fn form(&mut self, members: &[u32]) -> Option<u32> {
        let mut free: Vec<u32> = Vec::with_capacity(members.len());
        for id in members {
            if !self.membership.contains_key(id) && !free.contains(id) {
                free.push(*id);
            }
        }
        if free.len() < 2 {
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;
        for member in &free {
            self.membership.insert(*member, id);
        }
        log::debug!("formed cluster {} with members {:?}", id, free);
        self.clusters.insert(
            id,
            Cluster {
                id,
                members: free,
                formed: false,
            },
        );
        Some(id)
    }

    /// Drop members that died, vanished, changed hands or docked.
    ///
    /// Returns the ids of clusters dissolved as a result.
    pub fn refresh(&mut self, snapshot: &WorldSnapshot) -> Vec<u32> {
        let stale: Vec<u32> = self
            .membership
            .keys()
            .copied()
            .filter(|id| match snapshot.unit(*id) {
                Some(u) => !snapshot.is_mine(u) || !u.is_alive() || u.is_docked(),
                None => true,
            })
            .collect();

        let mut dissolved = Vec::new();
        for unit in stale {
            if let Some(cluster) = self.remove_member(unit) {
                dissolved.push(cluster);
            }
        }
        dissolved.sort_unstable();
        dissolved.dedup();
        dissolved
    }

    /// Take `unit` out of its cluster. A cluster left with fewer than two
    /// members is dissolved; its id is returned in that case.
    pub fn remove_member(&mut self, unit: u32) -> Option<u32> {
        let cluster_id = self.membership.remove(&unit)?;
        let cluster = self.clusters.get_mut(&cluster_id)?;
        cluster.members.retain(|m| *m != unit);
        if cluster.members.len() >= 2 {
            return None;
        }

        if let Some(cluster) = self.clusters.remove(&cluster_id) {
            for member in cluster.members {
                self.membership.remove(&member);
            }
        }
        log::debug!("dissolved cluster {}", cluster_id);
        Some(cluster_id)
    }

    pub fn cluster_of(&self, unit: u32) -> Option<u32> {
        self.membership.get(&unit).copied()
    }

    pub fn get(&self, id: u32) -> Option<&Cluster> {
        self.clusters.get(&id)
    }

    pub fn mark_formed(&mut self, id: u32) {
        if let Some(cluster) = self.clusters.get_mut(&id) {
            cluster.formed = true;
        }
    }

    /// Group unclustered undocked units with their clumpable friends.
    ///
    /// Least-connected units are grouped first. Units near mid-map are left
    /// alone, as are dead units. Returns the ids of the new clusters.
    pub fn auto_form(&mut self, snapshot: &WorldSnapshot, scratch: &CycleScratch) -> Vec<u32> {
        let mid = snapshot.mid_map();
        let mut seeds: Vec<(u32, usize)> = snapshot
            .my_undocked_units()
            .filter(|u| u.is_alive() && !u.position.is_within(&mid, MID_MAP_RADIUS))
            .filter_map(|u| {
                let friends = scratch.get(u.id)?.clumpable_friends.len();
                (friends > 0).then_some((u.id, friends))
            })
            .collect();
        seeds.sort_by_key(|(id, friends)| (*friends, *id));

        let mut formed = Vec::new();
        for (id, _) in seeds {
            if self.membership.contains_key(&id) || scratch.has_command(id) {
                continue;
            }
            let Some(entry) = scratch.get(id) else {
                continue;
            };
            let mut members = vec![id];
            members.extend(
                entry
                    .clumpable_friends
                    .iter()
                    .copied()
                    .filter(|f| !self.membership.contains_key(f) && !scratch.has_command(*f))
                    .filter(|f| snapshot.unit(*f).is_some_and(|u| u.is_alive())),
            );
            if let Some(cluster) = self.form(&members) {
                formed.push(cluster);
            }
        }
        formed
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.values()
    }
}
