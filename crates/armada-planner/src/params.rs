//! Fleet-level quantities computed once per cycle before any unit is planned.

use armada_core::constants::*;
use armada_core::enums::Posture;
use armada_core::snapshot::WorldSnapshot;
use armada_core::target::TargetRef;
use armada_core::types::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct CycleParameters {
    /// Stop widening a unit's candidate search once this many have positive utility.
    pub max_candidates: usize,
    /// Multiplier on node utility; below 1 once we already out-dock the opposition.
    pub docking_discount: f64,
    /// Undocked hostiles within this distance of a unit count as dock threats.
    pub dock_check_radius: f64,
    /// Fleet-wide fallback target.
    pub top_target: Option<TargetRef>,
    /// Opponent with the most units, ties to the lowest id.
    pub strongest_opponent: Option<u32>,
    pub fleet_centroid: Option<Position>,
    pub fleet_size: usize,
    /// Our undocked health minus every hostile's undocked health.
    pub health_advantage: f64,
    /// Close-quarters manoeuvres run this cycle.
    pub skirmish: bool,
}

impl CycleParameters {
    pub fn compute(snapshot: &WorldSnapshot) -> Self {
        let fleet_size = snapshot.my_units().count();
        let my_undocked = snapshot.my_undocked_units().count();
        let my_docked = fleet_size - my_undocked;
        let enemy_undocked = snapshot.hostile_units().filter(|u| !u.is_docked()).count();
        let enemy_docked = snapshot.hostile_units().filter(|u| u.is_docked()).count();

        let max_candidates = if my_undocked >= LARGE_FLEET {
            LARGE_FLEET_CANDIDATES
        } else {
            DEFAULT_CANDIDATES
        };

        let strongest_opponent = strongest_opponent(snapshot);
        let strongest_idle = snapshot.turn >= 5
            && strongest_opponent.is_some_and(|player| {
                !snapshot
                    .hostile_units()
                    .any(|u| u.owner == player && u.is_docked())
            });
        let out_docking = my_docked as f64 > (enemy_docked.max(2) as f64) * 1.05
            && my_undocked <= enemy_undocked + 3;
        let docking_discount = if out_docking || strongest_idle { 0.5 } else { 1.0 };

        let check_turns = if fleet_size > SMALL_FLEET { 3.0 } else { 8.0 };
        let dock_check_radius = MAX_SPEED_F * check_turns;

        let fleet_centroid = snapshot.fleet_centroid();
        let top_target = fleet_centroid.and_then(|centre| top_target(snapshot, &centre));

        let undocked_health = |mine: bool| -> f64 {
            snapshot
                .units
                .iter()
                .filter(|u| !u.is_docked() && snapshot.is_mine(u) == mine)
                .map(|u| u.health)
                .sum()
        };
        let health_advantage = undocked_health(true) - undocked_health(false);
        let skirmish = match snapshot.posture {
            Posture::MultiOpponent => {
                !snapshot.deserting && health_advantage < MULTI_OPPONENT_HEALTH_ADVANTAGE
            }
            _ => health_advantage < SKIRMISH_HEALTH_ADVANTAGE,
        };

        Self {
            max_candidates,
            docking_discount,
            dock_check_radius,
            top_target,
            strongest_opponent,
            fleet_centroid,
            fleet_size,
            health_advantage,
            skirmish,
        }
    }
}

fn strongest_opponent(snapshot: &WorldSnapshot) -> Option<u32> {
    let mut best: Option<(u32, usize)> = None;
    for player in snapshot.opponents() {
        let count = snapshot.hostile_units().filter(|u| u.owner == player).count();
        best = match best {
            Some((id, n)) if n > count || (n == count && id < player) => Some((id, n)),
            _ => Some((player, count)),
        };
    }
    best.map(|(id, _)| id)
}

/// Docked hostile nearest our centroid, else the nearest undocked one.
fn top_target(snapshot: &WorldSnapshot, centre: &Position) -> Option<TargetRef> {
    let nearest = |docked: bool| {
        snapshot
            .hostile_units()
            .filter(|u| u.is_docked() == docked)
            .min_by(|a, b| {
                centre
                    .distance_sq_to(&a.position)
                    .total_cmp(&centre.distance_sq_to(&b.position))
                    .then(a.id.cmp(&b.id))
            })
            .map(|u| TargetRef::Hostile(u.id))
    };
    nearest(true).or_else(|| nearest(false))
}
