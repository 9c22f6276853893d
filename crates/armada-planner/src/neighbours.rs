//! Per-cycle neighbour scan.
//!
//! Fills the scratch table with everything scoring, skirmishing and the
//! docking decision read: neighbour lists for our undocked units, expected
//! weapon damage for both sides, who could strike each hostile, and
//! dock-guard data on hostiles close to our docked units.
//!
//! The scan is quadratic in unit count, so it polls the clock and stops early
//! once the soft deadline has passed. Units left unscanned keep empty lists.

use armada_core::constants::*;
use armada_core::scratch::CycleScratch;
use armada_core::snapshot::{Unit, WorldSnapshot};
use armada_core::types::Position;

use crate::clock::TurnClock;

/// Units processed between clock checks.
pub(crate) const CLOCK_CHECK_INTERVAL: usize = 16;

/// Run the full scan. Returns `false` if the soft deadline cut it short.
pub fn scan(
    snapshot: &WorldSnapshot,
    scratch: &mut CycleScratch,
    horizon_turns: f64,
    dock_check_radius: f64,
    clock: &TurnClock,
) -> bool {
    apply_expected_damage(snapshot, scratch);

    let guard_reach = horizon_turns * MAX_SPEED_F;
    for (i, hostile) in snapshot.hostile_units().enumerate() {
        if i % CLOCK_CHECK_INTERVAL == 0 && clock.past_soft() {
            log::warn!("soft deadline passed during hostile scan at hostile {}", hostile.id);
            return false;
        }
        scan_hostile(snapshot, scratch, hostile);
        if hostile.is_docked() {
            continue;
        }
        for dock in snapshot.my_units().filter(|u| u.is_docked()) {
            if hostile.position.is_within(&dock.position, guard_reach) {
                guard_dock(snapshot, scratch, hostile.id, dock.id, horizon_turns);
            }
        }
    }

    for (i, unit) in snapshot.my_undocked_units().enumerate() {
        if i % CLOCK_CHECK_INTERVAL == 0 && clock.past_soft() {
            log::warn!("soft deadline passed during neighbour scan at unit {}", unit.id);
            return false;
        }
        scan_unit(snapshot, scratch, unit, dock_check_radius);
    }
    true
}

/// Record that `hostile` is near our docked unit `dock`.
///
/// A hostile tracks only the closest dock it threatens. Within
/// `DOCK_THREAT_TURNS` it also gets a proximity discount, and within weapon
/// reach it is flagged as actively threatening the dock.
pub fn guard_dock(
    snapshot: &WorldSnapshot,
    scratch: &mut CycleScratch,
    hostile: u32,
    dock: u32,
    horizon_turns: f64,
) {
    let (Some(h), Some(d)) = (snapshot.unit(hostile), snapshot.unit(dock)) else {
        return;
    };
    let distance = h.position.distance_to(&d.position);
    let Some(entry) = scratch.get_mut(hostile) else {
        return;
    };

    let closer = match entry.guarded_dock.and_then(|prev| snapshot.unit(prev)) {
        Some(prev) => distance < h.position.distance_to(&prev.position),
        None => true,
    };
    if !closer {
        return;
    }

    entry.guarded_dock = Some(dock);
    let turns = distance / MAX_SPEED_F;
    if turns <= DOCK_THREAT_TURNS && horizon_turns > 0.0 {
        entry.proximity_discount = Some((1.0 - turns.min(horizon_turns) / horizon_turns).max(0.0));
    }
    if distance <= WEAPON_RADIUS {
        entry.threatens_dock = true;
    }
}

/// Split each armed unit's damage across every opposing unit in reach.
/// A unit that fires this cycle is marked as cooling down.
fn apply_expected_damage(snapshot: &WorldSnapshot, scratch: &mut CycleScratch) {
    for shooter in snapshot.units.iter().filter(|u| !u.is_docked() && !u.weapon_cooldown) {
        let victims: Vec<u32> = snapshot
            .units
            .iter()
            .filter(|u| u.owner != shooter.owner && u.position.is_within(&shooter.position, WEAPON_RADIUS))
            .map(|u| u.id)
            .collect();
        if victims.is_empty() {
            continue;
        }
        if let Some(entry) = scratch.get_mut(shooter.id) {
            entry.weapon_cooldown = true;
        }
        let share = WEAPON_DAMAGE / victims.len() as f64;
        for id in victims {
            if let Some(entry) = scratch.get_mut(id) {
                entry.effective_health -= share;
            }
        }
    }
}

/// Our units that could strike `hostile` this cycle, and the hostiles
/// packed around it.
fn scan_hostile(snapshot: &WorldSnapshot, scratch: &mut CycleScratch, hostile: &Unit) {
    let pos = hostile.position;
    let mine: Vec<&Unit> = snapshot.my_undocked_units().collect();
    let others: Vec<&Unit> = snapshot.hostile_units().filter(|u| u.id != hostile.id).collect();

    let ready_friends = sorted_ids(&pos, within(&mine, &pos, MOVE_AND_FIRE_RADIUS, true));
    let clumped_hostiles = sorted_ids(&pos, within(&others, &pos, CLUMPED_HOSTILE_RADIUS, true));
    if let Some(entry) = scratch.get_mut(hostile.id) {
        entry.ready_friends = ready_friends;
        entry.clumped_hostiles = clumped_hostiles;
    }
}

fn scan_unit(snapshot: &WorldSnapshot, scratch: &mut CycleScratch, unit: &Unit, dock_check_radius: f64) {
    let pos = unit.position;
    let friends: Vec<&Unit> = snapshot.my_units().filter(|u| u.id != unit.id).collect();
    let hostiles: Vec<&Unit> = snapshot.hostile_units().collect();

    let nearby_friends = sorted_ids(&pos, within(&friends, &pos, MOVE_AND_FIRE_RADIUS, true));
    let clumpable_friends = sorted_ids(&pos, within(&friends, &pos, CLUMP_RADIUS, true));
    let docked_friends = within(&friends, &pos, NEARBY_RADIUS, false)
        .into_iter()
        .filter(|u| u.is_docked())
        .collect();
    let nearby_docked_friends = sorted_ids(&pos, docked_friends);
    let nearby_enemies = sorted_ids(&pos, within(&hostiles, &pos, NEARBY_RADIUS, false));
    let engaged_enemies = sorted_ids(&pos, within(&hostiles, &pos, WEAPON_RADIUS, true));
    let dock_threats = sorted_ids(&pos, within(&hostiles, &pos, dock_check_radius, true));
    let nearest_enemy = sorted_ids(
        &pos,
        within(&hostiles, &pos, NEAREST_ENEMY_TURNS * MAX_SPEED_F, true),
    )
    .first()
    .copied();

    if let Some(entry) = scratch.get_mut(unit.id) {
        entry.nearby_friends = nearby_friends;
        entry.clumpable_friends = clumpable_friends;
        entry.nearby_docked_friends = nearby_docked_friends;
        entry.nearby_enemies = nearby_enemies;
        entry.engaged_enemies = engaged_enemies;
        entry.dock_threats = dock_threats;
        entry.nearest_enemy = nearest_enemy;
        entry.scanned = true;
    }
}

fn within<'a>(set: &[&'a Unit], pos: &Position, radius: f64, undocked_only: bool) -> Vec<&'a Unit> {
    set.iter()
        .copied()
        .filter(|u| (!undocked_only || !u.is_docked()) && u.position.is_within(pos, radius))
        .collect()
}

/// Ids ordered by distance from `pos`, ties to the lower id.
fn sorted_ids(pos: &Position, mut found: Vec<&Unit>) -> Vec<u32> {
    found.sort_by(|a, b| {
        pos.distance_sq_to(&a.position)
            .total_cmp(&pos.distance_sq_to(&b.position))
            .then(a.id.cmp(&b.id))
    });
    found.into_iter().map(|u| u.id).collect()
}
