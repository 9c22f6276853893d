//! Per-cycle scratch table.
//!
//! Everything derived during a cycle (neighbour lists, effective health,
//! planned moves, scores, plan state) lives here, keyed by unit id. The
//! table is built fresh from the snapshot at the start of each cycle and
//! discarded at the end, so nothing derived can leak into the next cycle.

use std::collections::HashMap;

use crate::snapshot::WorldSnapshot;
use crate::target::TargetRef;
use crate::types::PlannedMove;

/// Where a unit is in the per-cycle assignment state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlanState {
    #[default]
    Unplanned,
    Scored,
    Committed,
}

/// Derived per-unit data for the current cycle.
#[derive(Debug, Clone, Default)]
pub struct UnitScratch {
    // --- Neighbours (our units only) ---
    /// Undocked friends within move-and-fire radius.
    pub nearby_friends: Vec<u32>,
    /// Docked friends within nearby radius.
    pub nearby_docked_friends: Vec<u32>,
    /// Undocked friends close enough to cluster with.
    pub clumpable_friends: Vec<u32>,
    /// Hostiles within nearby radius.
    pub nearby_enemies: Vec<u32>,
    /// Undocked hostiles within weapon radius.
    pub engaged_enemies: Vec<u32>,
    /// Undocked hostiles within dock-check radius.
    pub dock_threats: Vec<u32>,
    /// Closest undocked hostile within tracking reach.
    pub nearest_enemy: Option<u32>,
    /// Whether the neighbour scan reached this unit before the soft deadline.
    pub scanned: bool,

    // --- Combat ---
    /// Health minus the weapon damage expected this cycle.
    pub effective_health: f64,
    pub weapon_cooldown: bool,

    // --- Dock guarding (hostile units only) ---
    /// Our docked unit this hostile is closest to.
    pub guarded_dock: Option<u32>,
    /// Utility discount by distance to `guarded_dock`.
    pub proximity_discount: Option<f64>,
    /// Within weapon radius of `guarded_dock`.
    pub threatens_dock: bool,
    /// Our undocked units within move-and-fire radius, nearest first.
    pub ready_friends: Vec<u32>,
    /// Other undocked hostiles packed tightly around this one.
    pub clumped_hostiles: Vec<u32>,

    // --- Planning ---
    pub state: PlanState,
    /// Movement committed this cycle, if any.
    pub planned: Option<PlannedMove>,
    /// Set once any command (including a hold) has been issued.
    pub has_command: bool,
    /// Target pre-assigned by another unit's decision this cycle.
    pub forced_target: Option<TargetRef>,
    pub best_utility: f64,
    pub best_target: Option<TargetRef>,
    /// Committed to a fight by a neighbour; skips its own skirmish checks.
    pub aggressive: bool,
}

/// Scratch table for one cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleScratch {
    units: HashMap<u32, UnitScratch>,
}

impl CycleScratch {
    /// Seed an entry for every unit in the snapshot.
    pub fn new(snapshot: &WorldSnapshot) -> Self {
        let units = snapshot
            .units
            .iter()
            .map(|u| {
                let entry = UnitScratch {
                    effective_health: u.health,
                    weapon_cooldown: u.weapon_cooldown,
                    ..Default::default()
                };
                (u.id, entry)
            })
            .collect();
        Self { units }
    }

    pub fn get(&self, id: u32) -> Option<&UnitScratch> {
        self.units.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut UnitScratch> {
        self.units.get_mut(&id)
    }

    pub fn planned(&self, id: u32) -> Option<PlannedMove> {
        self.units.get(&id).and_then(|s| s.planned)
    }

    pub fn has_command(&self, id: u32) -> bool {
        self.units.get(&id).is_some_and(|s| s.has_command)
    }

    /// Effective health, falling back to 0 for unknown ids.
    pub fn effective_health(&self, id: u32) -> f64 {
        self.units.get(&id).map_or(0.0, |s| s.effective_health)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
