//! Cross-cycle memory for our units.
//!
//! Only what the next cycle's scoring needs survives a cycle: the last
//! committed target (anti-oscillation), the mission target (fallback) and
//! the hostile engaged last cycle (re-engagement guard). Entries for units
//! that no longer exist are pruned at the start of every cycle.

use std::collections::HashMap;

use armada_core::snapshot::WorldSnapshot;
use armada_core::target::TargetRef;

/// A hostile engaged at the end of a cycle, and its health at the time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Engagement {
    pub hostile: u32,
    pub health: f64,
    pub turn: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitMemory {
    pub last_target: Option<TargetRef>,
    /// Squared distance to `last_target` when it was committed.
    pub last_target_dist_sq: f64,
    pub mission: Option<TargetRef>,
    pub last_engaged: Option<Engagement>,
}

#[derive(Debug, Clone, Default)]
pub struct FleetMemory {
    units: HashMap<u32, UnitMemory>,
}

impl FleetMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: u32) -> Option<&UnitMemory> {
        self.units.get(&id)
    }

    /// Forget units that are gone or no longer ours.
    pub fn prune(&mut self, snapshot: &WorldSnapshot) {
        self.units
            .retain(|id, _| snapshot.unit(*id).is_some_and(|u| snapshot.is_mine(u)));
    }

    pub fn record_target(&mut self, id: u32, target: TargetRef, dist_sq: f64) {
        let entry = self.units.entry(id).or_default();
        entry.last_target = Some(target);
        entry.last_target_dist_sq = dist_sq;
        entry.mission = Some(target);
    }

    pub fn record_engagement(&mut self, id: u32, engagement: Engagement) {
        self.units.entry(id).or_default().last_engaged = Some(engagement);
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
