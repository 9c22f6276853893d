//! Capacity tracking: how much friendly strength is committed per target.
//!
//! Commitments only grow within a cycle. A fresh tracker is built at the
//! start of every cycle.

use std::collections::HashMap;

use armada_core::constants::*;
use armada_core::scratch::CycleScratch;
use armada_core::snapshot::WorldSnapshot;
use armada_core::target::TargetRef;

/// Friendly commitment to one target.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Commitment {
    /// Units heading for the target (docking slots for nodes).
    pub approaching: u32,
    /// Sum of committed health.
    pub strength: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CapacityTracker {
    commitments: HashMap<TargetRef, Commitment>,
}

impl CapacityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit one unit with `health` to `target`.
    pub fn commit(&mut self, target: TargetRef, health: f64) {
        let entry = self.commitments.entry(target).or_default();
        entry.approaching += 1;
        entry.strength += health.max(0.0);
    }

    pub fn commitment(&self, target: TargetRef) -> Commitment {
        self.commitments.get(&target).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TargetRef, &Commitment)> {
        self.commitments.iter()
    }

    /// Committed strength at which a hostile counts as saturated.
    ///
    /// `None` for targets that saturate by count rather than strength.
    pub fn strength_threshold(
        target: TargetRef,
        combat_ratio: f64,
        snapshot: &WorldSnapshot,
        scratch: &CycleScratch,
    ) -> Option<f64> {
        let TargetRef::Hostile(id) = target else {
            return None;
        };
        let Some(hostile) = snapshot.unit(id) else {
            return Some(0.0);
        };

        let mut ratio = combat_ratio;
        if hostile.position.is_within(&snapshot.mid_map(), MID_MAP_RADIUS) {
            ratio *= MID_MAP_RATIO_FACTOR;
        }
        if snapshot.focus_target == Some(id) {
            ratio *= FOCUS_RATIO_FACTOR;
        } else if hostile.is_docked() {
            ratio *= DOCKED_RATIO_FACTOR;
        }
        Some(ratio * scratch.effective_health(id))
    }

    /// Whether `target` has enough friendly commitment already.
    pub fn is_saturated(
        &self,
        target: TargetRef,
        combat_ratio: f64,
        snapshot: &WorldSnapshot,
        scratch: &CycleScratch,
    ) -> bool {
        let committed = self.commitment(target);
        match target {
            TargetRef::Node(id) => match snapshot.node(id) {
                None => true,
                Some(node) => match node.owner {
                    Some(owner) if owner == snapshot.my_id => {
                        committed.approaching as usize + node.docked_units.len()
                            >= node.docking_slots as usize
                    }
                    Some(_) => true,
                    None => committed.approaching >= node.docking_slots,
                },
            },
            TargetRef::Anchor(_) => committed.approaching > 0,
            TargetRef::Hostile(_) => Self::strength_threshold(target, combat_ratio, snapshot, scratch)
                .is_some_and(|threshold| threshold <= committed.strength),
        }
    }
}
