//! Whole-cycle scenarios against the public planner API.

use std::collections::HashMap;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use armada_core::commands::MotionCommand;
use armada_core::config::PlannerConfig;
use armada_core::constants::{BASE_UNIT_HEALTH, MAX_SPEED};
use armada_core::enums::{DockingState, Posture};
use armada_core::scratch::{CycleScratch, PlanState};
use armada_core::snapshot::{ResourceNode, Unit, WorldSnapshot};
use armada_core::target::TargetRef;
use armada_core::types::Position;
use armada_planner::capacity::CapacityTracker;
use armada_planner::cluster::ClusterRegistry;
use armada_planner::memory::FleetMemory;
use armada_planner::params::CycleParameters;
use armada_planner::utility::UtilityScorer;
use armada_planner::{CyclePlan, Planner, TurnClock};

const ME: u32 = 0;

fn unit(id: u32, owner: u32, x: f64, y: f64) -> Unit {
    Unit {
        id,
        owner,
        position: Position::new(x, y),
        radius: 0.5,
        health: 255.0,
        docking: DockingState::Undocked,
        docked_node: None,
        weapon_cooldown: false,
    }
}

fn world(units: Vec<Unit>, nodes: Vec<ResourceNode>) -> WorldSnapshot {
    WorldSnapshot {
        turn: 1,
        width: 240.0,
        height: 160.0,
        my_id: ME,
        posture: Posture::Normal,
        deserting: false,
        focus_target: None,
        units,
        nodes,
    }
}

fn relaxed_clock() -> TurnClock {
    let minute = Duration::from_secs(60);
    TurnClock::with_limits(minute, minute, minute)
}

fn plan(planner: &mut Planner, snapshot: &WorldSnapshot) -> CyclePlan {
    planner
        .plan_cycle_with_clock(snapshot, relaxed_clock())
        .expect("valid snapshot")
}

/// Three of ours in a tight group, one hostile to the east.
fn skirmish() -> WorldSnapshot {
    world(
        vec![
            unit(1, ME, 100.0, 100.0),
            unit(2, ME, 101.0, 100.0),
            unit(3, ME, 100.0, 101.0),
            unit(4, 1, 150.0, 100.0),
        ],
        vec![],
    )
}

/// A reproducible arena with nodes, docked units and up to three players.
fn random_world(seed: u64) -> WorldSnapshot {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut nodes: Vec<ResourceNode> = (0..rng.gen_range(2..6u32))
        .map(|i| ResourceNode {
            id: 100 + i,
            position: Position::new(rng.gen_range(20.0..220.0), rng.gen_range(20.0..140.0)),
            radius: rng.gen_range(2.0..8.0),
            health: 1000.0,
            docking_slots: rng.gen_range(1..5),
            owner: None,
            docked_units: vec![],
            remaining_production: if rng.gen_bool(0.2) { 0.0 } else { 500.0 },
        })
        .collect();

    let count = rng.gen_range(6..30u32);
    let mut units = Vec::with_capacity(count as usize);
    for id in 1..=count {
        let owner = if id == 1 { ME } else { rng.gen_range(0..3) };
        let mut u = unit(
            id,
            owner,
            rng.gen_range(5.0..235.0),
            rng.gen_range(5.0..155.0),
        );
        u.health = rng.gen_range(1.0..=BASE_UNIT_HEALTH);
        u.weapon_cooldown = rng.gen_bool(0.1);

        if rng.gen_bool(0.2) {
            let pick = rng.gen_range(0..nodes.len());
            let node = &mut nodes[pick];
            let open = node.owner.map_or(true, |o| o == owner)
                && (node.docked_units.len() as u32) < node.docking_slots;
            if open {
                node.owner = Some(owner);
                node.docked_units.push(id);
                u.docking = DockingState::Docked;
                u.docked_node = Some(node.id);
                u.position = node.position.offset(node.radius + 1.0, 90.0 * node.docked_units.len() as f64);
            }
        }
        units.push(u);
    }

    WorldSnapshot {
        turn: rng.gen_range(1..50),
        width: 240.0,
        height: 160.0,
        my_id: ME,
        posture: match seed % 3 {
            0 => Posture::Normal,
            1 => Posture::MultiOpponent,
            _ => Posture::Rush,
        },
        deserting: false,
        focus_target: None,
        units,
        nodes,
    }
}

fn commands_per_unit(plan: &CyclePlan) -> HashMap<u32, usize> {
    let mut counts = HashMap::new();
    for command in &plan.commands {
        *counts.entry(command.unit_id()).or_insert(0) += 1;
    }
    counts
}

fn assert_one_command_each(snapshot: &WorldSnapshot, plan: &CyclePlan) {
    let counts = commands_per_unit(plan);
    for u in snapshot.my_units() {
        assert_eq!(counts.get(&u.id), Some(&1), "unit {} should get exactly one command", u.id);
    }
    assert_eq!(counts.len(), snapshot.my_units().count());
}

// --- Skirmish ---

#[test]
fn test_every_unit_prefers_the_only_hostile() {
    let snapshot = skirmish();
    let scratch = CycleScratch::new(&snapshot);
    let capacity = CapacityTracker::new();
    let memory = FleetMemory::new();
    let clusters = ClusterRegistry::new();
    let config = PlannerConfig::default();
    let params = CycleParameters::compute(&snapshot);
    let scorer = UtilityScorer {
        snapshot: &snapshot,
        scratch: &scratch,
        capacity: &capacity,
        memory: &memory,
        clusters: &clusters,
        config: &config,
        params: &params,
    };

    for u in snapshot.my_units() {
        let candidates = scorer.candidates(u);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].target, TargetRef::Hostile(4));
        assert!(candidates[0].utility > 0.0);

        let again = scorer.score(u, TargetRef::Hostile(4));
        assert_eq!(again.to_bits(), candidates[0].utility.to_bits());
    }
}

#[test]
fn test_skirmish_saturates_hostile_after_first_commit() {
    let snapshot = skirmish();
    let mut planner = Planner::new(PlannerConfig::default()).expect("valid config");
    let result = plan(&mut planner, &snapshot);

    assert_one_command_each(&snapshot, &result);

    let hostile = TargetRef::Hostile(4);
    let committed = result.capacity.commitment(hostile);
    assert_eq!(committed.approaching, 1);
    assert!((committed.strength - 255.0).abs() < 1e-9);
    assert!(result.capacity.is_saturated(hostile, 1.0, &snapshot, &result.scratch));

    // The nearest unit goes first and heads straight for the hostile.
    assert_eq!(
        result.command_for(2),
        Some(&MotionCommand::Thrust {
            unit_id: 2,
            speed: MAX_SPEED,
            heading: 0
        })
    );
    assert_eq!(result.scratch.get(2).and_then(|s| s.best_target), Some(hostile));

    // The others found it saturated and fell through to the fallback pass.
    for id in [1, 3] {
        let s = result.scratch.get(id).expect("scratch entry");
        assert_eq!(s.best_utility, 0.0);
        assert_eq!(s.best_target, None);
        assert_eq!(s.state, PlanState::Committed);
    }

    let scorer = UtilityScorer {
        snapshot: &snapshot,
        scratch: &result.scratch,
        capacity: &result.capacity,
        memory: planner.memory(),
        clusters: planner.clusters(),
        config: planner.config(),
        params: &result.params,
    };
    let last = snapshot.unit(3).expect("unit 3");
    let candidates = scorer.candidates(last);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].target, hostile);
    assert_eq!(candidates[0].utility, 0.0);
}

#[test]
fn test_committed_target_is_remembered() {
    let snapshot = skirmish();
    let mut planner = Planner::new(PlannerConfig::default()).expect("valid config");
    plan(&mut planner, &snapshot);

    let memory = planner.memory().get(2).expect("unit 2 remembered");
    assert_eq!(memory.mission, Some(TargetRef::Hostile(4)));
    assert_eq!(memory.last_target, Some(TargetRef::Hostile(4)));
    assert!((memory.last_target_dist_sq - 49.0 * 49.0).abs() < 1e-9);
    // Fallback commands are not remembered.
    assert!(planner.memory().get(1).is_none());
}

// --- Deadlines ---

#[test]
fn test_zero_deadlines_hold_everyone() {
    let snapshot = skirmish();
    let mut planner = Planner::new(PlannerConfig::default()).expect("valid config");
    let clock = TurnClock::with_limits(Duration::ZERO, Duration::ZERO, Duration::ZERO);
    let result = planner
        .plan_cycle_with_clock(&snapshot, clock)
        .expect("valid snapshot");

    assert_one_command_each(&snapshot, &result);
    assert!(result.commands.iter().all(|c| c.is_hold()));
    assert_eq!(result.capacity.iter().count(), 0);
}

#[test]
fn test_soft_deadline_still_assigns_targets() {
    let snapshot = skirmish();
    let mut planner = Planner::new(PlannerConfig::default()).expect("valid config");
    let minute = Duration::from_secs(60);
    let clock = TurnClock::with_limits(Duration::ZERO, minute, minute);
    let result = planner
        .plan_cycle_with_clock(&snapshot, clock)
        .expect("valid snapshot");

    assert_one_command_each(&snapshot, &result);
    // Unscored order still puts the unit nearest the hostile first.
    assert_eq!(
        result.command_for(2),
        Some(&MotionCommand::Thrust {
            unit_id: 2,
            speed: MAX_SPEED,
            heading: 0
        })
    );
    assert_eq!(result.capacity.commitment(TargetRef::Hostile(4)).approaching, 1);
}

#[test]
fn test_zero_hard_deadline_falls_back_for_every_unit() {
    for seed in 0..12 {
        let snapshot = random_world(seed);
        let mut planner = Planner::new(PlannerConfig::default()).expect("valid config");
        let clock = TurnClock::with_limits(Duration::ZERO, Duration::ZERO, Duration::from_secs(60));
        let result = planner
            .plan_cycle_with_clock(&snapshot, clock)
            .expect("valid snapshot");

        assert_one_command_each(&snapshot, &result);
        // Fallback commands never commit capacity.
        assert_eq!(result.capacity.iter().count(), 0, "seed {}", seed);
        assert!(!result
            .commands
            .iter()
            .any(|c| matches!(c, MotionCommand::Dock { .. })));
    }
}

// --- Clusters ---

#[test]
fn test_cluster_dissolves_when_member_dies() {
    let mut snapshot = world(
        vec![
            unit(1, ME, 20.0, 20.0),
            unit(2, ME, 21.0, 20.0),
            unit(9, 1, 60.0, 20.0),
        ],
        vec![],
    );
    snapshot.posture = Posture::Rush;
    let mut planner = Planner::new(PlannerConfig::default()).expect("valid config");

    let first = plan(&mut planner, &snapshot);
    assert_one_command_each(&snapshot, &first);
    assert_eq!(planner.clusters().len(), 1);
    assert!(planner.clusters().iter().all(|c| c.formed && c.members.len() == 2));

    snapshot.turn = 2;
    if let Some(dead) = snapshot.units.iter_mut().find(|u| u.id == 2) {
        dead.health = 0.0;
    }
    plan(&mut planner, &snapshot);

    assert!(planner.clusters().is_empty());
    assert_eq!(planner.clusters().cluster_of(1), None);
    assert_eq!(planner.clusters().cluster_of(2), None);
}

#[test]
fn test_formed_cluster_moves_as_one() {
    let mut snapshot = world(
        vec![
            unit(1, ME, 20.0, 20.0),
            unit(2, ME, 21.0, 20.0),
            unit(9, 1, 60.0, 20.0),
        ],
        vec![],
    );
    snapshot.posture = Posture::Rush;
    let mut planner = Planner::new(PlannerConfig::default()).expect("valid config");
    plan(&mut planner, &snapshot);
    assert!(planner.clusters().iter().all(|c| c.formed));

    snapshot.turn = 2;
    let second = plan(&mut planner, &snapshot);
    assert_one_command_each(&snapshot, &second);
    for id in [1, 2] {
        assert_eq!(
            second.command_for(id),
            Some(&MotionCommand::Thrust {
                unit_id: id,
                speed: MAX_SPEED,
                heading: 0
            })
        );
    }
}

// --- Random arenas ---

#[test]
fn test_random_cycles_emit_valid_commands() {
    for seed in 0..40 {
        let snapshot = random_world(seed);
        let mut planner = Planner::new(PlannerConfig::default()).expect("valid config");
        let result = plan(&mut planner, &snapshot);

        assert_one_command_each(&snapshot, &result);
        for command in &result.commands {
            match *command {
                MotionCommand::Thrust { speed, heading, .. } => {
                    assert!(speed <= MAX_SPEED, "seed {}: speed {}", seed, speed);
                    assert!(heading < 360, "seed {}: heading {}", seed, heading);
                }
                MotionCommand::Dock { unit_id, node_id } => {
                    let u = snapshot.unit(unit_id).expect("docking unit");
                    let n = snapshot.node(node_id).expect("dock node");
                    assert!(!u.is_docked());
                    assert!(n.in_dock_range(&u.position), "seed {}", seed);
                    assert_ne!(snapshot.posture, Posture::Rush);
                }
                MotionCommand::Undock { unit_id } => {
                    assert!(snapshot.unit(unit_id).is_some_and(|u| u.is_docked()));
                }
                MotionCommand::Hold { .. } => {}
            }
        }
    }
}

#[test]
fn test_no_oversaturation_drift() {
    let config = PlannerConfig::default();
    for seed in 0..40 {
        let snapshot = random_world(seed);
        let ratio = config.profile(snapshot.posture).combat_ratio;
        let mut planner = Planner::new(config.clone()).expect("valid config");
        let result = plan(&mut planner, &snapshot);

        for (target, committed) in result.capacity.iter() {
            match *target {
                TargetRef::Hostile(_) => {
                    let threshold =
                        CapacityTracker::strength_threshold(*target, ratio, &snapshot, &result.scratch)
                            .unwrap_or_default();
                    assert!(
                        committed.strength - threshold < BASE_UNIT_HEALTH + 1e-9,
                        "seed {}: {:?} over by {}",
                        seed,
                        target,
                        committed.strength - threshold
                    );
                }
                TargetRef::Node(id) => {
                    let node = snapshot.node(id).expect("committed node");
                    let occupied = match node.owner {
                        Some(owner) if owner == ME => node.docked_units.len() as u32,
                        Some(_) => panic!("seed {}: committed to enemy node {}", seed, id),
                        None => 0,
                    };
                    assert!(committed.approaching + occupied <= node.docking_slots, "seed {}", seed);
                }
                TargetRef::Anchor(_) => assert!(committed.approaching <= 1),
            }
        }
    }
}

#[test]
fn test_cycles_are_deterministic() {
    for seed in 0..20 {
        let snapshot = random_world(seed);
        let first = plan(&mut Planner::new(PlannerConfig::default()).expect("valid config"), &snapshot);
        let second = plan(&mut Planner::new(PlannerConfig::default()).expect("valid config"), &snapshot);
        assert_eq!(first.commands, second.commands, "seed {}", seed);
    }
}

#[test]
fn test_consecutive_cycles_keep_state_consistent() {
    let mut planner = Planner::new(PlannerConfig::default()).expect("valid config");
    let mut snapshot = random_world(2);
    for turn in 1..6 {
        snapshot.turn = turn;
        let result = plan(&mut planner, &snapshot);
        assert_one_command_each(&snapshot, &result);

        for cluster in planner.clusters().iter() {
            assert!(cluster.members.len() >= 2);
            for member in &cluster.members {
                assert_eq!(planner.clusters().cluster_of(*member), Some(cluster.id));
            }
        }
        assert!(planner.memory().len() <= snapshot.my_units().count());
    }
}
