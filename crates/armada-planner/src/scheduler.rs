//! The assignment scheduler.
//!
//! `Planner` owns what survives between cycles (configuration, fleet memory,
//! cluster registry). Each call to `plan_cycle` builds a fresh `Cycle` that
//! owns the scratch table and capacity tracker for that cycle only, walks
//! every unit through `Unplanned -> Scored -> Committed`, and returns one
//! command per controlled unit. Units with a hostile close by get a
//! skirmish pass before they take a fleet-level target.

use armada_core::commands::MotionCommand;
use armada_core::config::{PlannerConfig, PostureProfile};
use armada_core::constants::*;
use armada_core::enums::{DockingState, Posture};
use armada_core::error::{ConfigError, ValidationError};
use armada_core::scratch::{CycleScratch, PlanState};
use armada_core::snapshot::{Unit, WorldSnapshot};
use armada_core::target::TargetRef;
use armada_core::types::PlannedMove;
use armada_nav::{Course, Goal, Mover, NavOptions, Navigator};

use crate::capacity::CapacityTracker;
use crate::clock::TurnClock;
use crate::cluster::ClusterRegistry;
use crate::memory::{Engagement, FleetMemory};
use crate::neighbours::{self, CLOCK_CHECK_INTERVAL};
use crate::params::CycleParameters;
use crate::skirmish::Skirmish;
use crate::utility::{Candidate, UtilityScorer};

/// Everything a cycle produced.
#[derive(Debug, Clone)]
pub struct CyclePlan {
    pub commands: Vec<MotionCommand>,
    pub capacity: CapacityTracker,
    pub scratch: CycleScratch,
    pub params: CycleParameters,
}

impl CyclePlan {
    pub fn command_for(&self, unit: u32) -> Option<&MotionCommand> {
        self.commands.iter().find(|c| c.unit_id() == unit)
    }
}

pub struct Planner {
    config: PlannerConfig,
    memory: FleetMemory,
    clusters: ClusterRegistry,
}

impl Planner {
    /// Create a planner. Rejects a configuration that fails validation.
    pub fn new(config: PlannerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            memory: FleetMemory::new(),
            clusters: ClusterRegistry::new(),
        })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn memory(&self) -> &FleetMemory {
        &self.memory
    }

    pub fn clusters(&self) -> &ClusterRegistry {
        &self.clusters
    }

    /// Plan one cycle against the configured wall-clock budget.
    pub fn plan_cycle(&mut self, snapshot: &WorldSnapshot) -> Result<CyclePlan, ValidationError> {
        let clock = TurnClock::start(&self.config.deadlines);
        self.plan_cycle_with_clock(snapshot, clock)
    }

    /// Plan one cycle against an explicit clock.
    ///
    /// A malformed snapshot is rejected before any state is touched. Past
    /// that point the cycle always completes.
    pub fn plan_cycle_with_clock(
        &mut self,
        snapshot: &WorldSnapshot,
        clock: TurnClock,
    ) -> Result<CyclePlan, ValidationError> {
        snapshot.validate()?;

        self.memory.prune(snapshot);
        let dissolved = self.clusters.refresh(snapshot);
        if !dissolved.is_empty() {
            log::debug!("turn {}: dissolved clusters {:?}", snapshot.turn, dissolved);
        }

        let profile = self.config.profile(snapshot.posture);
        let params = CycleParameters::compute(snapshot);
        let mut scratch = CycleScratch::new(snapshot);
        neighbours::scan(
            snapshot,
            &mut scratch,
            profile.horizon_turns,
            params.dock_check_radius,
            &clock,
        );

        let mut cycle = Cycle {
            snapshot,
            config: &self.config,
            profile,
            params,
            clock,
            scratch,
            capacity: CapacityTracker::new(),
            memory: &mut self.memory,
            clusters: &mut self.clusters,
            commands: Vec::new(),
        };
        cycle.run();
        Ok(cycle.finish())
    }
}

/// How an assignment is booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Booking {
    /// Commit capacity and remember the target.
    Commit,
    /// Capacity was committed when the target was forced; only remember it.
    Forced,
    /// Neither.
    Fallback,
}

enum DockDecision {
    Dock,
    Defend(u32),
    Engaged,
}

struct Cycle<'p> {
    snapshot: &'p WorldSnapshot,
    config: &'p PlannerConfig,
    profile: &'p PostureProfile,
    params: CycleParameters,
    clock: TurnClock,
    scratch: CycleScratch,
    capacity: CapacityTracker,
    memory: &'p mut FleetMemory,
    clusters: &'p mut ClusterRegistry,
    commands: Vec<MotionCommand>,
}

impl<'p> Cycle<'p> {
    fn run(&mut self) {
        self.order_docked();

        if self.profile.cluster_formation {
            let formed = self.clusters.auto_form(self.snapshot, &self.scratch);
            if !formed.is_empty() {
                log::debug!("turn {}: formed clusters {:?}", self.snapshot.turn, formed);
            }
        }

        let order = self.unit_order();
        for (done, id) in order.iter().enumerate() {
            if self.clock.past_hard() {
                log::warn!(
                    "turn {}: hard deadline passed with {} units unplanned",
                    self.snapshot.turn,
                    order.len() - done
                );
                break;
            }
            self.plan_unit(*id);
        }

        self.fallback_pass();
        self.log_summary();
    }

    fn finish(self) -> CyclePlan {
        CyclePlan {
            commands: self.commands,
            capacity: self.capacity,
            scratch: self.scratch,
            params: self.params,
        }
    }

    fn scorer(&self) -> UtilityScorer<'_> {
        UtilityScorer {
            snapshot: self.snapshot,
            scratch: &self.scratch,
            capacity: &self.capacity,
            memory: &*self.memory,
            clusters: &*self.clusters,
            config: self.config,
            params: &self.params,
        }
    }

    fn is_saturated(&self, target: TargetRef, ratio: f64) -> bool {
        self.capacity
            .is_saturated(target, ratio, self.snapshot, &self.scratch)
    }

    /// Docked units undock once their node is exhausted and hold otherwise.
    fn order_docked(&mut self) {
        let snapshot = self.snapshot;
        for unit in snapshot.my_units().filter(|u| u.is_docked()) {
            let exhausted = unit.docking == DockingState::Docked
                && unit
                    .docked_node
                    .and_then(|id| snapshot.node(id))
                    .is_some_and(|node| node.remaining_production <= 0.0);
            if exhausted {
                log::debug!("unit {} undocking from exhausted node", unit.id);
                self.push(unit.id, MotionCommand::Undock { unit_id: unit.id }, None);
            } else {
                self.push(unit.id, MotionCommand::Hold { unit_id: unit.id }, None);
            }
        }
    }

    /// Highest known utility first. Scoring stops once the soft deadline
    /// passes; the units not yet scored follow in urgency order.
    fn unit_order(&mut self) -> Vec<u32> {
        let snapshot = self.snapshot;
        let units: Vec<&Unit> = snapshot
            .my_undocked_units()
            .filter(|u| !self.scratch.has_command(u.id))
            .collect();

        let mut scored: Vec<(u32, f64)> = Vec::with_capacity(units.len());
        for (i, unit) in units.iter().enumerate() {
            if i % CLOCK_CHECK_INTERVAL == 0 && self.clock.past_soft() {
                log::warn!(
                    "turn {}: soft deadline passed after scoring {} of {} units",
                    snapshot.turn,
                    i,
                    units.len()
                );
                break;
            }
            let best = self.scorer().candidates(unit).first().copied();
            self.mark_scored(unit.id, best);
            scored.push((unit.id, best.map_or(0.0, |c| c.utility)));
        }
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let rest = urgency_order(snapshot, &*self.memory, &units[scored.len()..]);
        scored.into_iter().map(|(id, _)| id).chain(rest).collect()
    }

    fn mark_scored(&mut self, id: u32, best: Option<Candidate>) {
        if let Some(entry) = self.scratch.get_mut(id) {
            entry.state = PlanState::Scored;
            entry.best_utility = best.map_or(0.0, |c| c.utility);
            entry.best_target = best.filter(|c| c.utility > 0.0).map(|c| c.target);
        }
    }

    fn plan_unit(&mut self, id: u32) {
        let snapshot = self.snapshot;
        if self.scratch.has_command(id) {
            return;
        }
        let Some(unit) = snapshot.unit(id) else {
            return;
        };

        let candidates = self.scorer().candidates(unit);
        self.mark_scored(id, candidates.first().copied());

        if let Some(forced) = self.scratch.get(id).and_then(|s| s.forced_target) {
            if self.assign(unit, forced, Booking::Forced) {
                return;
            }
        }

        if self.skirmish(unit) {
            return;
        }

        if let Some(node) = self.dockable(unit, candidates.first()) {
            match self.dock_decision(unit) {
                DockDecision::Dock => {
                    self.dock(unit, node);
                    return;
                }
                DockDecision::Defend(threat) => {
                    if self.assign(unit, TargetRef::Hostile(threat), Booking::Commit) {
                        return;
                    }
                }
                DockDecision::Engaged => {}
            }
        }

        for candidate in candidates.iter().filter(|c| c.utility > 0.0) {
            if self.is_saturated(candidate.target, self.profile.combat_ratio) {
                continue;
            }
            if self.assign(unit, candidate.target, Booking::Commit) {
                return;
            }
        }
    }

    /// The node a unit could dock at right now, if its best target is one.
    fn dockable(&self, unit: &Unit, best: Option<&Candidate>) -> Option<u32> {
        if self.snapshot.posture == Posture::Rush {
            return None;
        }
        let best = best.filter(|c| c.utility > 0.0)?;
        let TargetRef::Node(id) = best.target else {
            return None;
        };
        let node = self.snapshot.node(id)?;
        let open = node.in_dock_range(&unit.position)
            && !self.is_saturated(best.target, self.profile.combat_ratio);
        open.then_some(id)
    }

    fn dock_decision(&mut self, unit: &Unit) -> DockDecision {
        let Some(entry) = self.scratch.get(unit.id) else {
            return DockDecision::Engaged;
        };
        let engaged = !entry.engaged_enemies.is_empty();
        let mut threats = entry.dock_threats.clone();
        let small_fleet = self.params.fleet_size <= SMALL_FLEET;
        if small_fleet {
            if let Some(nearest) = entry.nearest_enemy {
                if !threats.contains(&nearest) {
                    threats.push(nearest);
                }
            }
        }

        let ratio = if small_fleet { 1.0 } else { DOCK_CHECK_RATIO };
        for threat in threats {
            if self.is_saturated(TargetRef::Hostile(threat), ratio) {
                continue;
            }
            if self.friend_defends(unit, threat) {
                continue;
            }
            return DockDecision::Defend(threat);
        }

        if engaged {
            DockDecision::Engaged
        } else {
            DockDecision::Dock
        }
    }

    /// Force an idle nearby friend, no further from `threat` than `unit`, onto it.
    fn friend_defends(&mut self, unit: &Unit, threat: u32) -> bool {
        let snapshot = self.snapshot;
        let Some(hostile) = snapshot.unit(threat) else {
            return false;
        };
        let friends = self
            .scratch
            .get(unit.id)
            .map(|s| s.nearby_friends.clone())
            .unwrap_or_default();

        for friend_id in friends {
            let idle = self
                .scratch
                .get(friend_id)
                .is_some_and(|s| !s.has_command && s.forced_target.is_none());
            let Some(friend) = snapshot.unit(friend_id) else {
                continue;
            };
            if !idle || hostile.position.is_nearer(&unit.position, &friend.position) {
                continue;
            }

            let target = TargetRef::Hostile(threat);
            let health = self.scratch.effective_health(friend_id);
            if let Some(entry) = self.scratch.get_mut(friend_id) {
                entry.forced_target = Some(target);
            }
            self.capacity.commit(target, health);
            log::debug!("unit {} forced onto hostile {} to cover a dock", friend_id, threat);
            return true;
        }
        false
    }

    fn dock(&mut self, unit: &Unit, node: u32) {
        let target = TargetRef::Node(node);
        self.capacity.commit(target, self.scratch.effective_health(unit.id));
        self.push(unit.id, MotionCommand::Dock { unit_id: unit.id, node_id: node }, None);
        self.clusters.remove_member(unit.id);
        if let Some(at) = target.position(self.snapshot) {
            self.memory
                .record_target(unit.id, target, unit.position.distance_sq_to(&at));
        }

        let mut watch = self
            .scratch
            .get(unit.id)
            .map(|s| s.dock_threats.clone())
            .unwrap_or_default();
        if let Some(nearest) = self.scratch.get(unit.id).and_then(|s| s.nearest_enemy) {
            watch.push(nearest);
        }
        for hostile in watch {
            neighbours::guard_dock(
                self.snapshot,
                &mut self.scratch,
                hostile,
                unit.id,
                self.profile.horizon_turns,
            );
        }
        log::debug!("unit {} docking at node {}", unit.id, node);
    }

    /// Navigate `unit` (or its cluster) to `target` and book the result.
    fn assign(&mut self, unit: &Unit, target: TargetRef, booking: Booking) -> bool {
        let Some(goal) = Goal::from_target(target, self.snapshot) else {
            return false;
        };
        if matches!(target, TargetRef::Node(_)) {
            self.clusters.remove_member(unit.id);
        }

        if let Some(cluster) = self.clusters.cluster_of(unit.id) {
            if self.assign_cluster(cluster, target, &goal, booking) {
                return true;
            }
            self.clusters.remove_member(unit.id);
        }

        let Some(course) = self.steer(unit, &goal) else {
            return false;
        };
        self.issue(unit, course);
        self.book(unit, target, booking);
        true
    }

    fn assign_cluster(&mut self, id: u32, target: TargetRef, goal: &Goal, booking: Booking) -> bool {
        let snapshot = self.snapshot;
        let Some(cluster) = self.clusters.get(id).cloned() else {
            return false;
        };

        let orders: Vec<(u32, Course)> = if cluster.formed {
            let navigator = Navigator::new(snapshot, &self.scratch);
            let options = NavOptions {
                force_zero: true,
                ..Default::default()
            };
            let Some(course) = cluster.navigate_as_unit(&navigator, snapshot, goal, &options) else {
                return false;
            };
            cluster.broadcast(course, &self.scratch)
        } else {
            cluster.clump_to(snapshot, &goal.position)
        };
        if orders.is_empty() {
            return false;
        }
        self.clusters.mark_formed(id);

        for (member, course) in orders {
            if self.scratch.has_command(member) {
                continue;
            }
            let Some(unit) = snapshot.unit(member) else {
                continue;
            };
            self.issue(unit, course);
            let booking = match booking {
                Booking::Commit if self.is_saturated(target, self.profile.combat_ratio) => Booking::Forced,
                other => other,
            };
            self.book(unit, target, booking);
        }
        true
    }

    fn steer(&self, unit: &Unit, goal: &Goal) -> Option<Course> {
        let options = NavOptions {
            force_zero: true,
            ..Default::default()
        };
        self.steer_with(unit, goal, &options)
    }

    fn steer_with(&self, unit: &Unit, goal: &Goal, options: &NavOptions) -> Option<Course> {
        let ids = [unit.id];
        let mover = Mover::unit(unit.position, unit.radius, &ids);
        Navigator::new(self.snapshot, &self.scratch).navigate(&mover, goal, options)
    }

    fn skirmish_view(&self) -> Skirmish<'_> {
        Skirmish {
            snapshot: self.snapshot,
            scratch: &self.scratch,
            capacity: &self.capacity,
            memory: &*self.memory,
            clusters: &*self.clusters,
            combat_ratio: self.profile.combat_ratio,
            reengage_tolerance: self.config.reengage_tolerance,
        }
    }

    /// Close-quarters manoeuvres. Returns true once the unit has a command;
    /// otherwise it goes on to fleet-level targets.
    fn skirmish(&mut self, unit: &Unit) -> bool {
        if !self.config.skirmish || !self.params.skirmish {
            return false;
        }
        let snapshot = self.snapshot;
        let Some(hostile) = self.skirmish_view().opponent(unit).and_then(|id| snapshot.unit(id)) else {
            return false;
        };
        let nearby = unit.position.is_within(&hostile.position, NEARBY_RADIUS);
        let in_reach = unit.position.is_within(&hostile.position, MOVE_AND_FIRE_RADIUS);
        let rush = snapshot.posture == Posture::Rush;

        if rush && self.skirmish_view().owner_has_docked(hostile) {
            return false;
        }
        if nearby && self.skirmish_view().should_run(unit) && self.run_away(unit) {
            return true;
        }

        if rush {
            let zone = if snapshot.turn <= EARLY_RUSH_TURNS {
                MOVE_AND_FIRE_RADIUS
            } else {
                WEAPON_RADIUS + ZONE_MARGIN
            };
            if unit.position.is_within(&hostile.position, zone) && self.zone_out(unit, hostile) {
                return true;
            }
            return nearby && self.zone_in(unit, hostile, true);
        }

        if in_reach && self.skirmish_view().friends_can_engage(hostile.id) {
            self.engage(hostile);
            for id in self.clumped_with(hostile.id) {
                if let Some(other) = snapshot.unit(id) {
                    self.engage(other);
                }
            }
            if self.scratch.has_command(unit.id) {
                return true;
            }
        }
        if hostile.is_docked() {
            return false;
        }

        let target = TargetRef::Hostile(hostile.id);
        let best = self.scratch.get(unit.id).and_then(|s| s.best_target);
        let central = unit.position.is_within(&snapshot.mid_map(), MID_MAP_RADIUS);
        if central && in_reach && best == Some(target) && self.zone_out(unit, hostile) {
            return true;
        }
        if !nearby {
            return false;
        }
        if let Some(best) = best.filter(|t| *t != target && !matches!(t, TargetRef::Node(_))) {
            return self.round(unit, hostile, best);
        }
        let outmatched = self.scratch.effective_health(unit.id) < self.scratch.effective_health(hostile.id);
        (outmatched || !self.clumped_with(hostile.id).is_empty()) && self.zone_in(unit, hostile, false)
    }

    fn clumped_with(&self, hostile: u32) -> Vec<u32> {
        self.scratch
            .get(hostile)
            .map(|s| s.clumped_hostiles.clone())
            .unwrap_or_default()
    }

    fn cluster_radius(&self, unit: u32) -> Option<f64> {
        let cluster = self.clusters.cluster_of(unit).and_then(|id| self.clusters.get(id))?;
        cluster.aggregate(self.snapshot).map(|body| body.radius)
    }

    /// Send the friends in reach of `hostile` at it, as many as its clump's
    /// health calls for. Friends around each attacker join the fight too.
    fn engage(&mut self, hostile: &Unit) {
        let snapshot = self.snapshot;
        let (attackers, needed) = {
            let view = self.skirmish_view();
            (view.attackers(hostile.id), view.attack_size(hostile.id))
        };
        let options = NavOptions {
            engage: true,
            ..Default::default()
        };

        let mut engaged = 0;
        for id in attackers {
            if engaged >= needed {
                break;
            }
            if self.scratch.has_command(id) {
                continue;
            }
            let Some(friend) = snapshot.unit(id) else {
                continue;
            };
            let neighbours = self
                .scratch
                .get(id)
                .map(|s| s.nearby_friends.clone())
                .unwrap_or_default();
            for n in neighbours {
                if let Some(entry) = self.scratch.get_mut(n) {
                    entry.aggressive = true;
                }
            }

            let Some(goal) = self.skirmish_view().attack_goal(friend, hostile, self.params.top_target) else {
                continue;
            };
            for member in self.manoeuvre(friend, &goal, &options) {
                if self.strike(member, hostile) {
                    engaged += 1;
                }
            }
        }
        if engaged > 0 {
            log::debug!("{} units engaging hostile {}", engaged, hostile.id);
        }
    }

    /// Book an attacker whose move ends within weapon reach of `hostile`.
    fn strike(&mut self, id: u32, hostile: &Unit) -> bool {
        let Some(unit) = self.snapshot.unit(id) else {
            return false;
        };
        let end = self.scratch.planned(id).map_or(unit.position, |m| m.end);
        if !end.is_within(&hostile.position, WEAPON_RADIUS) {
            return false;
        }
        self.memory.record_engagement(
            id,
            Engagement {
                hostile: hostile.id,
                health: hostile.health,
                turn: self.snapshot.turn,
            },
        );
        self.commit_capped(id, hostile.id);
        true
    }

    /// Retreat sideways from a losing fight. Commits nothing.
    fn run_away(&mut self, unit: &Unit) -> bool {
        let Some(escape) = self.skirmish_view().escape(unit) else {
            return false;
        };
        let options = NavOptions {
            avoid_hostiles: true,
            ..Default::default()
        };

        let end = self
            .steer_with(unit, &Goal::point(escape.preferred), &options)
            .map(|c| unit.position.offset(c.speed as f64, c.heading as f64));
        let mut to = escape.preferred;
        if end.map_or(true, |end| self.skirmish_view().exposed_at(unit, &end)) {
            to = escape.alternative;
        }
        if self.skirmish_view().exposed_at(unit, &to) {
            to = escape.straight_back;
        }

        let Some(course) = self.steer_with(unit, &Goal::point(to), &options) else {
            return false;
        };
        log::debug!("unit {} running from a losing fight", unit.id);
        self.issue(unit, course);
        true
    }

    /// Hold just outside the hostile's reach.
    fn zone_out(&mut self, unit: &Unit, hostile: &Unit) -> bool {
        let radius = self.cluster_radius(unit.id);
        let to = self.skirmish_view().zone_out_point(unit, hostile, radius);
        if self.manoeuvre(unit, &Goal::point(to), &NavOptions::default()).is_empty() {
            return false;
        }
        self.commit_capped(unit.id, hostile.id);
        if self.snapshot.turn >= CLUMPED_COMMIT_TURN {
            for id in self.clumped_with(hostile.id) {
                self.commit_capped(unit.id, id);
            }
        }
        true
    }

    /// Close to the edge of our reach on the hostile.
    fn zone_in(&mut self, unit: &Unit, hostile: &Unit, rush: bool) -> bool {
        let radius = self.cluster_radius(unit.id);
        let to = self.skirmish_view().zone_in_point(unit, hostile, radius, rush);
        let options = NavOptions {
            force_zero: true,
            ..Default::default()
        };
        if self.manoeuvre(unit, &Goal::point(to), &options).is_empty() {
            return false;
        }
        self.commit_capped(unit.id, hostile.id);
        true
    }

    /// Swing round the hostile towards a better target.
    fn round(&mut self, unit: &Unit, hostile: &Unit, best: TargetRef) -> bool {
        let Some(goal) = self.skirmish_view().round_goal(unit, hostile, best) else {
            return false;
        };
        !self.manoeuvre(unit, &goal, &NavOptions::default()).is_empty()
    }

    /// Navigate `unit`, or its whole cluster, and issue the result. Returns
    /// the ids that received a command.
    fn manoeuvre(&mut self, unit: &Unit, goal: &Goal, options: &NavOptions) -> Vec<u32> {
        let snapshot = self.snapshot;
        let cluster = self
            .clusters
            .cluster_of(unit.id)
            .and_then(|id| self.clusters.get(id));
        let orders = match cluster {
            Some(cluster) => {
                let navigator = Navigator::new(snapshot, &self.scratch);
                cluster
                    .navigate_as_unit(&navigator, snapshot, goal, options)
                    .map(|course| cluster.broadcast(course, &self.scratch))
                    .unwrap_or_default()
            }
            None => self
                .steer_with(unit, goal, options)
                .map(|course| vec![(unit.id, course)])
                .unwrap_or_default(),
        };

        let mut issued = Vec::with_capacity(orders.len());
        for (id, course) in orders {
            if let Some(member) = snapshot.unit(id) {
                self.issue(member, course);
                issued.push(id);
            }
        }
        issued
    }

    /// Commit to a hostile only while it still needs strength.
    fn commit_capped(&mut self, unit: u32, hostile: u32) {
        let target = TargetRef::Hostile(hostile);
        if !self.is_saturated(target, self.profile.combat_ratio) {
            self.capacity.commit(target, self.scratch.effective_health(unit));
        }
    }

    fn issue(&mut self, unit: &Unit, course: Course) {
        let (command, planned) = if course.is_hold() {
            (MotionCommand::Hold { unit_id: unit.id }, None)
        } else {
            (
                MotionCommand::Thrust {
                    unit_id: unit.id,
                    speed: course.speed,
                    heading: course.heading,
                },
                Some(PlannedMove::from_origin(unit.position, course.speed, course.heading)),
            )
        };
        self.push(unit.id, command, planned);
    }

    fn push(&mut self, id: u32, command: MotionCommand, planned: Option<PlannedMove>) {
        if let Some(entry) = self.scratch.get_mut(id) {
            entry.planned = planned;
            entry.has_command = true;
            entry.state = PlanState::Committed;
        }
        self.commands.push(command);
    }

    fn book(&mut self, unit: &Unit, target: TargetRef, booking: Booking) {
        if booking == Booking::Fallback {
            return;
        }
        if booking == Booking::Commit {
            let health = self.scratch.effective_health(unit.id);
            self.capacity.commit(target, health);
            log::debug!("unit {} committed {:.0} health to {:?}", unit.id, health, target);
        }

        let Some(at) = target.position(self.snapshot) else {
            return;
        };
        self.memory
            .record_target(unit.id, target, unit.position.distance_sq_to(&at));

        if let TargetRef::Hostile(id) = target {
            let end = self.scratch.planned(unit.id).map_or(unit.position, |m| m.end);
            if let Some(hostile) = self.snapshot.unit(id) {
                if end.is_within(&hostile.position, WEAPON_RADIUS) {
                    self.memory.record_engagement(
                        unit.id,
                        Engagement {
                            hostile: id,
                            health: hostile.health,
                            turn: self.snapshot.turn,
                        },
                    );
                }
            }
        }
    }

    /// Cheap commands for every unit the main pass left without one.
    fn fallback_pass(&mut self) {
        let snapshot = self.snapshot;
        let pending: Vec<&Unit> = snapshot
            .my_undocked_units()
            .filter(|u| !self.scratch.has_command(u.id))
            .collect();
        if pending.is_empty() {
            return;
        }
        log::debug!("turn {}: {} units on fallback", snapshot.turn, pending.len());

        let (global_target, global_goal) = self.global_goal();
        for unit in pending {
            if self.scratch.has_command(unit.id) {
                continue;
            }
            if self.clock.past_fallback() {
                self.issue(unit, Course::hold());
                continue;
            }

            let forced = self.scratch.get(unit.id).and_then(|s| s.forced_target);
            if let Some(target) = forced {
                if self.assign(unit, target, Booking::Forced) {
                    continue;
                }
            }
            let mission = self.memory.get(unit.id).and_then(|m| m.mission);
            if let Some(target) = mission {
                if !self.is_saturated(target, self.profile.combat_ratio)
                    && self.assign(unit, target, Booking::Fallback)
                {
                    continue;
                }
            }

            let blocked = global_target.is_some_and(|t| self.is_saturated(t, FALLBACK_COMBAT_RATIO));
            let course = match global_goal {
                Some(goal) if !blocked => self.steer(unit, &goal),
                _ => None,
            };
            self.issue(unit, course.unwrap_or_else(Course::hold));
        }
    }

    /// Top target, else the strongest opponent's centroid, else our own.
    fn global_goal(&self) -> (Option<TargetRef>, Option<Goal>) {
        let snapshot = self.snapshot;
        if let Some(target) = self.params.top_target {
            if let Some(goal) = Goal::from_target(target, snapshot) {
                return (Some(target), Some(goal));
            }
        }
        let centre = self
            .params
            .strongest_opponent
            .and_then(|player| snapshot.centroid_of(player))
            .or(self.params.fleet_centroid);
        (None, centre.map(Goal::point))
    }

    fn log_summary(&self) {
        let mut thrust = 0;
        let mut dock = 0;
        let mut undock = 0;
        let mut hold = 0;
        for command in &self.commands {
            match command {
                MotionCommand::Thrust { .. } => thrust += 1,
                MotionCommand::Dock { .. } => dock += 1,
                MotionCommand::Undock { .. } => undock += 1,
                MotionCommand::Hold { .. } => hold += 1,
            }
        }
        log::info!(
            "turn {}: {} thrust, {} dock, {} undock, {} hold, {} clusters in {:?}",
            self.snapshot.turn,
            thrust,
            dock,
            undock,
            hold,
            self.clusters.len(),
            self.clock.elapsed()
        );
    }
}

/// Units with a mission first, then those closest to a hostile.
pub(crate) fn urgency_order(snapshot: &WorldSnapshot, memory: &FleetMemory, units: &[&Unit]) -> Vec<u32> {
    let mut keyed: Vec<(bool, f64, u32)> = units
        .iter()
        .map(|u| {
            let nearest = snapshot
                .hostile_units()
                .map(|h| u.position.distance_sq_to(&h.position))
                .fold(f64::INFINITY, f64::min);
            let no_mission = memory.get(u.id).and_then(|m| m.mission).is_none();
            (no_mission, nearest, u.id)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
    keyed.into_iter().map(|(_, _, id)| id).collect()
}
