//! Navigator: turn a goal into a speed and heading that avoid obstacles.
//!
//! Obstacle negotiation is a bounded two-step loop. The first contact is
//! deflected around; if the deflected path hits something else, that
//! contact gets one more deflection, and a third conflict slows or stops
//! the mover.

use armada_core::constants::*;
use armada_core::scratch::CycleScratch;
use armada_core::snapshot::WorldSnapshot;
use armada_core::target::TargetRef;
use armada_core::types::{angular_difference, velocity_from, Position};

use crate::airspace::{Airspace, Contact, ObstacleRef, Scan};
use crate::collision::{crossing_point, predict_with_velocity, velocity_toward};

/// What is being steered: a single unit or a cluster's aggregate body.
#[derive(Debug, Clone, Copy)]
pub struct Mover<'m> {
    pub position: Position,
    pub radius: f64,
    /// Unit ids that make up the mover; they never block it.
    pub members: &'m [u32],
    pub is_cluster: bool,
}

impl<'m> Mover<'m> {
    pub fn unit(position: Position, radius: f64, id: &'m [u32]) -> Self {
        Self {
            position,
            radius,
            members: id,
            is_cluster: false,
        }
    }
}

/// What kind of thing the mover is heading for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GoalKind {
    Node(u32),
    Hostile { id: u32, docked_node: Option<u32> },
    Friendly(u32),
    Anchor,
    Point,
}

/// A destination with its footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Goal {
    pub position: Position,
    pub radius: f64,
    pub kind: GoalKind,
}

impl Goal {
    pub fn point(position: Position) -> Self {
        Self {
            position,
            radius: 0.0,
            kind: GoalKind::Point,
        }
    }

    /// Build a goal from a target reference. `None` if the target is gone.
    pub fn from_target(target: TargetRef, snapshot: &WorldSnapshot) -> Option<Self> {
        let resolved = target.resolve(snapshot)?;
        let kind = match target {
            TargetRef::Node(id) => GoalKind::Node(id),
            TargetRef::Anchor(_) => GoalKind::Anchor,
            TargetRef::Hostile(id) => {
                let unit = snapshot.unit(id)?;
                if snapshot.is_mine(unit) {
                    GoalKind::Friendly(id)
                } else {
                    GoalKind::Hostile {
                        id,
                        docked_node: unit.docked_node.filter(|_| unit.is_docked()),
                    }
                }
            }
        };
        Some(Self {
            position: resolved.position,
            radius: resolved.radius,
            kind,
        })
    }

    fn obstacle(&self) -> Option<ObstacleRef> {
        match self.kind {
            GoalKind::Node(id) => Some(ObstacleRef::Node(id)),
            GoalKind::Hostile { id, .. } | GoalKind::Friendly(id) => Some(ObstacleRef::Unit(id)),
            GoalKind::Anchor | GoalKind::Point => None,
        }
    }

    fn node(&self) -> Option<u32> {
        match self.kind {
            GoalKind::Node(id) => Some(id),
            _ => None,
        }
    }
}

/// Per-call navigation switches.
#[derive(Debug, Clone, Copy)]
pub struct NavOptions {
    /// Extra clearance added to every combined radius.
    pub fudge: f64,
    /// Close to combat standoff instead of approach standoff.
    pub engage: bool,
    /// Emit an explicit zero-speed course instead of nothing.
    pub force_zero: bool,
    /// Treat undocked hostiles as blocking; meeting one halts the mover.
    pub avoid_hostiles: bool,
}

impl Default for NavOptions {
    fn default() -> Self {
        Self {
            fudge: NAV_FUDGE,
            engage: false,
            force_zero: false,
            avoid_hostiles: false,
        }
    }
}

/// Result of obstacle negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steering {
    Clear { speed: u32, heading: u32 },
    Blocked,
}

/// Integer speed and heading for one cycle. Speed 0 is an explicit hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Course {
    pub speed: u32,
    pub heading: u32,
}

impl Course {
    pub fn hold() -> Self {
        Self {
            speed: 0,
            heading: 0,
        }
    }

    pub fn is_hold(&self) -> bool {
        self.speed == 0
    }

    fn from_raw(speed: f64, heading: f64) -> Self {
        Self {
            speed: speed.clamp(0.0, MAX_SPEED_F).floor() as u32,
            heading: (heading.round() as i64).rem_euclid(360) as u32,
        }
    }
}

pub struct Navigator<'a> {
    airspace: Airspace<'a>,
}

impl<'a> Navigator<'a> {
    pub fn new(snapshot: &'a WorldSnapshot, scratch: &'a CycleScratch) -> Self {
        Self {
            airspace: Airspace::new(snapshot, scratch),
        }
    }

    /// Plan a course for `mover` towards `goal`.
    ///
    /// Returns `None` when no command is needed (already at the standoff
    /// point, or the negotiated speed rounds to zero) unless `force_zero`
    /// is set, in which case a hold course is returned instead.
    pub fn navigate(&self, mover: &Mover<'_>, goal: &Goal, options: &NavOptions) -> Option<Course> {
        let standoff = self.standoff(mover, goal, options);
        let aim_at = self.intercept_point(mover, goal).unwrap_or(goal.position);
        let approach = self.approach_point(mover, goal, aim_at, standoff);

        let distance = mover.position.distance_to(&approach);
        let angle = mover.position.angle_to(&approach);
        if distance < ARRIVAL_TOLERANCE {
            return options.force_zero.then(Course::hold);
        }

        let speed = distance.min(MAX_SPEED_F);
        let look_ahead = mover.position.offset(distance.min(LOOK_AHEAD_FACTOR * speed), angle);

        let goal_skip: Vec<ObstacleRef> = goal.obstacle().into_iter().collect();
        let contact = self.airspace.closest_obstacle(&Scan {
            origin: mover.position,
            radius: mover.radius,
            velocity: velocity_toward(&mover.position, &look_ahead),
            fudge: options.fudge,
            members: mover.members,
            skip: &goal_skip,
            avoid_hostiles: options.avoid_hostiles,
        });

        let (speed, heading) = match contact {
            None => (speed, angle),
            Some(contact) => {
                log::debug!("nav: obstacle {:?} at t={:.3}", contact.obstacle, contact.time);
                match self.negotiate(mover, goal, look_ahead, contact, options) {
                    Steering::Clear { speed, heading } => (speed as f64, heading as f64),
                    Steering::Blocked => return Some(Course::hold()),
                }
            }
        };

        let heading = self.corner_correction(mover, goal, speed, heading);
        let course = Course::from_raw(speed, heading);
        if course.is_hold() && !options.force_zero {
            return None;
        }
        Some(course)
    }

    /// Minimum distance to keep from the goal's edge.
    fn standoff(&self, mover: &Mover<'_>, goal: &Goal, options: &NavOptions) -> f64 {
        match goal.kind {
            GoalKind::Node(_) => NODE_STANDOFF,
            GoalKind::Anchor | GoalKind::Point => 0.0,
            GoalKind::Friendly(_) => FRIENDLY_STANDOFF,
            GoalKind::Hostile { docked_node, .. } => match (mover.is_cluster, docked_node.is_some()) {
                (true, true) => CLUSTER_DOCKED_STANDOFF,
                (true, false) => COMBAT_STANDOFF,
                (false, true) => DOCKED_HOSTILE_STANDOFF,
                (false, false) if options.engage => COMBAT_STANDOFF,
                (false, false) => HOSTILE_STANDOFF,
            },
        }
    }

    /// Point on the goal's standoff ring nearest the mover. A docked hostile
    /// is approached from the side facing away from its node.
    fn approach_point(&self, mover: &Mover<'_>, goal: &Goal, aim_at: Position, standoff: f64) -> Position {
        let snapshot = self.airspace.snapshot();
        if aim_at != goal.position {
            return aim_at.offset(standoff, aim_at.angle_to(&mover.position));
        }
        let angle = match goal.kind {
            GoalKind::Hostile {
                docked_node: Some(node),
                ..
            } => match snapshot.node(node) {
                Some(n) => (goal.position.angle_to(&n.position) + 180.0).rem_euclid(360.0),
                None => goal.position.angle_to(&mover.position),
            },
            _ => goal.position.angle_to(&mover.position),
        };
        goal.position.offset(goal.radius + standoff, angle)
    }

    /// Redirect a chase towards a hostile that is closing on one of our
    /// docked units so that we meet it in front of the dock.
    fn intercept_point(&self, mover: &Mover<'_>, goal: &Goal) -> Option<Position> {
        let GoalKind::Hostile {
            id,
            docked_node: None,
        } = goal.kind
        else {
            return None;
        };
        let snapshot = self.airspace.snapshot();
        let dock_id = self.airspace.scratch().get(id)?.guarded_dock?;
        let dock = snapshot.unit(dock_id)?;

        let distance = dock.position.distance_to(&goal.position);
        if distance <= WEAPON_RADIUS || distance > DOCK_INTERCEPT_RANGE {
            return None;
        }
        let angle = dock.position.angle_to(&goal.position);
        if snapshot.my_units().count() <= SMALL_FLEET {
            log::debug!("nav: intercepting hostile {} in front of dock {}", id, dock_id);
            Some(dock.position.offset(dock.radius + 0.7, angle))
        } else if !mover.position.is_within(&goal.position, MOVE_AND_FIRE_RADIUS) {
            Some(dock.position.offset(0.85 * distance, angle))
        } else {
            None
        }
    }

    fn negotiate(
        &self,
        mover: &Mover<'_>,
        goal: &Goal,
        aim: Position,
        first: Contact,
        options: &NavOptions,
    ) -> Steering {
        let mut aim = aim;
        let mut contact = first;
        for depth in 0..2 {
            let Some((raw_speed, heading)) = self.deflect(mover, goal, aim, &contact, options) else {
                return Steering::Blocked;
            };
            let speed = raw_speed.clamp(0.0, MAX_SPEED_F).floor();
            let next_aim = mover.position.offset(speed, heading);

            let mut skip = vec![contact.obstacle];
            skip.extend(goal.obstacle());
            let next = self.airspace.closest_obstacle(&Scan {
                origin: mover.position,
                radius: mover.radius,
                velocity: velocity_from(speed, heading),
                fudge: options.fudge,
                members: mover.members,
                skip: &skip,
                avoid_hostiles: options.avoid_hostiles,
            });

            match next {
                None => return clear(speed, heading),
                Some(next) if depth == 0 => {
                    aim = next_aim;
                    contact = next;
                }
                Some(next) => return self.last_resort(mover, speed, heading, &next, options),
            }
        }
        Steering::Blocked
    }

    /// Heading and (unrounded) speed that steer around one contact.
    fn deflect(
        &self,
        mover: &Mover<'_>,
        goal: &Goal,
        aim: Position,
        contact: &Contact,
        options: &NavOptions,
    ) -> Option<(f64, f64)> {
        let origin = mover.position;
        let obstacle = &contact.geometry;
        let to_obstacle = origin.distance_to(&obstacle.position);
        if to_obstacle == 0.0 {
            return None;
        }
        let angle_to_obstacle = origin.angle_to(&obstacle.position);
        let to_aim = (origin.distance_to(&aim) - mover.radius).max(0.0);
        let angle_to_aim = origin.angle_to(&aim);

        let clearance = (obstacle.radius + mover.radius + options.fudge).min(to_obstacle);
        let tangent = 1.0 + (clearance / to_obstacle).asin().to_degrees();
        let clockwise = (angle_to_obstacle - tangent + 0.5).round().rem_euclid(360.0);
        let anticlockwise = (angle_to_obstacle + tangent - 0.5).round().rem_euclid(360.0);
        let nearer_side = if (angle_to_aim - angle_to_obstacle).rem_euclid(360.0) < 180.0 {
            anticlockwise
        } else {
            clockwise
        };

        let around = |heading: f64, reference: f64| {
            let diff = angular_difference(reference, heading).min(90.0);
            let speed = (to_aim / diff.to_radians().cos()).min(MAX_SPEED_F).max(1.0);
            (speed, heading)
        };

        match contact.obstacle {
            ObstacleRef::Node(_) => Some(around(nearer_side, angle_to_aim)),
            ObstacleRef::Unit(_) => {
                if let Some(node_id) = contact.docked_node.filter(|n| Some(*n) != goal.node()) {
                    // Go round the unit's tether to its node rather than the unit.
                    let node = self.airspace.snapshot().node(node_id)?;
                    let obstacle_to_node = obstacle.position.angle_to(&node.position);
                    let mover_to_node = origin.angle_to(&node.position);
                    let heading = if (mover_to_node - obstacle_to_node).rem_euclid(360.0) <= 180.0 {
                        anticlockwise
                    } else {
                        clockwise
                    };
                    Some(around(heading, mover_to_node))
                } else if contact.is_moving_friend() {
                    self.avoid_moving(mover, aim, contact, options)
                } else if contact.friendly || contact.docked_node.is_some() {
                    Some(around(nearer_side, angle_to_aim))
                } else {
                    log::debug!("nav: undocked hostile {:?} in the way, halting", contact.obstacle);
                    None
                }
            }
        }
    }

    /// Dodge a friend that has already committed to a move this cycle.
    fn avoid_moving(
        &self,
        mover: &Mover<'_>,
        aim: Position,
        contact: &Contact,
        options: &NavOptions,
    ) -> Option<(f64, f64)> {
        let origin = mover.position;
        let other = &contact.geometry;
        let end = other.end?;
        let collides = |speed: f64, heading: f64| {
            predict_with_velocity(&origin, mover.radius, velocity_from(speed, heading), other, options.fudge)
        };

        let to_aim = origin.distance_to(&aim);
        let angle_to_aim = origin.angle_to(&aim);
        let other_heading = other.position.angle_to(&end);
        let spread = angular_difference(angle_to_aim, other_heading);

        if spread <= PARALLEL_TOLERANCE_DEG {
            let speed = to_aim.min(MAX_SPEED_F).floor();
            if collides(speed, other_heading).is_none() {
                return Some((speed, other_heading));
            }
        }

        let crossing = crossing_point(&origin, &aim, &other.position, &end, CROSSING_OFFSET);
        let heading = origin.angle_to(&crossing).round();
        let speed = origin.distance_to(&crossing).min(MAX_SPEED_F).floor();
        if collides(speed, heading).is_none() {
            return Some((speed, heading));
        }

        let direct = to_aim.min(MAX_SPEED_F);
        match collides(direct, angle_to_aim) {
            None => return Some((direct, angle_to_aim)),
            Some(time) => {
                let slower = (time * direct).floor();
                if collides(slower, angle_to_aim).is_none() {
                    return Some((slower, angle_to_aim));
                }
            }
        }

        if 180.0 - spread <= PARALLEL_TOLERANCE_DEG {
            let angle_to_end = origin.angle_to(&end);
            if angular_difference(angle_to_aim, angle_to_end) < HEAD_ON_BEARING_DEG {
                let speed = (origin.distance_to(&end) - CROSSING_OFFSET).clamp(0.0, MAX_SPEED_F);
                return Some((speed, angle_to_end));
            }
        }
        None
    }

    /// A deflected path that still conflicts: slow down or stop.
    fn last_resort(
        &self,
        mover: &Mover<'_>,
        speed: f64,
        heading: f64,
        next: &Contact,
        options: &NavOptions,
    ) -> Steering {
        log::debug!("nav: second conflict with {:?}", next.obstacle);
        if mover.is_cluster {
            let time = predict_with_velocity(
                &mover.position,
                mover.radius,
                velocity_from(speed, heading),
                &next.geometry,
                options.fudge,
            );
            return match time {
                Some(t) => clear((t * speed).floor(), heading),
                None => clear(speed, heading),
            };
        }
        if next.is_moving_friend() {
            return Steering::Blocked;
        }
        let gap = mover.position.distance_to(&next.geometry.position) - mover.radius - next.geometry.radius;
        let diff = angular_difference(mover.position.angle_to(&next.geometry.position), heading);
        let cos = diff.to_radians().cos();
        let safe = if cos > 0.0 { gap / cos } else { speed };
        clear(safe.min(speed).max(0.0).floor(), heading)
    }

    /// Re-aim at the best in-bounds corner if the move would leave the arena.
    fn corner_correction(&self, mover: &Mover<'_>, goal: &Goal, speed: f64, heading: f64) -> f64 {
        let snapshot = self.airspace.snapshot();
        let end = mover.position.offset(speed, heading);
        let margin = if mover.is_cluster { 0.5 + mover.radius } else { 0.0 };
        let (w, h) = (snapshot.width, snapshot.height);
        let inside = end.x >= margin && end.x <= w - margin && end.y >= margin && end.y <= h - margin;
        if inside {
            return heading;
        }

        let corners = [
            Position::new(margin, margin),
            Position::new(w - margin, margin),
            Position::new(margin, h - margin),
            Position::new(w - margin, h - margin),
        ];
        let end_bearing = mover.position.angle_to(&end);
        let mut best: Option<(f64, f64)> = None;
        for corner in corners {
            if corner.is_within(&goal.position, CORNER_TARGET_EXCLUSION) {
                continue;
            }
            let bearing = mover.position.angle_to(&corner);
            let diff = angular_difference(end_bearing, bearing);
            if best.map_or(true, |(d, _)| diff < d) {
                best = Some((diff, bearing));
            }
        }
        best.map_or(heading, |(_, bearing)| bearing)
    }
}

fn clear(speed: f64, heading: f64) -> Steering {
    let course = Course::from_raw(speed, heading);
    Steering::Clear {
        speed: course.speed,
        heading: course.heading,
    }
}
