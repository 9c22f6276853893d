//! Continuous-time collision prediction for circular bodies.
//!
//! A mover travels in a straight line for one cycle (t in [0, 1]). An
//! obstacle is either stationary or moves linearly towards its committed
//! end-of-cycle position. The separation is a quadratic in t; we find the
//! time of closest approach and compare the separation there with the
//! combined radius. A hit reports when the edges first touch, not the
//! closest approach.

use armada_core::constants::MAX_SPEED_F;
use armada_core::types::Position;
use glam::DVec2;

/// Read-only circular geometry used for prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub position: Position,
    pub radius: f64,
    /// Predicted end-of-cycle position, for bodies already committed to a move.
    pub end: Option<Position>,
}

impl Obstacle {
    pub fn stationary(position: Position, radius: f64) -> Self {
        Self {
            position,
            radius,
            end: None,
        }
    }

    pub fn moving(position: Position, radius: f64, end: Position) -> Self {
        Self {
            position,
            radius,
            end: Some(end),
        }
    }

    pub fn velocity(&self) -> DVec2 {
        match self.end {
            Some(end) => end.to_vec() - self.position.to_vec(),
            None => DVec2::ZERO,
        }
    }
}

/// Velocity of a mover heading straight for `target`, capped at max speed.
pub fn velocity_toward(origin: &Position, target: &Position) -> DVec2 {
    let delta = target.to_vec() - origin.to_vec();
    let distance = delta.length();
    if distance == 0.0 {
        return DVec2::ZERO;
    }
    delta * (distance.min(MAX_SPEED_F) / distance)
}

/// Predict whether a mover heading for `target` hits `obstacle` this cycle.
///
/// Returns the earliest contact time in [0, 1]: the smaller root of the
/// separation reaching the combined radius, or 0 if already overlapping.
/// `None` if the bodies stay clear.
pub fn predict(
    origin: &Position,
    radius: f64,
    target: &Position,
    obstacle: &Obstacle,
    fudge: f64,
) -> Option<f64> {
    predict_with_velocity(origin, radius, velocity_toward(origin, target), obstacle, fudge)
}

/// As [`predict`], with the mover's velocity given directly.
pub fn predict_with_velocity(
    origin: &Position,
    radius: f64,
    velocity: DVec2,
    obstacle: &Obstacle,
    fudge: f64,
) -> Option<f64> {
    let mut combined = radius + obstacle.radius + fudge;
    if obstacle.end.is_some() {
        combined += fudge / 2.0;
    }
    let combined_sq = combined * combined;

    let rel_pos = origin.to_vec() - obstacle.position.to_vec();
    let rel_vel = velocity - obstacle.velocity();

    let a = rel_vel.length_squared();
    let b = 2.0 * rel_vel.dot(rel_pos);
    let c = rel_pos.length_squared() - combined_sq;

    // Equal motion: the separation never changes.
    if a == 0.0 {
        return (c <= 0.0).then_some(0.0);
    }

    let closest = (-b / (2.0 * a)).min(1.0);
    if closest < 0.0 {
        return None;
    }

    let separation = rel_pos + rel_vel * closest;
    if separation.length_squared() > combined_sq {
        return None;
    }

    if c <= 0.0 {
        return Some(0.0);
    }
    let disc = (b * b - 4.0 * a * c).max(0.0);
    let entry = (-b - disc.sqrt()) / (2.0 * a);
    Some(entry.clamp(0.0, closest))
}

/// Where a mover's path crosses a moving body's path, nudged sideways so
/// the mover passes just beside the crossing.
///
/// The crossing is clamped to the other body's segment. Parallel paths
/// yield the mover's own position.
pub fn crossing_point(
    origin: &Position,
    target: &Position,
    other_start: &Position,
    other_end: &Position,
    offset: f64,
) -> Position {
    let a0 = origin.to_vec();
    let da = target.to_vec() - a0;
    let b0 = other_start.to_vec();
    let db = other_end.to_vec() - b0;

    let denom = da.perp_dot(db);
    if denom.abs() < 1e-9 {
        return *origin;
    }
    let w = b0 - a0;
    let u = w.perp_dot(da) / denom;

    let (point, angle) = if u <= 0.0 {
        (*other_start, other_start.angle_to(other_end))
    } else if u >= 1.0 {
        (*other_end, other_end.angle_to(other_start))
    } else {
        let p = Position::from_vec(b0 + db * u);
        (p, p.angle_to(other_start))
    };

    let left = point.offset(offset, (angle + 90.0).rem_euclid(360.0));
    let right = point.offset(offset, (angle - 90.0).rem_euclid(360.0));
    if origin.is_nearer(&left, &right) {
        left
    } else {
        right
    }
}
