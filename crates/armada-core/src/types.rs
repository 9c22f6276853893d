//! Fundamental geometric types.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// 2D position in arena space (arena units).
/// x grows to the right, y grows downward; angles are degrees measured
/// from +x toward +y, normalised to [0, 360).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_vec(self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    pub fn from_vec(v: DVec2) -> Self {
        Self { x: v.x, y: v.y }
    }

    /// Euclidean distance to another position.
    pub fn distance_to(&self, other: &Position) -> f64 {
        self.distance_sq_to(other).sqrt()
    }

    /// Squared distance (no sqrt).
    pub fn distance_sq_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// Bearing to another position in degrees, [0, 360).
    pub fn angle_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dy.atan2(dx).to_degrees().rem_euclid(360.0)
    }

    /// The point reached by travelling `distance` along `angle` degrees.
    pub fn offset(&self, distance: f64, angle: f64) -> Position {
        let rad = angle.to_radians();
        Position::new(self.x + distance * rad.cos(), self.y + distance * rad.sin())
    }

    /// True when `other` lies within `distance` (inclusive).
    pub fn is_within(&self, other: &Position, distance: f64) -> bool {
        self.distance_sq_to(other) <= distance * distance
    }

    /// True when `a` is strictly nearer to self than `b`.
    pub fn is_nearer(&self, a: &Position, b: &Position) -> bool {
        self.distance_sq_to(a) < self.distance_sq_to(b)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Smallest absolute difference between two bearings, in [0, 180].
pub fn angular_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    diff.min(360.0 - diff)
}

/// Velocity vector for a speed along a bearing in degrees.
pub fn velocity_from(speed: f64, angle: f64) -> DVec2 {
    let rad = angle.to_radians();
    DVec2::new(speed * rad.cos(), speed * rad.sin())
}

/// Centroid of a set of positions. Empty input yields the origin.
pub fn centroid<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Position {
    let mut sum = DVec2::ZERO;
    let mut count = 0usize;
    for p in positions {
        sum += p.to_vec();
        count += 1;
    }
    if count == 0 {
        return Position::default();
    }
    Position::from_vec(sum / count as f64)
}

/// A movement committed for this cycle: integer speed and heading plus the
/// resulting end-of-cycle position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlannedMove {
    pub speed: u32,
    pub heading: u32,
    pub end: Position,
}

impl PlannedMove {
    pub fn from_origin(origin: Position, speed: u32, heading: u32) -> Self {
        Self {
            speed,
            heading,
            end: origin.offset(speed as f64, heading as f64),
        }
    }

    pub fn velocity(&self) -> DVec2 {
        velocity_from(self.speed as f64, self.heading as f64)
    }
}
