use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// World-space coordinate, also used for the pan offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point at `distance` along `angle` (radians) from `self`.
    #[inline]
    pub fn polar(self, angle: f64, distance: f64) -> Self {
        Self {
            x: self.x + angle.cos() * distance,
            y: self.y + angle.sin() * distance,
        }
    }

    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    #[inline]
    pub fn scaled(self, k: f64) -> Self {
        Self {
            x: self.x * k,
            y: self.y * k,
        }
    }
}

impl Add for Point {
    type Output = Point;

    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Visible window size in screen units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Viewport center expressed in world space for the given pan offset.
    #[inline]
    pub fn world_center(&self, offset: Point) -> Point {
        self.center() - offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_center_undoes_pan() {
        let vp = Viewport::new(1000.0, 800.0);
        assert_eq!(vp.world_center(Point::ZERO), Point::new(500.0, 400.0));
        assert_eq!(
            vp.world_center(Point::new(-300.0, 120.0)),
            Point::new(800.0, 280.0)
        );
    }

    #[test]
    fn polar_walks_along_angle() {
        let p = Point::ZERO.polar(std::f64::consts::FRAC_PI_2, 10.0);
        assert!(p.x.abs() < 1e-9);
        assert!((p.y - 10.0).abs() < 1e-9);
        assert!((p.distance(Point::ZERO) - 10.0).abs() < 1e-9);
    }
}
