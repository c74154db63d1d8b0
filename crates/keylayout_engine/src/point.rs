use std::{
    collections::BTreeMap,
    ops::{Add, Sub},
};

use serde::{Deserialize, Serialize};

/// Free-form metadata attached to points and keys.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A plain 2D vector in millimeters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    /// Rotates the vector counter-clockwise by `angle` degrees.
    pub fn rotated(self, angle: f64) -> Vec2 {
        if angle == 0.0 {
            return self;
        }
        let (sin, cos) = angle.to_radians().sin_cos();
        Vec2 {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    /// Rotates the vector around `origin` by `angle` degrees.
    pub fn rotated_around(self, angle: f64, origin: Vec2) -> Vec2 {
        (self - origin).rotated(angle) + origin
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl std::fmt::Display for Vec2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<[f64; 2]> for Vec2 {
    fn from(value: [f64; 2]) -> Self {
        Vec2::new(value[0], value[1])
    }
}

impl From<(f64, f64)> for Vec2 {
    fn from(value: (f64, f64)) -> Self {
        Vec2::new(value.0, value.1)
    }
}

impl Add<Vec2> for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub<Vec2> for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A placed point: position, rotation and attached metadata.
///
/// Rotations are in degrees, counter-clockwise positive. All operations mutate
/// in place and return `&mut Self` so they can be chained in the order the
/// placement algorithm requires.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub meta: Metadata,
}

impl Point {
    pub fn new(x: f64, y: f64, r: f64) -> Self {
        Point { x, y, r, meta: Metadata::new() }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Translates the point. With `relative` set the offset is interpreted in
    /// the point's own rotated frame.
    pub fn shift(&mut self, offset: Vec2, relative: bool) -> &mut Self {
        let offset = if relative { offset.rotated(self.r) } else { offset };
        self.x += offset.x;
        self.y += offset.y;
        self
    }

    /// Rotates the point around `origin` and adds `angle` to its rotation.
    pub fn rotate(&mut self, angle: f64, origin: Vec2) -> &mut Self {
        let p = self.position().rotated_around(angle, origin);
        self.x = p.x;
        self.y = p.y;
        self.r += angle;
        self
    }

    /// Reflects the point across the vertical line `x = axis`.
    pub fn mirror(&mut self, axis: f64) -> &mut Self {
        self.x = 2.0 * axis - self.x;
        self.r = -self.r;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn relative_shift_follows_rotation() {
        let mut p = Point::new(0.0, 0.0, 90.0);
        p.shift(Vec2::new(1.0, 0.0), true);
        assert!(approx(p.x, 0.0));
        assert!(approx(p.y, 1.0));
    }

    #[test]
    fn absolute_shift_ignores_rotation() {
        let mut p = Point::new(0.0, 0.0, 90.0);
        p.shift(Vec2::new(1.0, 0.0), false);
        assert_eq!(p.position(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn rotate_around_origin_accumulates_angle() {
        let mut p = Point::new(2.0, 1.0, 10.0);
        p.rotate(180.0, Vec2::new(1.0, 1.0));
        assert!(approx(p.x, 0.0));
        assert!(approx(p.y, 1.0));
        assert!(approx(p.r, 190.0));
    }

    #[test]
    fn mirror_negates_rotation() {
        let mut p = Point::new(5.0, 3.0, 15.0);
        p.mirror(5.5);
        assert!(approx(p.x, 6.0));
        assert_eq!(p.y, 3.0);
        assert_eq!(p.r, -15.0);
    }
}
