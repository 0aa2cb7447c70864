//! 2D points, vector helpers and the angle computations shared by the
//! ellipse and lip modules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Vectors shorter than this are treated as zero-length.
const MIN_NORM: f64 = 1e-9;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("degenerate geometry: zero-length {0} vector")]
    ZeroLengthVector(&'static str),
    #[error("degenerate geometry: crop region {left},{top} {width}x{height} is empty inside the frame")]
    EmptyCrop {
        left: i64,
        top: i64,
        width: u32,
        height: u32,
    },
}

/// A point (or vector) in image space. `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dot(&self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn norm(&self) -> f64 {
        self.dot(*self).sqrt()
    }

    pub fn midpoint(&self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Unit vector in the same direction.
    ///
    /// `what` names the vector in the error so a skipped frame says which
    /// landmarks collapsed.
    pub fn unit(&self, what: &'static str) -> Result<Point, GeometryError> {
        let n = self.norm();
        if n < MIN_NORM || !n.is_finite() {
            return Err(GeometryError::ZeroLengthVector(what));
        }
        Ok(*self / n)
    }

    /// Rotate counter-clockwise (in x-right/y-up terms) by `angle` radians about `center`.
    pub fn rotate_about(&self, center: Point, angle: f64) -> Point {
        let (sin, cos) = angle.sin_cos();
        let d = *self - center;
        Point::new(cos * d.x - sin * d.y, sin * d.x + cos * d.y) + center
    }

    /// Truncate toward zero to integer pixel coordinates.
    pub fn to_pixel(&self) -> (i32, i32) {
        (self.x as i32, self.y as i32)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f64> for Point {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl std::ops::Div<f64> for Point {
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

/// Inverse cosine with the argument clamped to [-1, 1].
///
/// Normalised dot products can overshoot by an ulp or two; `acos` would
/// return NaN for those.
pub fn clamped_acos(cosine: f64) -> f64 {
    if !(-1.0..=1.0).contains(&cosine) {
        tracing::trace!(cosine, "clamping arccos argument");
    }
    cosine.clamp(-1.0, 1.0).acos()
}

/// Unsigned angle in radians between `v` and the +x axis, in [0, π].
pub fn angle_from_horizontal(v: Point, what: &'static str) -> Result<f64, GeometryError> {
    let unit = v.unit(what)?;
    Ok(clamped_acos(unit.dot(Point::new(1.0, 0.0))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    #[test]
    fn test_unit_rejects_zero_vector() {
        let err = Point::new(0.0, 0.0).unit("test").unwrap_err();
        assert_eq!(err, GeometryError::ZeroLengthVector("test"));
    }

    #[test]
    fn test_unit_length() {
        let u = Point::new(3.0, 4.0).unit("test").unwrap();
        assert!((u.norm() - 1.0).abs() < 1e-12);
        assert!((u.x - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_clamped_acos_overshoot() {
        assert_eq!(clamped_acos(1.0 + 1e-12), 0.0);
        assert!((clamped_acos(-1.0 - 1e-12) - PI).abs() < 1e-12);
        assert!(!clamped_acos(1.0000001).is_nan());
    }

    #[test]
    fn test_angle_from_horizontal() {
        let a = angle_from_horizontal(Point::new(1.0, 1.0), "v").unwrap();
        assert!((a - FRAC_PI_4).abs() < 1e-12);
        // Unsigned: pointing down and pointing up give the same angle.
        let up = angle_from_horizontal(Point::new(0.0, -5.0), "v").unwrap();
        let down = angle_from_horizontal(Point::new(0.0, 5.0), "v").unwrap();
        assert!((up - FRAC_PI_2).abs() < 1e-12);
        assert_eq!(up, down);
    }

    #[test]
    fn test_rotate_about_center() {
        let p = Point::new(2.0, 1.0).rotate_about(Point::new(1.0, 1.0), FRAC_PI_2);
        assert!((p.x - 1.0).abs() < 1e-12, "x = {}", p.x);
        assert!((p.y - 2.0).abs() < 1e-12, "y = {}", p.y);
    }

    #[test]
    fn test_to_pixel_truncates() {
        assert_eq!(Point::new(3.9, -2.7).to_pixel(), (3, -2));
    }
}
