//! 68-point facial landmark sets and the named sub-views the masking and
//! lip code read from them.
//!
//! Index convention (iBUG 68-point markup):
//! ```text
//!  0..=16  jaw line, subject's right ear to left ear
//! 17..=26  eyebrows
//! 27..=35  nose (33 = point under the nose)
//! 36..=47  eyes
//! 48..=59  outer lip contour (48 and 54 are the corners)
//! 60..=67  inner lip contour
//! ```

use crate::geometry::Point;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;

pub const LANDMARK_COUNT: usize = 68;
pub const LIP_POINT_COUNT: usize = 20;

const CROP_CONTOUR: RangeInclusive<usize> = 1..=17;
const BACKGROUND_CONTOUR: RangeInclusive<usize> = 2..=14;
const OCCLUSION_JAW: RangeInclusive<usize> = 4..=12;
const LIPS: RangeInclusive<usize> = 48..=67;

const JAW_LEFT_ANCHOR: usize = 3;
const CHIN: usize = 8;
const JAW_RIGHT_ANCHOR: usize = 13;
const UNDER_NOSE: usize = 33;
const INNER_LIP_CENTER: usize = 62;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LandmarkError {
    #[error("input contract violation: expected 68 landmarks, got {0}")]
    WrongCount(usize),
    #[error("input contract violation: landmark {index} is not finite")]
    NonFinite { index: usize },
}

/// The full per-frame annotation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct LandmarkSet {
    points: [Point; LANDMARK_COUNT],
}

impl LandmarkSet {
    /// Validate and wrap exactly 68 finite points.
    pub fn new(points: &[Point]) -> Result<Self, LandmarkError> {
        let points: [Point; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| LandmarkError::WrongCount(points.len()))?;
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(LandmarkError::NonFinite { index });
        }
        Ok(Self { points })
    }

    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self, LandmarkError> {
        let points: Vec<Point> = pairs.iter().copied().map(Point::from).collect();
        Self::new(&points)
    }

    pub fn points(&self) -> &[Point; LANDMARK_COUNT] {
        &self.points
    }

    /// Jaw points plus the first eyebrow point, used to size the crop.
    pub fn crop_contour(&self) -> &[Point] {
        &self.points[CROP_CONTOUR]
    }

    /// The 13 jaw points outlining the kept face area.
    pub fn background_contour(&self) -> &[Point] {
        &self.points[BACKGROUND_CONTOUR]
    }

    /// The 9 lower-jaw points pulled inward to form the occluded region.
    pub fn occlusion_jaw(&self) -> &[Point] {
        &self.points[OCCLUSION_JAW]
    }

    pub fn jaw_left_anchor(&self) -> Point {
        self.points[JAW_LEFT_ANCHOR]
    }

    pub fn jaw_right_anchor(&self) -> Point {
        self.points[JAW_RIGHT_ANCHOR]
    }

    pub fn chin(&self) -> Point {
        self.points[CHIN]
    }

    pub fn under_nose(&self) -> Point {
        self.points[UNDER_NOSE]
    }

    /// Reference point the jaw occlusion polygon is pulled toward.
    pub fn mouth_center(&self) -> Point {
        self.points[INNER_LIP_CENTER]
    }

    pub fn lips(&self) -> LipSubmesh {
        let mut points = [Point::default(); LIP_POINT_COUNT];
        points.copy_from_slice(&self.points[LIPS]);
        LipSubmesh { points }
    }
}

impl TryFrom<Vec<Point>> for LandmarkSet {
    type Error = LandmarkError;

    fn try_from(points: Vec<Point>) -> Result<Self, Self::Error> {
        Self::new(&points)
    }
}

impl From<LandmarkSet> for Vec<Point> {
    fn from(set: LandmarkSet) -> Self {
        set.points.to_vec()
    }
}

/// Landmarks 48..=67, re-indexed from 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LipSubmesh {
    points: [Point; LIP_POINT_COUNT],
}

impl LipSubmesh {
    /// Submesh index ranges for the three painted regions, in paint order.
    pub const UPPER_LIP: [usize; 12] = [0, 1, 2, 3, 4, 5, 6, 16, 15, 14, 13, 12];
    pub const INNER_MOUTH: [usize; 8] = [12, 13, 14, 15, 16, 17, 18, 19];
    pub const LOWER_LIP: [usize; 12] = [6, 7, 8, 9, 10, 11, 0, 12, 19, 18, 17, 16];

    pub fn new(points: [Point; LIP_POINT_COUNT]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point; LIP_POINT_COUNT] {
        &self.points
    }

    pub fn left_corner(&self) -> Point {
        self.points[0]
    }

    pub fn right_corner(&self) -> Point {
        self.points[6]
    }

    /// Midpoint of the upper and lower inner-lip centres.
    pub fn mouth_center(&self) -> Point {
        self.points[14].midpoint(self.points[18])
    }

    pub fn map(&self, f: impl Fn(Point) -> Point) -> LipSubmesh {
        LipSubmesh {
            points: self.points.map(f),
        }
    }
}

/// A synthetic frontal face inside a 200×200 frame.
#[cfg(test)]
pub(crate) fn synthetic_face() -> LandmarkSet {
    use std::f64::consts::PI;

    let mut pts = Vec::with_capacity(LANDMARK_COUNT);
    // Jaw: lower half of an ellipse from (30, 90) through the chin (100, 170) to (170, 90).
    for i in 0..17 {
        let t = PI - i as f64 * PI / 16.0;
        pts.push(Point::new(100.0 + 70.0 * t.cos(), 90.0 + 80.0 * t.sin()));
    }
    for i in 0..10 {
        pts.push(Point::new(45.0 + 12.0 * i as f64, 60.0));
    }
    for i in 0..4 {
        pts.push(Point::new(100.0, 70.0 + 8.0 * i as f64));
    }
    for i in 0..5 {
        pts.push(Point::new(88.0 + 6.0 * i as f64, 105.0));
    }
    for eye_x in [70.0, 130.0] {
        for i in 0..6 {
            let t = i as f64 * PI / 3.0;
            pts.push(Point::new(eye_x + 10.0 * t.cos(), 75.0 + 4.0 * t.sin()));
        }
    }
    for i in 0..12 {
        let t = PI + i as f64 * PI / 6.0;
        pts.push(Point::new(100.0 + 25.0 * t.cos(), 130.0 + 12.0 * t.sin()));
    }
    for i in 0..8 {
        let t = PI + i as f64 * PI / 4.0;
        pts.push(Point::new(100.0 + 15.0 * t.cos(), 130.0 + 5.0 * t.sin()));
    }
    let pts: Vec<Point> = pts
        .into_iter()
        .map(|p| Point::new(p.x.round(), p.y.round()))
        .collect();
    LandmarkSet::new(&pts).unwrap()
}
