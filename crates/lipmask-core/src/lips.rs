//! Lip outline rendering in a pose-independent frame.
//!
//! The 20-point lip submesh is rotated about the mouth centre until the
//! corner-to-corner axis is horizontal, moved to the origin of its own
//! bounding box, centred on a square canvas and painted as three regions:
//! upper lip, inner mouth, lower lip, in that order. Where regions share
//! a boundary pixel the later fill wins.

use crate::geometry::{angle_from_horizontal, GeometryError, Point};
use crate::landmarks::{LipSubmesh, LIP_POINT_COUNT};
use crate::raster::MaskPolygon;
use image::{Rgb, RgbImage};

pub const UPPER_LIP_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const INNER_MOUTH_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const LOWER_LIP_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// A lip submesh placed on its square canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalLips {
    /// Canvas coordinates before truncation to pixels.
    pub points: [Point; LIP_POINT_COUNT],
    /// Rotation applied, in radians.
    pub angle: f64,
    /// Canvas side length in pixels.
    pub side: u32,
}

/// Signed rotation (radians) that brings the corner axis level.
///
/// Positive when the right corner sits above the left one in the image.
pub fn lip_rotation_angle(lips: &LipSubmesh) -> Result<f64, GeometryError> {
    let axis = lips.right_corner() - lips.left_corner();
    let angle = angle_from_horizontal(axis, "lip corner axis")?;
    Ok(if axis.y > 0.0 { -angle } else { angle })
}

pub fn canonicalize(lips: &LipSubmesh) -> Result<CanonicalLips, GeometryError> {
    let angle = lip_rotation_angle(lips)?;
    let center = lips.mouth_center();

    // The bounding box comes from the unrotated mesh.
    let (mut left, mut top) = (f64::INFINITY, f64::INFINITY);
    let (mut right, mut bottom) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in lips.points() {
        left = left.min(p.x);
        top = top.min(p.y);
        right = right.max(p.x);
        bottom = bottom.max(p.y);
    }
    let width = right - left;
    let height = bottom - top;

    let pad = if width > height {
        Point::new(0.0, (width - height) / 2.0)
    } else {
        Point::new((height - width) / 2.0, 0.0)
    };
    let origin = Point::new(left, top);

    let placed = lips.map(|p| p.rotate_about(center, angle) - origin + pad);
    Ok(CanonicalLips {
        points: *placed.points(),
        angle,
        side: width.max(height).ceil() as u32,
    })
}

impl CanonicalLips {
    fn region(&self, indices: &[usize]) -> MaskPolygon {
        MaskPolygon::from_points(indices.iter().map(|&i| self.points[i]))
    }

    /// Paint the three lip regions on a black `side`×`side` canvas.
    pub fn render(&self) -> RgbImage {
        let mut canvas = RgbImage::new(self.side, self.side);
        self.region(&LipSubmesh::UPPER_LIP).fill(&mut canvas, UPPER_LIP_COLOR);
        self.region(&LipSubmesh::INNER_MOUTH).fill(&mut canvas, INNER_MOUTH_COLOR);
        self.region(&LipSubmesh::LOWER_LIP).fill(&mut canvas, LOWER_LIP_COLOR);
        canvas
    }
}

/// Canonicalize and render in one step.
pub fn lip_outline(lips: &LipSubmesh) -> Result<RgbImage, GeometryError> {
    Ok(canonicalize(lips)?.render())
}
