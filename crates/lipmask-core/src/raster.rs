//! Polygon rasterisation and stencil compositing on RGB images.
//!
//! Fills cover the polygon interior plus its outline, so a pixel a vertex
//! or edge passes through is always painted.

use crate::geometry::Point;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point as PixelPoint;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Vertices are clamped to this many pixels either side of the origin.
/// Edges stay well inside `i32` arithmetic and `f32` precision, and a
/// stray landmark far outside the frame costs at most a few million
/// line steps.
pub const COORD_LIMIT: i32 = 1 << 20;

/// A closed polygon in integer pixel coordinates. The last vertex
/// connects back to the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskPolygon {
    vertices: Vec<(i32, i32)>,
}

impl MaskPolygon {
    pub fn new(vertices: Vec<(i32, i32)>) -> Self {
        let clamp = |v: i32| v.clamp(-COORD_LIMIT, COORD_LIMIT);
        Self {
            vertices: vertices.into_iter().map(|(x, y)| (clamp(x), clamp(y))).collect(),
        }
    }

    /// Truncate each point to pixel coordinates.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Self {
        Self::new(points.into_iter().map(|p| p.to_pixel()).collect())
    }

    pub fn vertices(&self) -> &[(i32, i32)] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertices with repeats removed, including a last vertex that
    /// closes back onto the first.
    fn distinct_ring(&self) -> Vec<PixelPoint<i32>> {
        let mut ring: Vec<PixelPoint<i32>> = self
            .vertices
            .iter()
            .map(|&(x, y)| PixelPoint::new(x, y))
            .collect();
        ring.dedup();
        while ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        ring
    }

    /// Paint the polygon onto `image` in place.
    pub fn fill(&self, image: &mut RgbImage, color: Rgb<u8>) {
        let ring = self.distinct_ring();
        match ring.as_slice() {
            [] => {}
            [p] => draw_line(image, (p.x, p.y), (p.x, p.y), color),
            [a, b] => draw_line(image, (a.x, a.y), (b.x, b.y), color),
            _ => draw_polygon_mut(image, &ring, color),
        }
    }

    /// White-on-black stencil of the polygon at the given size.
    pub fn stencil(&self, width: u32, height: u32) -> RgbImage {
        let mut stencil = RgbImage::new(width, height);
        self.fill(&mut stencil, WHITE);
        stencil
    }

    /// Zero every pixel of `image` outside the polygon.
    pub fn keep_inside(&self, image: &mut RgbImage) {
        let stencil = self.stencil(image.width(), image.height());
        bitwise_and(image, &stencil);
    }
}

/// One-pixel line between two pixel positions; parts off the image are
/// dropped.
pub fn draw_line(image: &mut RgbImage, from: (i32, i32), to: (i32, i32), color: Rgb<u8>) {
    let pixel = |(x, y): (i32, i32)| {
        let (x, y) = (x.clamp(-COORD_LIMIT, COORD_LIMIT), y.clamp(-COORD_LIMIT, COORD_LIMIT));
        (x as f32, y as f32)
    };
    draw_line_segment_mut(image, pixel(from), pixel(to), color);
}

/// Per-channel AND of `image` with a same-size `stencil`, in place.
pub fn bitwise_and(image: &mut RgbImage, stencil: &RgbImage) {
    debug_assert_eq!(image.dimensions(), stencil.dimensions());
    for (px, mask) in image.pixels_mut().zip(stencil.pixels()) {
        for c in 0..3 {
            px.0[c] &= mask.0[c];
        }
    }
}
