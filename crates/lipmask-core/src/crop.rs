//! Square crop bounds around the jaw contour.

use crate::geometry::GeometryError;
use crate::landmarks::LandmarkSet;
use serde::Serialize;

/// Axis-aligned crop in image coordinates. Square once built by [`crop_bounds`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CropRegion {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

/// Integer pixel rectangle clipped to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Truncate to pixels and clip to a `frame_width`×`frame_height` frame.
    ///
    /// Expansion can push the square past the frame edge; the part outside
    /// is dropped, so the returned rectangle may not be square.
    pub fn to_pixel_rect(&self, frame_width: u32, frame_height: u32) -> Result<PixelRect, GeometryError> {
        let clip = |v: f64, max: u32| (v as i64).clamp(0, max as i64) as u32;
        let x0 = clip(self.left, frame_width);
        let x1 = clip(self.right, frame_width);
        let y0 = clip(self.top, frame_height);
        let y1 = clip(self.bottom, frame_height);

        if x1 <= x0 || y1 <= y0 {
            return Err(GeometryError::EmptyCrop {
                left: self.left as i64,
                top: self.top as i64,
                width: self.width().max(0.0) as u32,
                height: self.height().max(0.0) as u32,
            });
        }
        Ok(PixelRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

/// Bounding box of landmarks 1..=17, grown along its short side into a square.
pub fn crop_bounds(landmarks: &LandmarkSet) -> CropRegion {
    let mut region = CropRegion {
        left: f64::INFINITY,
        right: f64::NEG_INFINITY,
        top: f64::INFINITY,
        bottom: f64::NEG_INFINITY,
    };
    for p in landmarks.crop_contour() {
        region.left = region.left.min(p.x);
        region.right = region.right.max(p.x);
        region.top = region.top.min(p.y);
        region.bottom = region.bottom.max(p.y);
    }

    let width = region.width();
    let height = region.height();
    if width < height {
        region.left -= (height - width) / 2.0;
        region.right = region.left + height;
    } else if width > height {
        region.top -= (width - height) / 2.0;
        region.bottom = region.top + width;
    }
    region
}
