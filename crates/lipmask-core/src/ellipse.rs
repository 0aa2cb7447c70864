//! Ellipse fitted to four boundary points of a facial feature.
//!
//! An alternative to the jaw polygon for occluding the lower face. Axis
//! lengths carry a small Gaussian jitter for augmentation.

use crate::geometry::{angle_from_horizontal, GeometryError, Point};
use crate::landmarks::LandmarkSet;
use crate::raster::MaskPolygon;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::Serialize;

const MAJOR_AXIS_DIVISOR: f64 = 1.4;
const MINOR_AXIS_DIVISOR: f64 = 1.1;
/// Angular step between outline vertices, in degrees.
const OUTLINE_STEP_DEG: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EllipseParams {
    pub center: (i32, i32),
    /// (major, minor) semi-axis lengths in pixels.
    pub axes: (u32, u32),
    /// Rotation in degrees.
    pub angle: f64,
}

/// The four extreme points of a feature, in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureBounds {
    pub left: Point,
    pub top: Point,
    pub right: Point,
    pub bottom: Point,
}

impl FeatureBounds {
    /// Lower-face bounds from the jaw polygon's anchors: jaw points 3 and 13,
    /// the point under the nose and the chin.
    pub fn lower_face(landmarks: &LandmarkSet) -> Self {
        Self {
            left: landmarks.jaw_left_anchor(),
            top: landmarks.under_nose(),
            right: landmarks.jaw_right_anchor(),
            bottom: landmarks.chin(),
        }
    }
}

/// Fit ellipse parameters to `bounds`, jittering both axis lengths by
/// `N(0, sigma)` before truncating to whole pixels.
///
/// Fails if the left/right or top/bottom points coincide.
pub fn ellipse_parameters<R: Rng + ?Sized>(
    bounds: &FeatureBounds,
    sigma: f64,
    rng: &mut R,
) -> Result<EllipseParams, GeometryError> {
    let FeatureBounds { left, top, right, bottom } = *bounds;
    let major = right - left;
    let minor = top - bottom;

    minor.unit("ellipse minor axis")?;
    let mut angle = -angle_from_horizontal(major, "ellipse major axis")?.to_degrees();
    if left.y < right.y {
        angle = -angle;
    }

    let major_len = jittered_length(major.norm() / MAJOR_AXIS_DIVISOR, sigma, rng);
    let minor_len = jittered_length(minor.norm() / MINOR_AXIS_DIVISOR, sigma, rng);
    let center = left.midpoint(right) - minor / 4.0;

    Ok(EllipseParams {
        center: center.to_pixel(),
        axes: (major_len, minor_len),
        angle,
    })
}

fn jittered_length<R: Rng + ?Sized>(base: f64, sigma: f64, rng: &mut R) -> u32 {
    let noise: f64 = rng.sample::<f64, _>(StandardNormal) * sigma;
    // Truncate toward zero, then floor at zero.
    ((base + noise) as i64).max(0) as u32
}

impl EllipseParams {
    /// Closed outline of the ellipse, one vertex every few degrees.
    pub fn to_polygon(&self) -> MaskPolygon {
        let (sin_a, cos_a) = self.angle.to_radians().sin_cos();
        let (cx, cy) = (self.center.0 as f64, self.center.1 as f64);
        let (a, b) = (self.axes.0 as f64, self.axes.1 as f64);

        MaskPolygon::from_points((0..360).step_by(OUTLINE_STEP_DEG).map(|deg| {
            let (sin_t, cos_t) = (deg as f64).to_radians().sin_cos();
            let x = a * cos_t;
            let y = b * sin_t;
            Point::new(
                (cx + x * cos_a - y * sin_a).round(),
                (cy + x * sin_a + y * cos_a).round(),
            )
        }))
    }
}
