//! Jaw occlusion and background removal.
//!
//! The background mask keeps only the area enclosed by jaw points 2..=14.
//! The jaw mask covers the lower face: jaw points 4..=12 each pulled a
//! jittered distance toward the mouth, closed off by three points around
//! the base of the nose.

use crate::geometry::{GeometryError, Point};
use crate::landmarks::LandmarkSet;
use crate::raster::MaskPolygon;
use image::{Rgb, RgbImage};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::Deserialize;

/// Fill colour for the annotated (occluded) face.
pub const JAW_ANNOTATION_COLOR: Rgb<u8> = Rgb([255, 0, 255]);

/// How the jaw polygon is composited onto the face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JawMaskMode {
    /// Paint the polygon in [`JAW_ANNOTATION_COLOR`].
    #[default]
    Annotate,
    /// Keep only the pixels inside the polygon.
    Stencil,
}

/// Pushback applied to each jaw point, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JawJitter {
    /// Mean distance each jaw point moves toward the mouth.
    pub pushback: f64,
    /// Standard deviation added to `pushback`, drawn per point.
    pub sigma: f64,
    /// Distance the under-nose vertex moves toward the mouth.
    pub under_nose_offset: f64,
}

impl Default for JawJitter {
    fn default() -> Self {
        Self {
            pushback: 10.0,
            sigma: 5.0,
            under_nose_offset: 5.0,
        }
    }
}

/// The 13-point polygon through jaw points 2..=14.
pub fn background_polygon(landmarks: &LandmarkSet) -> MaskPolygon {
    MaskPolygon::from_points(landmarks.background_contour().iter().copied())
}

/// Black out everything outside the jaw contour, in place.
pub fn blackout_background(image: &mut RgbImage, landmarks: &LandmarkSet) {
    background_polygon(landmarks).keep_inside(image);
}

/// Build the 12-point jaw occlusion polygon.
///
/// Draws one normal sample per jaw point from `rng`. Fails if a jaw point
/// or the under-nose point sits exactly on the mouth centre.
pub fn jaw_polygon<R: Rng + ?Sized>(
    landmarks: &LandmarkSet,
    jitter: &JawJitter,
    rng: &mut R,
) -> Result<MaskPolygon, GeometryError> {
    let mouth = landmarks.mouth_center();
    let mut vertices: Vec<Point> = Vec::with_capacity(12);

    for &jaw in landmarks.occlusion_jaw() {
        let toward_mouth = (mouth - jaw).unit("jaw-to-mouth")?;
        let distance = jitter.pushback + rng.sample::<f64, _>(StandardNormal) * jitter.sigma;
        vertices.push(jaw + toward_mouth * distance);
    }

    let under_nose = landmarks.under_nose();
    let offset = (mouth - under_nose).unit("nose-to-mouth")? * jitter.under_nose_offset;
    let offset = Point::new(offset.x.trunc(), offset.y.trunc());

    vertices.push(under_nose.midpoint(landmarks.jaw_right_anchor()));
    vertices.push(under_nose + offset);
    vertices.push(under_nose.midpoint(landmarks.jaw_left_anchor()));

    Ok(MaskPolygon::from_points(vertices))
}

/// Composite a jaw polygon onto `image` in place.
pub fn apply_occlusion(image: &mut RgbImage, polygon: &MaskPolygon, mode: JawMaskMode) {
    match mode {
        JawMaskMode::Annotate => polygon.fill(image, JAW_ANNOTATION_COLOR),
        JawMaskMode::Stencil => polygon.keep_inside(image),
    }
}

/// Build a jittered jaw polygon and composite it onto `image`.
pub fn blackout_jaw<R: Rng + ?Sized>(
    image: &mut RgbImage,
    landmarks: &LandmarkSet,
    jitter: &JawJitter,
    mode: JawMaskMode,
    rng: &mut R,
) -> Result<(), GeometryError> {
    let polygon = jaw_polygon(landmarks, jitter, rng)?;
    apply_occlusion(image, &polygon, mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::synthetic_face;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const NO_JITTER: JawJitter = JawJitter {
        pushback: 10.0,
        sigma: 0.0,
        under_nose_offset: 5.0,
    };

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 250) as u8 + 1, (y % 250) as u8 + 1, 77])
        })
    }

    fn inside(poly: &[(i32, i32)], x: f64, y: f64) -> bool {
        let n = poly.len();
        let mut odd = false;
        for i in 0..n {
            let (x0, y0) = (poly[i].0 as f64, poly[i].1 as f64);
            let (x1, y1) = (poly[(i + 1) % n].0 as f64, poly[(i + 1) % n].1 as f64);
            if (y0 > y) != (y1 > y) && x < x0 + (y - y0) * (x1 - x0) / (y1 - y0) {
                odd = !odd;
            }
        }
        odd
    }

    fn distance_to_outline(poly: &[(i32, i32)], x: f64, y: f64) -> f64 {
        let p = Point::new(x, y);
        let n = poly.len();
        (0..n)
            .map(|i| {
                let a = Point::new(poly[i].0 as f64, poly[i].1 as f64);
                let b = Point::new(poly[(i + 1) % n].0 as f64, poly[(i + 1) % n].1 as f64);
                let ab = b - a;
                let len2 = ab.dot(ab);
                let t = if len2 == 0.0 { 0.0 } else { ((p - a).dot(ab) / len2).clamp(0.0, 1.0) };
                (p - (a + ab * t)).norm()
            })
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn test_background_polygon_is_jaw_2_to_14() {
        let face = synthetic_face();
        let poly = background_polygon(&face);
        assert_eq!(poly.len(), 13);
        assert_eq!(poly.vertices()[0], face.points()[2].to_pixel());
        assert_eq!(poly.vertices()[12], face.points()[14].to_pixel());
    }

    #[test]
    fn test_background_outside_zero_inside_unchanged() {
        let face = synthetic_face();
        let source = gradient(200, 200);
        let mut masked = source.clone();
        blackout_background(&mut masked, &face);

        let poly = background_polygon(&face);
        let verts = poly.vertices();
        for (x, y, px) in masked.enumerate_pixels() {
            let (fx, fy) = (x as f64, y as f64);
            if distance_to_outline(verts, fx, fy) <= 1.0 {
                continue;
            }
            if inside(verts, fx, fy) {
                assert_eq!(px, source.get_pixel(x, y), "inside pixel ({x}, {y}) changed");
            } else {
                assert_eq!(*px, Rgb([0, 0, 0]), "outside pixel ({x}, {y}) not black");
            }
        }
        assert_eq!(masked.get_pixel(100, 150), source.get_pixel(100, 150));
        assert_eq!(*masked.get_pixel(100, 100), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_background_mask_is_idempotent() {
        let face = synthetic_face();
        let mut once = gradient(200, 200);
        blackout_background(&mut once, &face);
        let mut twice = once.clone();
        blackout_background(&mut twice, &face);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_jaw_polygon_without_jitter() {
        let face = synthetic_face();
        let mut rng = StdRng::seed_from_u64(0);
        let poly = jaw_polygon(&face, &NO_JITTER, &mut rng).unwrap();
        assert_eq!(poly.len(), 12);

        let mouth = face.mouth_center();
        for (i, &jaw) in face.occlusion_jaw().iter().enumerate() {
            let expected = jaw + (mouth - jaw).unit("t").unwrap() * 10.0;
            assert_eq!(poly.vertices()[i], expected.to_pixel(), "vertex {i}");
        }
        // Chin (100, 170) pulled straight up toward (100, 125).
        assert_eq!(poly.vertices()[4], (100, 160));
        // Under-nose (100, 105) moved 5px toward the mouth.
        assert_eq!(poly.vertices()[10], (100, 110));
        assert_eq!(
            poly.vertices()[9],
            face.under_nose().midpoint(face.points()[13]).to_pixel()
        );
        assert_eq!(
            poly.vertices()[11],
            face.under_nose().midpoint(face.points()[3]).to_pixel()
        );
    }

    #[test]
    fn test_jaw_polygon_jitter_advances_rng() {
        let face = synthetic_face();
        let jitter = JawJitter::default();
        let mut rng = StdRng::seed_from_u64(3);
        let first = jaw_polygon(&face, &jitter, &mut rng).unwrap();
        let second = jaw_polygon(&face, &jitter, &mut rng).unwrap();
        assert_ne!(first, second);

        let replay = jaw_polygon(&face, &jitter, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(first, replay);
    }

    #[test]
    fn test_jaw_point_on_mouth_center_is_degenerate() {
        let face = synthetic_face();
        let mut pts = face.points().to_vec();
        pts[8] = pts[62];
        let face = LandmarkSet::new(&pts).unwrap();
        let err = jaw_polygon(&face, &NO_JITTER, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert_eq!(err, GeometryError::ZeroLengthVector("jaw-to-mouth"));
    }

    #[test]
    fn test_under_nose_on_mouth_center_is_degenerate() {
        let face = synthetic_face();
        let mut pts = face.points().to_vec();
        pts[33] = pts[62];
        let face = LandmarkSet::new(&pts).unwrap();
        let err = jaw_polygon(&face, &NO_JITTER, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert_eq!(err, GeometryError::ZeroLengthVector("nose-to-mouth"));
    }

    #[test]
    fn test_background_with_far_out_of_frame_landmark() {
        for far_x in [-3.0e9, -2.0e9, 3.0e9] {
            let mut pts = synthetic_face().points().to_vec();
            pts[2] = Point::new(far_x, 100.0);
            let face = LandmarkSet::new(&pts).unwrap();
            let source = gradient(200, 200);
            let mut masked = source.clone();
            blackout_background(&mut masked, &face);
            assert_eq!(masked.get_pixel(100, 150), source.get_pixel(100, 150));
            assert_eq!(*masked.get_pixel(100, 10), Rgb([0, 0, 0]));
        }
    }

    #[test]
    fn test_annotate_paints_magenta() {
        let face = synthetic_face();
        let mut img = RgbImage::from_pixel(200, 200, Rgb([10, 20, 30]));
        blackout_jaw(&mut img, &face, &NO_JITTER, JawMaskMode::Annotate, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(*img.get_pixel(100, 140), JAW_ANNOTATION_COLOR);
        assert_eq!(*img.get_pixel(100, 50), Rgb([10, 20, 30]));
    }

    #[test]
    fn test_stencil_keeps_only_jaw_region() {
        let face = synthetic_face();
        let mut img = RgbImage::from_pixel(200, 200, Rgb([10, 20, 30]));
        blackout_jaw(&mut img, &face, &NO_JITTER, JawMaskMode::Stencil, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(*img.get_pixel(100, 140), Rgb([10, 20, 30]));
        assert_eq!(*img.get_pixel(100, 50), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(100, 190), Rgb([0, 0, 0]));
    }
}
