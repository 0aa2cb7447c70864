//! Per-frame assembly of the three-panel training image.
//!
//! Panels, left to right: the background-masked face, the same face with
//! the lower face occluded, and the canonical lip outline. Each panel is
//! resized to `resolution`×`resolution`.

use crate::config::{ConfigError, Occlusion, PipelineConfig};
use crate::crop::{crop_bounds, PixelRect};
use crate::ellipse::{ellipse_parameters, FeatureBounds};
use crate::geometry::GeometryError;
use crate::landmarks::LandmarkSet;
use crate::lips::lip_outline;
use crate::mask::{apply_occlusion, blackout_background, jaw_polygon};
use crate::raster::MaskPolygon;
use image::imageops::{self, FilterType};
use image::RgbImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// Spreads consecutive frame indices across the seed space.
const FRAME_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompositeError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("input contract violation: empty pixel buffer")]
    EmptyImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Face = 0,
    Occluded = 1,
    Lips = 2,
}

/// Three equal square panels side by side.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeFrame {
    image: RgbImage,
}

impl CompositeFrame {
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Side length of one panel.
    pub fn resolution(&self) -> u32 {
        self.image.height()
    }

    /// Copy one panel out of the strip.
    pub fn panel(&self, panel: Panel) -> RgbImage {
        let side = self.resolution();
        imageops::crop_imm(&self.image, panel as u32 * side, 0, side, side).to_image()
    }
}

/// Independent generator for one frame of a batch.
///
/// The same `(batch_seed, frame_index)` always yields the same stream, so
/// frames can be processed on any worker in any order.
pub fn frame_rng(batch_seed: u64, frame_index: u64) -> StdRng {
    StdRng::seed_from_u64(batch_seed ^ frame_index.wrapping_mul(FRAME_SEED_MIX))
}

pub struct Compositor {
    config: PipelineConfig,
}

impl Compositor {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Build the composite for one frame.
    ///
    /// Jitter is drawn from `rng`; the image and landmarks are not modified.
    pub fn compose<R: Rng + ?Sized>(
        &self,
        image: &RgbImage,
        landmarks: &LandmarkSet,
        rng: &mut R,
    ) -> Result<CompositeFrame, CompositeError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(CompositeError::EmptyImage);
        }

        let region = crop_bounds(landmarks);
        let rect = region.to_pixel_rect(width, height)?;
        let occluder = self.occlusion_polygon(landmarks, rng)?;
        let lips = lip_outline(&landmarks.lips())?;

        let mut occluded = image.clone();
        apply_occlusion(&mut occluded, &occluder, self.config.jaw_mask_mode);
        blackout_background(&mut occluded, landmarks);

        let mut face = image.clone();
        blackout_background(&mut face, landmarks);

        tracing::debug!(
            crop = ?rect,
            lip_canvas = lips.width(),
            occluder_vertices = occluder.len(),
            "composing frame"
        );

        let res = self.config.resolution;
        let panels = [
            self.fit(&crop(&face, rect)),
            self.fit(&crop(&occluded, rect)),
            self.fit(&lips),
        ];

        let mut strip = RgbImage::new(res * 3, res);
        for (i, panel) in panels.iter().enumerate() {
            imageops::replace(&mut strip, panel, i as i64 * res as i64, 0);
        }
        Ok(CompositeFrame { image: strip })
    }

    fn occlusion_polygon<R: Rng + ?Sized>(
        &self,
        landmarks: &LandmarkSet,
        rng: &mut R,
    ) -> Result<MaskPolygon, GeometryError> {
        match self.config.occlusion {
            Occlusion::Jaw => jaw_polygon(landmarks, &self.config.jaw_jitter(), rng),
            Occlusion::Ellipse => {
                let bounds = FeatureBounds::lower_face(landmarks);
                Ok(ellipse_parameters(&bounds, self.config.axis_jitter_sigma, rng)?.to_polygon())
            }
        }
    }

    fn fit(&self, image: &RgbImage) -> RgbImage {
        let res = self.config.resolution;
        imageops::resize(image, res, res, FilterType::Triangle)
    }
}

fn crop(image: &RgbImage, rect: PixelRect) -> RgbImage {
    imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image()
}
