//! Pipeline parameters.

use crate::mask::{JawJitter, JawMaskMode};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("resolution must be at least 1 pixel")]
    ZeroResolution,
    #[error("{name} must be a finite, non-negative number, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

/// Which shape occludes the lower face in the annotated image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Occlusion {
    #[default]
    Jaw,
    Ellipse,
}

/// Parameters for building composite training frames.
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Side length of each of the three output panels.
    pub resolution: u32,
    /// Standard deviation of the ellipse axis-length jitter.
    pub axis_jitter_sigma: f64,
    /// Mean pixel distance jaw points move toward the mouth.
    pub jaw_pushback: f64,
    /// Standard deviation added to `jaw_pushback`.
    pub jaw_jitter_sigma: f64,
    /// Pixel distance the under-nose vertex moves toward the mouth.
    pub under_nose_offset: f64,
    pub jaw_mask_mode: JawMaskMode,
    pub occlusion: Occlusion,
    /// Batch seed. `None` draws one at startup.
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let jaw = JawJitter::default();
        Self {
            resolution: 256,
            axis_jitter_sigma: 0.13,
            jaw_pushback: jaw.pushback,
            jaw_jitter_sigma: jaw.sigma,
            under_nose_offset: jaw.under_nose_offset,
            jaw_mask_mode: JawMaskMode::default(),
            occlusion: Occlusion::default(),
            seed: None,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolution == 0 {
            return Err(ConfigError::ZeroResolution);
        }
        for (name, value) in [
            ("axis_jitter_sigma", self.axis_jitter_sigma),
            ("jaw_pushback", self.jaw_pushback),
            ("jaw_jitter_sigma", self.jaw_jitter_sigma),
            ("under_nose_offset", self.under_nose_offset),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }

    pub fn jaw_jitter(&self) -> JawJitter {
        JawJitter {
            pushback: self.jaw_pushback,
            sigma: self.jaw_jitter_sigma,
            under_nose_offset: self.under_nose_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let cfg: PipelineConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, PipelineConfig::default());
        assert_eq!(cfg.resolution, 256);
        assert_eq!(cfg.axis_jitter_sigma, 0.13);
        assert_eq!(cfg.jaw_jitter().pushback, 10.0);
        assert_eq!(cfg.jaw_jitter().sigma, 5.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let cfg: PipelineConfig = toml::from_str(
            r#"
            resolution = 128
            jaw_mask_mode = "stencil"
            occlusion = "ellipse"
            seed = 42
            "#,
        )
        .unwrap();
        assert_eq!(cfg.resolution, 128);
        assert_eq!(cfg.jaw_mask_mode, JawMaskMode::Stencil);
        assert_eq!(cfg.occlusion, Occlusion::Ellipse);
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.jaw_pushback, 10.0);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(toml::from_str::<PipelineConfig>(r#"jaw_mask_mode = "blur""#).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cfg = PipelineConfig { resolution: 0, ..Default::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroResolution));

        let cfg = PipelineConfig { jaw_jitter_sigma: -1.0, ..Default::default() };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidParameter { name: "jaw_jitter_sigma", .. })
        ));

        let cfg = PipelineConfig { axis_jitter_sigma: f64::NAN, ..Default::default() };
        assert!(cfg.validate().is_err());
    }
}
