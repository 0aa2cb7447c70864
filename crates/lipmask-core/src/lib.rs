//! lipmask-core: landmark geometry and compositing for lip-sync training data.
//!
//! Turns one frame plus its 68 facial landmarks into a three-panel image:
//! masked face, face with the lower face occluded, and a pose-normalised
//! lip outline.

pub mod compositor;
pub mod config;
pub mod crop;
pub mod ellipse;
pub mod geometry;
pub mod landmarks;
pub mod lips;
pub mod mask;
pub mod raster;

pub use compositor::{frame_rng, CompositeError, CompositeFrame, Compositor, Panel};
pub use config::{ConfigError, Occlusion, PipelineConfig};
pub use crop::{crop_bounds, CropRegion};
pub use ellipse::{ellipse_parameters, EllipseParams, FeatureBounds};
pub use geometry::{GeometryError, Point};
pub use landmarks::{LandmarkError, LandmarkSet, LipSubmesh};
pub use lips::{canonicalize, lip_outline, CanonicalLips};
pub use mask::{JawJitter, JawMaskMode};
