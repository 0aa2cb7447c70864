//! JSON annotation manifest.
//!
//! ```json
//! {
//!   "frames": [
//!     { "image": "frames/000000.png", "faces": [[[x, y], ... 68 points]] },
//!     { "image": "frames/000001.png", "faces": [] }
//!   ]
//! }
//! ```
//!
//! Image paths are resolved relative to the manifest's directory.

use crate::frame::{principal_face, FeedError, SourceFrame};
use lipmask_core::LandmarkSet;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub frames: Vec<FrameEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrameEntry {
    pub image: PathBuf,
    /// Landmarks of every face found in the frame.
    #[serde(default)]
    pub faces: Vec<Vec<[f64; 2]>>,
}

impl Manifest {
    pub fn from_json_str(json: &str) -> Result<Self, FeedError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Frames listed in a manifest, decoded on demand.
pub struct ManifestSource {
    base_dir: PathBuf,
    manifest: Manifest,
}

impl ManifestSource {
    /// Read and parse the manifest at `path`.
    pub fn open(path: &Path) -> Result<Self, FeedError> {
        let json = std::fs::read_to_string(path).map_err(|source| FeedError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let manifest = Manifest::from_json_str(&json)?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        tracing::info!(
            path = %path.display(),
            frames = manifest.frames.len(),
            "loaded annotation manifest"
        );
        Ok(Self::new(base_dir, manifest))
    }

    pub fn new(base_dir: PathBuf, manifest: Manifest) -> Self {
        Self { base_dir, manifest }
    }

    pub fn len(&self) -> usize {
        self.manifest.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifest.frames.is_empty()
    }

    pub fn image_path(&self, index: usize) -> Option<PathBuf> {
        self.manifest
            .frames
            .get(index)
            .map(|entry| self.base_dir.join(&entry.image))
    }

    fn entry(&self, index: usize) -> Result<&FrameEntry, FeedError> {
        self.manifest
            .frames
            .get(index)
            .ok_or(FeedError::OutOfRange(index))
    }

    /// The single face of frame `index`, without decoding the image.
    pub fn landmarks(&self, index: usize) -> Result<LandmarkSet, FeedError> {
        principal_face(&self.entry(index)?.faces)
    }

    /// Validate the landmarks of frame `index`, then decode its image.
    ///
    /// Landmarks are checked first so a frame without a usable face is
    /// rejected without touching the image file.
    pub fn load(&self, index: usize) -> Result<SourceFrame, FeedError> {
        let entry = self.entry(index)?;
        let landmarks = principal_face(&entry.faces)?;

        let path = self.base_dir.join(&entry.image);
        let image = image::open(&path)
            .map_err(|source| FeedError::Decode {
                path: path.display().to_string(),
                source,
            })?
            .to_rgb8();

        tracing::trace!(frame = index, width = image.width(), height = image.height(), "decoded frame");
        Ok(SourceFrame {
            index,
            image,
            landmarks,
        })
    }
}
