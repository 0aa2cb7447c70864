//! Decoded frames and principal-face selection.

use image::RgbImage;
use lipmask_core::{LandmarkError, LandmarkSet, Point};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error("failed to decode frame image {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("frame {0} is not in the manifest")]
    OutOfRange(usize),
    #[error("no face detected")]
    NoFace,
    #[error("detected {0} faces, expected exactly one")]
    MultipleFaces(usize),
    #[error(transparent)]
    Landmarks(#[from] LandmarkError),
}

impl FeedError {
    /// Whether the frame should be skipped rather than the batch aborted.
    pub fn is_frame_local(&self) -> bool {
        !matches!(self, FeedError::Manifest(_))
    }
}

/// One frame ready for compositing.
pub struct SourceFrame {
    /// Position in the manifest.
    pub index: usize,
    pub image: RgbImage,
    pub landmarks: LandmarkSet,
}

/// Pick the only face in a frame.
///
/// Frames with no face or with several faces are rejected; the landmarks
/// of the chosen face must satisfy the 68-point contract.
pub fn principal_face(faces: &[Vec<[f64; 2]>]) -> Result<LandmarkSet, FeedError> {
    match faces {
        [] => Err(FeedError::NoFace),
        [face] => {
            let points: Vec<Point> = face.iter().map(|&[x, y]| Point::new(x, y)).collect();
            Ok(LandmarkSet::new(&points)?)
        }
        _ => Err(FeedError::MultipleFaces(faces.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(n: usize) -> Vec<[f64; 2]> {
        (0..n).map(|i| [i as f64, 2.0 * i as f64]).collect()
    }

    #[test]
    fn test_no_face() {
        assert!(matches!(principal_face(&[]), Err(FeedError::NoFace)));
    }

    #[test]
    fn test_multiple_faces() {
        let faces = vec![face(68), face(68)];
        assert!(matches!(principal_face(&faces), Err(FeedError::MultipleFaces(2))));
    }

    #[test]
    fn test_single_face() {
        let set = principal_face(&[face(68)]).unwrap();
        assert_eq!(set.points()[10], Point::new(10.0, 20.0));
    }

    #[test]
    fn test_short_face_is_contract_violation() {
        let err = principal_face(&[face(5)]).unwrap_err();
        assert!(matches!(err, FeedError::Landmarks(LandmarkError::WrongCount(5))));
        assert!(err.is_frame_local());
    }
}
