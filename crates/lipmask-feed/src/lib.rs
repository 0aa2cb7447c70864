//! lipmask-feed: frame and landmark input for the compositing pipeline.
//!
//! Reads a JSON manifest listing frame images and the faces found in each,
//! and hands out decoded frames with a single validated landmark set.

pub mod frame;
pub mod manifest;

pub use frame::{FeedError, SourceFrame};
pub use manifest::{FrameEntry, Manifest, ManifestSource};
