//! File decoding for the CLI
//!
//! The engine only ever sees decoded buffers. This module turns paths into
//! [`MediaAsset`]s: images through the `image` crate, audio through
//! symphonia, and video as a directory of already-extracted frames.

pub mod audio;
pub mod frames;
pub mod image;

use std::path::Path;

use crate::error::AnalysisError;
use crate::media::{MediaAsset, MediaKind};

pub use frames::FrameDirectory;

/// Decode a media file into an asset, choosing the decoder by extension
pub fn load<P: AsRef<Path>>(path: P) -> Result<MediaAsset, AnalysisError> {
    let path = path.as_ref();
    match MediaKind::from_path(path)? {
        MediaKind::Image => Ok(MediaAsset::Image(image::load(path)?)),
        MediaKind::Audio => Ok(MediaAsset::Audio(audio::load(path)?)),
        MediaKind::Video => Err(AnalysisError::UnsupportedFormat(format!(
            "{}: video containers are not decoded directly, extract frames and pass the directory",
            path.display()
        ))),
    }
}

/// A directory of frame images as a video asset
pub fn load_frames<P: AsRef<Path>>(dir: P, fps: f64) -> Result<MediaAsset, AnalysisError> {
    Ok(MediaAsset::Video(FrameDirectory::open(dir, fps)?.into_video()))
}
