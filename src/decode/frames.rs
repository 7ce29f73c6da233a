//! A directory of extracted frame images treated as a video
//!
//! Frames are ordered by file name, so zero-padded names such as those
//! written by `ffmpeg -i clip.mp4 frames/%05d.png` play back in order.
//! Each frame is decoded only when the sampler asks for it.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::AnalysisError;
use crate::media::{FrameSource, ImageBuffer, MediaKind, VideoSource};

#[derive(Debug, Clone)]
pub struct FrameDirectory {
    paths: Vec<PathBuf>,
    fps: f64,
    dimensions: Option<(usize, usize)>,
}

impl FrameDirectory {
    pub fn open<P: AsRef<Path>>(dir: P, fps: f64) -> Result<Self, AnalysisError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(AnalysisError::Decode(format!(
                "{} is not a frame directory",
                dir.display()
            )));
        }

        let paths: Vec<PathBuf> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| matches!(MediaKind::from_path(p), Ok(MediaKind::Image)))
            .collect();

        let dimensions = paths
            .first()
            .and_then(|p| image::image_dimensions(p).ok())
            .map(|(w, h)| (w as usize, h as usize));

        log::debug!("Frame directory {}: {} frames", dir.display(), paths.len());

        Ok(Self {
            paths,
            fps,
            dimensions,
        })
    }

    pub fn into_video(self) -> VideoSource {
        VideoSource::new(self).with_format("frames")
    }
}

impl FrameSource for FrameDirectory {
    fn frame_count(&self) -> usize {
        self.paths.len()
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn frame(&self, index: usize) -> Result<ImageBuffer, AnalysisError> {
        let path = self.paths.get(index).ok_or_else(|| {
            AnalysisError::Decode(format!(
                "frame {} out of range ({} frames)",
                index,
                self.paths.len()
            ))
        })?;
        super::image::load(path)
    }

    fn dimensions(&self) -> Option<(usize, usize)> {
        self.dimensions
    }
}
