//! Decoded media buffers handed to the engine
//!
//! The engine never decodes files itself. A codec collaborator (see
//! [`crate::decode`] for the one the CLI uses) turns a file into a
//! [`MediaAsset`], and the engine treats that asset as read-only for the whole
//! analysis call.
//!
//! Media kind is a closed set: [`MediaAsset::Image`], [`MediaAsset::Audio`]
//! and [`MediaAsset::Video`]. Each maps to a fixed detector set in
//! [`crate::analyzer::detectors_for`].

use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::error::AnalysisError;

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "tif", "gif"];
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "ogg", "m4a"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "flv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
    Video,
}

impl MediaKind {
    pub fn from_extension(ext: &str) -> Option<MediaKind> {
        let ext = ext.to_ascii_lowercase();
        let ext = ext.as_str();
        if IMAGE_EXTENSIONS.contains(&ext) {
            Some(MediaKind::Image)
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            Some(MediaKind::Audio)
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    /// Determine the media kind from a file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<MediaKind, AnalysisError> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext).ok_or_else(|| {
            AnalysisError::UnsupportedFormat(format!(
                "unrecognized extension '{}' ({})",
                ext,
                path.display()
            ))
        })
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Decoded image: 8-bit samples, row-major, channel-minor
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: usize,
    pub height: usize,
    /// 1 = gray, 2 = gray+alpha, 3 = RGB, 4 = RGBA. 0 means the decoder lost it.
    pub channels: usize,
    pub data: Vec<u8>,
    /// Source container name (e.g. "png", "jpeg"), informational only
    pub format: Option<String>,
}

impl ImageBuffer {
    pub fn new(width: usize, height: usize, channels: usize, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels,
            data,
            format: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Check that the metadata is present and agrees with the sample count
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.channels == 0 {
            return Err(AnalysisError::Decode(
                "image channel count is missing".to_string(),
            ));
        }
        if self.channels > 4 {
            return Err(AnalysisError::Decode(format!(
                "unsupported image channel count {}",
                self.channels
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(AnalysisError::Decode(format!(
                "image dimensions are missing ({}x{})",
                self.width, self.height
            )));
        }
        let expected = self
            .width
            .checked_mul(self.height)
            .and_then(|n| n.checked_mul(self.channels))
            .ok_or_else(|| AnalysisError::Decode("image dimensions overflow".to_string()))?;
        if self.data.len() != expected {
            return Err(AnalysisError::Decode(format!(
                "image buffer holds {} samples, {}x{}x{} needs {}",
                self.data.len(),
                self.width,
                self.height,
                self.channels,
                expected
            )));
        }
        Ok(())
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Luma plane in row-major order
    ///
    /// Gray and gray+alpha images use the gray sample directly. Color images
    /// use the ITU-R BT.601 weights; alpha is ignored.
    pub fn luma_plane(&self) -> Vec<f64> {
        let c = self.channels.max(1);
        self.data
            .chunks_exact(c)
            .map(|px| match c {
                1 | 2 => px[0] as f64,
                _ => 0.299 * px[0] as f64 + 0.587 * px[1] as f64 + 0.114 * px[2] as f64,
            })
            .collect()
    }

    pub fn info(&self) -> MediaInfo {
        MediaInfo::Image {
            width: self.width,
            height: self.height,
            channels: self.channels,
            format: self.format.clone(),
        }
    }
}

/// Decoded audio: interleaved integer PCM at the source bit depth
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub channels: usize,
    pub samples: Vec<i32>,
    pub format: Option<String>,
}

impl AudioBuffer {
    pub fn new(sample_rate: u32, channels: usize, samples: Vec<i32>) -> Self {
        Self {
            sample_rate,
            channels,
            samples,
            format: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.channels == 0 {
            return Err(AnalysisError::Decode(
                "audio channel count is missing".to_string(),
            ));
        }
        if self.sample_rate == 0 {
            return Err(AnalysisError::Decode("audio sample rate is missing".to_string()));
        }
        if self.samples.len() % self.channels != 0 {
            return Err(AnalysisError::Decode(format!(
                "audio buffer holds {} samples, not a multiple of {} channels",
                self.samples.len(),
                self.channels
            )));
        }
        Ok(())
    }

    /// Samples per channel
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f64 / self.sample_rate as f64
        }
    }

    /// One channel, de-interleaved
    pub fn channel(&self, index: usize) -> impl Iterator<Item = i32> + '_ {
        let step = self.channels.max(1);
        self.samples.iter().skip(index).step_by(step).copied()
    }

    pub fn info(&self) -> MediaInfo {
        MediaInfo::Audio {
            sample_rate: self.sample_rate,
            channels: self.channels,
            duration_secs: self.duration_secs(),
            format: self.format.clone(),
        }
    }
}

/// Frame-indexable video supplied by an external decoder
///
/// Frames are fetched one at a time, so an analysis never holds more than
/// one decoded frame.
pub trait FrameSource {
    fn frame_count(&self) -> usize;

    fn fps(&self) -> f64;

    /// Decode one frame into the same shape a standalone image would have
    fn frame(&self, index: usize) -> Result<ImageBuffer, AnalysisError>;

    /// Frame size, if the container reports it without decoding
    fn dimensions(&self) -> Option<(usize, usize)> {
        None
    }
}

/// In-memory frames, mostly for callers that already decoded a clip
#[derive(Debug, Clone)]
pub struct FrameList {
    pub frames: Vec<ImageBuffer>,
    pub fps: f64,
}

impl FrameSource for FrameList {
    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn frame(&self, index: usize) -> Result<ImageBuffer, AnalysisError> {
        self.frames.get(index).cloned().ok_or_else(|| {
            AnalysisError::Decode(format!(
                "frame {} out of range ({} frames)",
                index,
                self.frames.len()
            ))
        })
    }

    fn dimensions(&self) -> Option<(usize, usize)> {
        self.frames.first().map(|f| (f.width, f.height))
    }
}

pub struct VideoSource {
    source: Box<dyn FrameSource + Send + Sync>,
    pub format: Option<String>,
}

impl VideoSource {
    pub fn new<S: FrameSource + Send + Sync + 'static>(source: S) -> Self {
        Self {
            source: Box::new(source),
            format: None,
        }
    }

    pub fn from_frames(frames: Vec<ImageBuffer>, fps: f64) -> Self {
        Self::new(FrameList { frames, fps })
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn frames(&self) -> &dyn FrameSource {
        self.source.as_ref()
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        let fps = self.source.fps();
        if !fps.is_finite() || fps < 0.0 {
            return Err(AnalysisError::Decode(format!("invalid frame rate {}", fps)));
        }
        Ok(())
    }

    pub fn info(&self) -> MediaInfo {
        let fps = self.source.fps();
        let frame_count = self.source.frame_count();
        let (width, height) = self.source.dimensions().unwrap_or((0, 0));
        MediaInfo::Video {
            width,
            height,
            fps,
            frame_count,
            duration_secs: if fps > 0.0 { frame_count as f64 / fps } else { 0.0 },
            format: self.format.clone(),
        }
    }
}

impl fmt::Debug for VideoSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("VideoSource")
            .field("frame_count", &self.source.frame_count())
            .field("fps", &self.source.fps())
            .field("format", &self.format)
            .finish()
    }
}

/// One decoded media file
#[derive(Debug)]
pub enum MediaAsset {
    Image(ImageBuffer),
    Audio(AudioBuffer),
    Video(VideoSource),
}

impl MediaAsset {
    pub fn kind(&self) -> MediaKind {
        match self {
            MediaAsset::Image(_) => MediaKind::Image,
            MediaAsset::Audio(_) => MediaKind::Audio,
            MediaAsset::Video(_) => MediaKind::Video,
        }
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        match self {
            MediaAsset::Image(img) => img.validate(),
            MediaAsset::Audio(audio) => audio.validate(),
            MediaAsset::Video(video) => video.validate(),
        }
    }

    pub fn info(&self) -> MediaInfo {
        match self {
            MediaAsset::Image(img) => img.info(),
            MediaAsset::Audio(audio) => audio.info(),
            MediaAsset::Video(video) => video.info(),
        }
    }
}

/// Shape/format metadata carried into the report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MediaInfo {
    Image {
        width: usize,
        height: usize,
        channels: usize,
        format: Option<String>,
    },
    Audio {
        sample_rate: u32,
        channels: usize,
        duration_secs: f64,
        format: Option<String>,
    },
    Video {
        width: usize,
        height: usize,
        fps: f64,
        frame_count: usize,
        duration_secs: f64,
        format: Option<String>,
    },
}

impl MediaInfo {
    pub fn kind(&self) -> MediaKind {
        match self {
            MediaInfo::Image { .. } => MediaKind::Image,
            MediaInfo::Audio { .. } => MediaKind::Audio,
            MediaInfo::Video { .. } => MediaKind::Video,
        }
    }
}
