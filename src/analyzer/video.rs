//! Frame sampling and aggregation for video
//!
//! Video steganography rarely touches every frame the same way, and decoding
//! a whole long video is too expensive, so only `k` frames are analyzed:
//! evenly spaced across the clip, first and last included. Each sampled frame
//! goes through the image detectors as a standalone image, and the video is
//! flagged when a strict majority of the sampled frames were.
//!
//! Frames are fetched one at a time, so memory is bounded by a single frame
//! regardless of the clip length.

use crate::config::DetectorConfig;
use crate::media::{ImageBuffer, VideoSource};

use super::bitplane;
use super::dct;
use super::result::{DetectionResult, Details, FrameFinding, Method};

/// `k` frame indices evenly spaced over `0..frame_count`
///
/// With `k > 1` the first and last frame are always included. `k` is capped
/// at `frame_count`, and indices are strictly increasing.
pub fn sample_indices(frame_count: usize, k: usize) -> Vec<usize> {
    if frame_count == 0 || k == 0 {
        return Vec::new();
    }
    let k = k.min(frame_count);
    if k == 1 {
        return vec![0];
    }
    let last = frame_count - 1;
    let steps = k - 1;
    (0..k).map(|i| (i * last + steps / 2) / steps).collect()
}

/// Run the image detectors on one frame
pub fn analyze_frame(index: usize, frame: &ImageBuffer, config: &DetectorConfig) -> FrameFinding {
    if let Err(e) = frame.validate() {
        return FrameFinding::failed(index, e.to_string());
    }

    let lsb = bitplane::detect_image(frame, &config.image_lsb, config.min_lsb_samples);
    let (dct_detected, dct_error) = match dct::detect(frame, &config.dct) {
        Ok(r) => (r.detected, None),
        Err(e) => {
            log::warn!("frame {}: DCT detector failed: {}", index, e);
            (false, Some(e.to_string()))
        }
    };

    FrameFinding {
        frame_index: index,
        lsb_detected: lsb.detected,
        lsb_confidence: lsb.confidence,
        dct_detected,
        dct_error,
        error: None,
    }
}

/// Video-level result from per-frame findings
///
/// `detection_rate = flagged / sampled`. Frames that failed to decode count
/// as sampled but not flagged.
pub fn aggregate(findings: &[FrameFinding], total_frames: usize, majority: f64) -> DetectionResult {
    let sampled = findings.len();
    if sampled == 0 {
        return DetectionResult::insufficient(Method::Frames, 1, 0);
    }

    let flagged = findings.iter().filter(|f| f.flagged()).count();
    let failed = findings.iter().filter(|f| f.error.is_some()).count();
    let detection_rate = flagged as f64 / sampled as f64;
    let detected = detection_rate > majority;

    let mut details = Details::new()
        .with("frames_with_steganography", flagged)
        .with("total_frames_analyzed", sampled)
        .with("total_frames", total_frames)
        .with("detection_rate", detection_rate)
        .with("majority_threshold", majority);
    if failed > 0 {
        details.insert("frames_failed", failed);
    }

    DetectionResult::new(Method::Frames, detected, detection_rate * 100.0, details)
}

/// Outcome of a sampled video analysis
#[derive(Debug, Clone)]
pub struct VideoAnalysis {
    pub result: DetectionResult,
    pub findings: Vec<FrameFinding>,
    /// First sampled frame whose LSB detector fired, for extraction
    pub first_lsb_frame: Option<usize>,
}

pub fn analyze(video: &VideoSource, config: &DetectorConfig) -> VideoAnalysis {
    let source = video.frames();
    let total = source.frame_count();
    let indices = sample_indices(total, config.video.sample_frames);

    log::debug!("Video: sampling {} of {} frames", indices.len(), total);

    let findings: Vec<FrameFinding> = indices
        .iter()
        .map(|&index| match source.frame(index) {
            Ok(frame) => analyze_frame(index, &frame, config),
            Err(e) => {
                log::warn!("frame {}: {}", index, e);
                FrameFinding::failed(index, e.to_string())
            }
        })
        .collect();

    let result = aggregate(&findings, total, config.video.majority);
    let first_lsb_frame = findings
        .iter()
        .find(|f| f.lsb_detected)
        .map(|f| f.frame_index);

    VideoAnalysis {
        result,
        findings,
        first_lsb_frame,
    }
}
