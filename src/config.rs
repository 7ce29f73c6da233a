//! Detector thresholds and tunables
//!
//! Every threshold here is an empirical constant, not something derived from a
//! model of the embedding process. They are kept as named, overridable values
//! so a caller can recalibrate without touching the detectors. The engine only
//! ever reads a [`DetectorConfig`]; it never mutates one.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::AnalysisError;

/// Thresholds for the LSB statistical test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LsbThresholds {
    /// Flag when `|ones_ratio - 0.5|` exceeds this (default: 0.1)
    pub max_deviation: f64,
    /// Flag when the chi-square statistic exceeds this (default: 100.0)
    pub max_chi_square: f64,
    /// Chi-square value at which chi-square-driven confidence reaches 100%
    pub chi_square_saturation: f64,
}

impl Default for LsbThresholds {
    fn default() -> Self {
        Self {
            max_deviation: 0.1,
            max_chi_square: 100.0,
            chi_square_saturation: 1000.0,
        }
    }
}

/// Natural-image band for the AC coefficient dispersion
///
/// The statistic is `std(|AC|) / mean(|AC|)` over every full 8×8 block.
/// Values inside `[ratio_low, ratio_high]` are considered natural. Pixel
/// noise lands near `sqrt(pi/2 - 1) ~ 0.76` (half-normal `|AC|`), so the low
/// end sits below it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DctBand {
    pub ratio_low: f64,
    pub ratio_high: f64,
}

impl Default for DctBand {
    fn default() -> Self {
        Self {
            ratio_low: 0.6,
            ratio_high: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    /// DFT segment length in samples. Fixed so results compare across files.
    pub segment_len: usize,
    /// Flag when the phase standard deviation (radians) exceeds this
    pub std_threshold: f64,
    /// Upper bound on analyzed segments
    pub max_segments: usize,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            segment_len: 8192,
            std_threshold: 0.5,
            max_segments: 32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Number of frames sampled per video (`k`)
    pub sample_frames: usize,
    /// Video is flagged when the detection rate is strictly above this
    pub majority: f64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            sample_frames: 10,
            majority: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Maximum number of bytes decoded from the bit plane
    pub max_bytes: usize,
    /// Minimum printable run for the result to count as a message
    pub min_printable: usize,
    /// Expose the raw bytes when text decoding fails
    pub binary_preview: bool,
    /// Restrict extraction to one interleaved channel (None = all channels)
    pub channel: Option<usize>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_bytes: 125,
            min_printable: 4,
            binary_preview: false,
            channel: None,
        }
    }
}

/// Full analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub image_lsb: LsbThresholds,
    pub audio_lsb: LsbThresholds,
    /// Fewer LSB samples than this and the statistical test is skipped
    pub min_lsb_samples: usize,
    pub dct: DctBand,
    pub phase: PhaseConfig,
    pub video: VideoConfig,
    pub extraction: ExtractionConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            image_lsb: LsbThresholds::default(),
            audio_lsb: LsbThresholds::default(),
            min_lsb_samples: 8,
            dct: DctBand::default(),
            phase: PhaseConfig::default(),
            video: VideoConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

impl DetectorConfig {
    /// Load a JSON config file. Keys that are absent keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, AnalysisError> {
        serde_json::from_str(text)
            .map_err(|e| AnalysisError::Decode(format!("invalid config: {}", e)))
    }
}
