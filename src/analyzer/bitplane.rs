//! Bit-plane extraction and the LSB statistical test
//!
//! # How LSB Detection Works
//!
//! The least-significant bit of a pixel byte or audio sample is mostly sensor
//! or quantization noise, so in an untouched file it splits roughly 50/50
//! between zeros and ones. Writing a payload into that plane changes the
//! split: a message of ASCII text, a constant cover, or any structured data
//! pulls the ones ratio away from one half.
//!
//! Two statistics are computed over the bit sequence:
//!
//! ```text
//! ones_ratio  = count(bit == 1) / N
//! deviation   = |ones_ratio - 0.5|
//! chi_square  = sum over {0,1} of (observed - N/2)^2 / (N/2)
//! ```
//!
//! A sequence is flagged when `deviation > 0.1` or `chi_square > 100`.
//! Both thresholds are absolute, so chi-square grows with N for the same
//! deviation and large files flag on smaller biases than small ones.

use crate::config::LsbThresholds;
use crate::error::DetectorError;
use crate::media::{AudioBuffer, ImageBuffer};

use super::result::{DetectionResult, Details, Method};

/// Integer sample types whose lowest bit can be read
pub trait Sample: Copy {
    fn lsb(self) -> u8;
}

impl Sample for u8 {
    fn lsb(self) -> u8 {
        self & 1
    }
}

impl Sample for i16 {
    fn lsb(self) -> u8 {
        (self & 1) as u8
    }
}

// Two's complement: -1 has LSB 1, -2 has LSB 0
impl Sample for i32 {
    fn lsb(self) -> u8 {
        (self & 1) as u8
    }
}

/// LSB of every element, in input order
pub fn lsb_plane<S: Sample>(samples: &[S]) -> Vec<u8> {
    samples.iter().map(|s| s.lsb()).collect()
}

/// LSBs of one channel of an interleaved buffer
pub fn lsb_plane_channel<S: Sample>(samples: &[S], channels: usize, channel: usize) -> Vec<u8> {
    samples
        .iter()
        .skip(channel)
        .step_by(channels.max(1))
        .map(|s| s.lsb())
        .collect()
}

/// Bit-distribution statistics of an LSB plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BitStatistics {
    pub total: usize,
    pub ones: usize,
    pub ones_ratio: f64,
    pub deviation: f64,
    pub chi_square: f64,
}

impl BitStatistics {
    /// Compute the statistics, refusing sequences shorter than `min_samples`
    pub fn compute(bits: &[u8], min_samples: usize) -> Result<Self, DetectorError> {
        let total = bits.len();
        if total < min_samples.max(1) {
            return Err(DetectorError::InsufficientData {
                needed: min_samples.max(1),
                got: total,
            });
        }

        let ones = bits.iter().filter(|&&b| b == 1).count();
        let zeros = total - ones;
        let n = total as f64;
        let ones_ratio = ones as f64 / n;
        let deviation = (ones_ratio - 0.5).abs();

        let expected = n / 2.0;
        let chi_square = [zeros, ones]
            .iter()
            .map(|&observed| {
                let diff = observed as f64 - expected;
                diff * diff / expected
            })
            .sum();

        Ok(Self {
            total,
            ones,
            ones_ratio,
            deviation,
            chi_square,
        })
    }

    pub fn is_anomalous(&self, thresholds: &LsbThresholds) -> bool {
        self.deviation > thresholds.max_deviation || self.chi_square > thresholds.max_chi_square
    }

    /// Confidence in `[0, 100]`
    ///
    /// The larger of two saturating scores: deviation scaled so that 0.5
    /// (a constant plane) is 100%, and chi-square scaled linearly from the
    /// threshold up to `chi_square_saturation`.
    pub fn confidence(&self, thresholds: &LsbThresholds) -> f64 {
        if !self.is_anomalous(thresholds) {
            return 0.0;
        }

        let deviation_score = (self.deviation * 2.0).min(1.0);

        let span = thresholds.chi_square_saturation - thresholds.max_chi_square;
        let chi_score = if self.chi_square <= thresholds.max_chi_square {
            0.0
        } else if span <= 0.0 {
            1.0
        } else {
            ((self.chi_square - thresholds.max_chi_square) / span).clamp(0.0, 1.0)
        };

        (deviation_score.max(chi_score) * 100.0).clamp(0.0, 100.0)
    }
}

/// Run the statistical test over a bit sequence
///
/// Never fails: too few bits yields a negative result with the sample count
/// recorded in `details`.
pub fn test_bits(bits: &[u8], thresholds: &LsbThresholds, min_samples: usize) -> DetectionResult {
    let stats = match BitStatistics::compute(bits, min_samples) {
        Ok(stats) => stats,
        Err(e) => return DetectionResult::from_error(Method::Lsb, &e),
    };

    let detected = stats.is_anomalous(thresholds);
    let confidence = stats.confidence(thresholds);

    log::debug!(
        "LSB test: n={} ones_ratio={:.4} chi2={:.2} detected={}",
        stats.total,
        stats.ones_ratio,
        stats.chi_square,
        detected
    );

    let details = Details::new()
        .with("ones_ratio", stats.ones_ratio)
        .with("deviation_from_random", stats.deviation)
        .with("chi_square", stats.chi_square)
        .with("total_samples", stats.total);

    DetectionResult::new(Method::Lsb, detected, confidence, details)
}

/// LSB detector over every channel of every pixel
pub fn detect_image(
    img: &ImageBuffer,
    thresholds: &LsbThresholds,
    min_samples: usize,
) -> DetectionResult {
    let bits = lsb_plane(&img.data);
    let mut result = test_bits(&bits, thresholds, min_samples);
    result.details.insert("total_pixels", img.pixel_count());
    result
}

/// LSB detector over every interleaved audio sample
pub fn detect_audio(
    audio: &AudioBuffer,
    thresholds: &LsbThresholds,
    min_samples: usize,
) -> DetectionResult {
    let bits = lsb_plane(&audio.samples);
    let mut result = test_bits(&bits, thresholds, min_samples);
    result.details.insert("sample_rate", audio.sample_rate);
    result
}
