//! Phase analysis of audio for phase-coding steganography
//!
//! Phase coding hides bits by overwriting the phase of frequency bins in a
//! segment (typically with ±π/2) while keeping the magnitude spectrum, which
//! the ear is far more sensitive to. The hidden structure shows up as
//! irregular jumps between the phases of neighbouring bins.
//!
//! # Algorithm
//!
//! 1. Take the first channel and cut it into fixed segments of
//!    [`PhaseConfig::segment_len`] samples. The length is a constant, never
//!    derived from the file, so statistics compare across files.
//! 2. FFT each segment and take the phase angle of every positive-frequency
//!    bin (DC excluded).
//! 3. Difference the phases of adjacent bins and take the standard deviation
//!    of those differences over all segments.
//!
//! The file is flagged when that standard deviation exceeds
//! [`PhaseConfig::std_threshold`]. A coherent signal such as an impulse has
//! identical phases in every bin and a deviation of zero.

use rustfft::{num_complex::Complex, FftPlanner};
use std::f64::consts::PI;

use crate::config::PhaseConfig;
use crate::error::DetectorError;
use crate::media::AudioBuffer;

use super::result::{DetectionResult, Details, Method};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseStatistics {
    pub segments: usize,
    pub samples_analyzed: usize,
    /// Standard deviation of adjacent-bin phase differences, radians
    pub phase_std: f64,
}

impl PhaseStatistics {
    pub fn compute(samples: &[f64], config: &PhaseConfig) -> Result<Self, DetectorError> {
        let seg = config.segment_len;
        if seg < 4 {
            return Err(DetectorError::Failure(format!(
                "segment length {} is too short for phase analysis",
                seg
            )));
        }
        if samples.len() < seg {
            return Err(DetectorError::InsufficientData {
                needed: seg,
                got: samples.len(),
            });
        }

        let segments = (samples.len() / seg).min(config.max_segments.max(1));

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(seg);

        let mut count = 0usize;
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        let mut phases = Vec::with_capacity(seg / 2);

        for i in 0..segments {
            let start = i * seg;
            let mut buffer: Vec<Complex<f64>> = samples[start..start + seg]
                .iter()
                .map(|&s| Complex::new(s, 0.0))
                .collect();

            fft.process(&mut buffer);

            phases.clear();
            phases.extend(buffer[1..=seg / 2].iter().map(|c| c.arg()));

            for pair in phases.windows(2) {
                let d = pair[1] - pair[0];
                if !d.is_finite() {
                    return Err(DetectorError::Failure(format!(
                        "non-finite phase in segment {}",
                        i
                    )));
                }
                sum += d;
                sum_sq += d * d;
                count += 1;
            }
        }

        let n = count as f64;
        let mean = sum / n;
        let phase_std = (sum_sq / n - mean * mean).max(0.0).sqrt();

        Ok(Self {
            segments,
            samples_analyzed: segments * seg,
            phase_std,
        })
    }
}

/// Confidence in `[0, 100]`, linear from the threshold up to π
fn confidence(phase_std: f64, threshold: f64) -> f64 {
    if phase_std <= threshold {
        return 0.0;
    }
    if threshold >= PI {
        return 100.0;
    }
    (((phase_std - threshold) / (PI - threshold)) * 100.0).clamp(0.0, 100.0)
}

/// Phase-coding detector over the first audio channel
pub fn detect(audio: &AudioBuffer, config: &PhaseConfig) -> Result<DetectionResult, DetectorError> {
    let samples: Vec<f64> = audio.channel(0).map(|s| s as f64).collect();

    let stats = match PhaseStatistics::compute(&samples, config) {
        Ok(stats) => stats,
        Err(DetectorError::InsufficientData { needed, got }) => {
            let mut result = DetectionResult::insufficient(Method::Phase, needed, got);
            result
                .details
                .insert("note", "audio shorter than one analysis segment");
            return Ok(result);
        }
        Err(e) => return Err(e),
    };

    let detected = stats.phase_std > config.std_threshold;
    log::debug!(
        "Phase: segments={} std={:.4} detected={}",
        stats.segments,
        stats.phase_std,
        detected
    );

    let details = Details::new()
        .with("phase_std", stats.phase_std)
        .with("threshold", config.std_threshold)
        .with("segments_analyzed", stats.segments)
        .with("samples_analyzed", stats.samples_analyzed)
        .with("segment_len", config.segment_len);

    Ok(DetectionResult::new(
        Method::Phase,
        detected,
        confidence(stats.phase_std, config.std_threshold),
        details,
    ))
}
