//! Frequency-domain analysis of the luma plane
//!
//! JPEG-family steganography hides data in quantized DCT coefficients, so the
//! place to look for it is the same 8×8 block transform the codec uses. The
//! detector accepts any decoded luma plane, not only JPEG sources.
//!
//! # Algorithm
//!
//! 1. Split the luma plane into non-overlapping 8×8 blocks. Partial blocks on
//!    the right and bottom edge are dropped, so images whose sides are not a
//!    multiple of 8 lose up to 7 columns and 7 rows of information.
//! 2. Apply an orthonormal 2-D DCT-II to each block (no level shift).
//! 3. Drop the DC coefficient `[0,0]`, keep the 63 AC coefficients.
//! 4. Aggregate mean and standard deviation of `|AC|` across all blocks.
//!
//! The anomaly statistic is the dispersion `std(|AC|) / mean(|AC|)`. Natural
//! photographs have heavy-tailed AC distributions and land inside
//! [`DctBand`], and so does plain pixel noise (about 0.76). A spectrum more
//! uniform than noise falls below the band; an abnormally sparse one, such as
//! a few touched blocks on a flat cover, rises above it. A flat image has no
//! AC energy at all and is reported with a note.

use std::sync::OnceLock;

use crate::config::DctBand;
use crate::error::DetectorError;
use crate::media::ImageBuffer;

use super::result::{DetectionResult, Details, Method};

pub const BLOCK_SIZE: usize = 8;
const BLOCK_AREA: usize = BLOCK_SIZE * BLOCK_SIZE;

/// `COSINE[u][x] = cos((2x + 1) * u * PI / 16)`
static COSINE: OnceLock<[[f64; BLOCK_SIZE]; BLOCK_SIZE]> = OnceLock::new();

fn cosine_table() -> &'static [[f64; BLOCK_SIZE]; BLOCK_SIZE] {
    COSINE.get_or_init(|| {
        let mut table = [[0.0f64; BLOCK_SIZE]; BLOCK_SIZE];
        for (u, row) in table.iter_mut().enumerate() {
            for (x, v) in row.iter_mut().enumerate() {
                *v = ((2 * x + 1) as f64 * u as f64 * std::f64::consts::PI / 16.0).cos();
            }
        }
        table
    })
}

/// Orthonormal scale: C(0) = 1/sqrt(8), C(u>0) = 1/2
fn norm(u: usize) -> f64 {
    if u == 0 {
        1.0 / (BLOCK_SIZE as f64).sqrt()
    } else {
        0.5
    }
}

/// 8×8 forward DCT-II, row-major in and out
///
/// Output index is `v * 8 + u` where `v` is the vertical frequency.
pub fn dct_block(pixels: &[f64; BLOCK_AREA]) -> [f64; BLOCK_AREA] {
    let cos = cosine_table();

    // Rows first
    let mut temp = [0.0f64; BLOCK_AREA];
    for row in 0..BLOCK_SIZE {
        for u in 0..BLOCK_SIZE {
            let mut sum = 0.0;
            for x in 0..BLOCK_SIZE {
                sum += pixels[row * BLOCK_SIZE + x] * cos[u][x];
            }
            temp[row * BLOCK_SIZE + u] = norm(u) * sum;
        }
    }

    // Then columns
    let mut coeffs = [0.0f64; BLOCK_AREA];
    for col in 0..BLOCK_SIZE {
        for v in 0..BLOCK_SIZE {
            let mut sum = 0.0;
            for y in 0..BLOCK_SIZE {
                sum += temp[y * BLOCK_SIZE + col] * cos[v][y];
            }
            coeffs[v * BLOCK_SIZE + col] = norm(v) * sum;
        }
    }

    coeffs
}

/// Aggregate `|AC|` statistics over all full blocks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcStatistics {
    pub blocks: usize,
    pub coefficients: usize,
    pub mean_abs: f64,
    pub std_abs: f64,
    /// Pixels lost to the right edge
    pub dropped_columns: usize,
    /// Pixels lost to the bottom edge
    pub dropped_rows: usize,
}

impl AcStatistics {
    pub fn compute(luma: &[f64], width: usize, height: usize) -> Result<Self, DetectorError> {
        if luma.len() != width * height {
            return Err(DetectorError::Failure(format!(
                "malformed luma plane: {} samples for {}x{}",
                luma.len(),
                width,
                height
            )));
        }

        let blocks_wide = width / BLOCK_SIZE;
        let blocks_tall = height / BLOCK_SIZE;
        if blocks_wide == 0 || blocks_tall == 0 {
            return Err(DetectorError::InsufficientData {
                needed: BLOCK_AREA,
                got: luma.len(),
            });
        }

        let mut count = 0usize;
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        let mut block = [0.0f64; BLOCK_AREA];

        for br in 0..blocks_tall {
            for bc in 0..blocks_wide {
                for y in 0..BLOCK_SIZE {
                    let start = (br * BLOCK_SIZE + y) * width + bc * BLOCK_SIZE;
                    block[y * BLOCK_SIZE..(y + 1) * BLOCK_SIZE]
                        .copy_from_slice(&luma[start..start + BLOCK_SIZE]);
                }

                let coeffs = dct_block(&block);
                for &c in coeffs.iter().skip(1) {
                    if !c.is_finite() {
                        return Err(DetectorError::Failure(format!(
                            "non-finite DCT coefficient in block ({}, {})",
                            br, bc
                        )));
                    }
                    let a = c.abs();
                    sum += a;
                    sum_sq += a * a;
                    count += 1;
                }
            }
        }

        let n = count as f64;
        let mean_abs = sum / n;
        let std_abs = (sum_sq / n - mean_abs * mean_abs).max(0.0).sqrt();

        Ok(Self {
            blocks: blocks_wide * blocks_tall,
            coefficients: count,
            mean_abs,
            std_abs,
            dropped_columns: width % BLOCK_SIZE,
            dropped_rows: height % BLOCK_SIZE,
        })
    }

    /// `std / mean` of `|AC|`, `None` when the spectrum carries no AC energy
    pub fn dispersion(&self) -> Option<f64> {
        // Rounding noise on a flat block is ~1e-14; anything this small is zero.
        if self.mean_abs < 1e-9 {
            return None;
        }
        Some(self.std_abs / self.mean_abs)
    }
}

/// Place a dispersion value against the natural band
///
/// Returns `(detected, confidence)`. Confidence is the relative distance
/// outside the band, as a percentage.
pub fn classify(ratio: f64, band: &DctBand) -> (bool, f64) {
    let distance = if ratio < band.ratio_low {
        (band.ratio_low - ratio) / band.ratio_low
    } else if ratio > band.ratio_high {
        (ratio - band.ratio_high) / band.ratio_high
    } else {
        return (false, 0.0);
    };
    (true, (distance * 100.0).clamp(0.0, 100.0))
}

fn check_band(band: &DctBand) -> Result<(), DetectorError> {
    let valid = band.ratio_low.is_finite()
        && band.ratio_high.is_finite()
        && band.ratio_low >= 0.0
        && band.ratio_low <= band.ratio_high;
    if valid {
        Ok(())
    } else {
        Err(DetectorError::Failure(format!(
            "invalid DCT band [{}, {}]",
            band.ratio_low, band.ratio_high
        )))
    }
}

/// DCT detector over an image's luma plane
pub fn detect(img: &ImageBuffer, band: &DctBand) -> Result<DetectionResult, DetectorError> {
    check_band(band)?;

    let luma = img.luma_plane();
    let stats = match AcStatistics::compute(&luma, img.width, img.height) {
        Ok(stats) => stats,
        Err(DetectorError::InsufficientData { needed, got }) => {
            return Ok(DetectionResult::insufficient(Method::Dct, needed, got));
        }
        Err(e) => return Err(e),
    };

    let mut details = Details::new()
        .with("blocks_analyzed", stats.blocks)
        .with("ac_coefficients", stats.coefficients)
        .with("mean_abs_coeff", stats.mean_abs)
        .with("std_abs_coeff", stats.std_abs);

    let Some(ratio) = stats.dispersion() else {
        log::debug!("DCT: blocks={} carry no AC energy", stats.blocks);
        details.insert("note", "no AC energy, image is flat");
        return Ok(DetectionResult::new(Method::Dct, false, 0.0, details));
    };
    let (detected, confidence) = classify(ratio, band);

    log::debug!(
        "DCT: blocks={} mean|AC|={:.3} std|AC|={:.3} ratio={:.3} detected={}",
        stats.blocks,
        stats.mean_abs,
        stats.std_abs,
        ratio,
        detected
    );

    details.insert("ac_dispersion", ratio);
    details.insert("band_low", band.ratio_low);
    details.insert("band_high", band.ratio_high);
    if stats.dropped_columns > 0 || stats.dropped_rows > 0 {
        details.insert("edge_columns_dropped", stats.dropped_columns);
        details.insert("edge_rows_dropped", stats.dropped_rows);
    }

    Ok(DetectionResult::new(Method::Dct, detected, confidence, details))
}
