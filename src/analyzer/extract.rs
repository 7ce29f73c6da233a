//! Payload recovery from an LSB plane
//!
//! The embedding format of a suspicious file is unknown, so recovery is a
//! heuristic: pack the plane into bytes most-significant-bit first, then read
//! printable ASCII from the start until the first non-printable byte or the
//! configured byte limit. There is no length prefix to trust.

use crate::config::ExtractionConfig;
use crate::media::{AudioBuffer, ImageBuffer};

use super::bitplane::{lsb_plane, lsb_plane_channel, Sample};
use super::result::{Details, ExtractedData, ExtractionResult, Method};

/// Pack bits into bytes, MSB first. A trailing partial byte is dropped.
pub fn pack_bits(bits: &[u8]) -> Vec<u8> {
    bits.chunks_exact(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | (b & 1)))
        .collect()
}

/// Spread bytes into bits, MSB first
pub fn unpack_bits(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1))
        .collect()
}

fn is_printable(b: u8) -> bool {
    (32..127).contains(&b)
}

/// Longest printable prefix
pub fn printable_prefix(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&b| !is_printable(b)).unwrap_or(bytes.len());
    &bytes[..end]
}

/// First `limit` LSBs, optionally from one interleaved channel only
fn leading_bits<S: Sample>(
    samples: &[S],
    channels: usize,
    channel: Option<usize>,
    limit: usize,
) -> Vec<u8> {
    match channel {
        Some(c) => {
            let end = samples.len().min(limit.saturating_mul(channels.max(1)));
            lsb_plane_channel(&samples[..end], channels, c)
        }
        None => lsb_plane(&samples[..samples.len().min(limit)]),
    }
}

/// Decode a bit sequence into a message, if one is there
pub fn extract(bits: &[u8], config: &ExtractionConfig) -> ExtractionResult {
    let usable = bits.len().min(config.max_bytes.saturating_mul(8)) / 8 * 8;
    let bytes = pack_bits(&bits[..usable]);
    let run = printable_prefix(&bytes).len();

    let mut details = Details::new()
        .with("bytes_extracted", bytes.len())
        .with("printable_run", run);

    let (extracted, data) = if run > 0 && run >= config.min_printable {
        let message: String = bytes[..run].iter().map(|&b| b as char).collect();
        (true, Some(ExtractedData::Text(message)))
    } else if config.binary_preview && !bytes.is_empty() {
        details.insert("note", "no printable message, raw bytes exposed");
        (true, Some(ExtractedData::Bytes(bytes)))
    } else {
        details.insert("note", "no printable message");
        (false, None)
    };

    log::debug!(
        "Extraction: bits={} printable_run={} extracted={}",
        usable,
        run,
        extracted
    );

    ExtractionResult {
        method: Method::LsbExtraction,
        extracted,
        data,
        bits_extracted: usable,
        details,
    }
}

fn extract_interleaved<S: Sample>(
    samples: &[S],
    channels: usize,
    config: &ExtractionConfig,
) -> ExtractionResult {
    if let Some(c) = config.channel {
        if c >= channels {
            return ExtractionResult {
                method: Method::LsbExtraction,
                extracted: false,
                data: None,
                bits_extracted: 0,
                details: Details::new().with(
                    "error",
                    format!("channel {} out of range ({} channels)", c, channels),
                ),
            };
        }
    }

    let limit = config.max_bytes.saturating_mul(8);
    let bits = leading_bits(samples, channels, config.channel, limit);
    let mut result = extract(&bits, config);
    match config.channel {
        Some(c) => result.details.insert("channel_used", c),
        None => result.details.insert("channel_used", "all"),
    }
    result
}

pub fn extract_image(img: &ImageBuffer, config: &ExtractionConfig) -> ExtractionResult {
    extract_interleaved(&img.data, img.channels, config)
}

pub fn extract_audio(audio: &AudioBuffer, config: &ExtractionConfig) -> ExtractionResult {
    extract_interleaved(&audio.samples, audio.channels, config)
}
