//! Audio decoding via symphonia
//!
//! Samples are kept as integers at the source bit depth. Symphonia widens
//! integer PCM to `i32` by shifting left, so shifting back right recovers the
//! original sample, least significant bit included.

use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::AnalysisError;
use crate::media::AudioBuffer;

/// Bit depth assumed when the codec does not report one (lossy formats)
const DEFAULT_BITS_PER_SAMPLE: u32 = 16;

pub fn load<P: AsRef<Path>>(path: P) -> Result<AudioBuffer, AnalysisError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    if let Some(ref ext) = ext {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| AnalysisError::Decode("no audio track".to_string()))?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AnalysisError::Decode("audio sample rate is missing".to_string()))?;
    let bits = track
        .codec_params
        .bits_per_sample
        .unwrap_or(DEFAULT_BITS_PER_SAMPLE)
        .clamp(1, 32);
    let shift = 32 - bits;

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples: Vec<i32> = Vec::new();
    let mut channels = 0usize;
    let mut sample_buf: Option<SampleBuffer<i32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(msg)) => {
                log::warn!("{}: skipping corrupt packet: {}", path.display(), msg);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            channels = spec.channels.count();
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            samples.extend(buf.samples().iter().map(|&s| s >> shift));
        }
    }

    if samples.is_empty() {
        return Err(AnalysisError::Decode(format!(
            "{}: no audio samples decoded",
            path.display()
        )));
    }

    log::debug!(
        "Decoded {}: {} Hz, {} ch, {} bit, {} samples",
        path.display(),
        sample_rate,
        channels,
        bits,
        samples.len()
    );

    let mut buffer = AudioBuffer::new(sample_rate, channels, samples);
    buffer.format = ext;
    Ok(buffer)
}
