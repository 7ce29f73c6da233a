//! End-to-end tests through the public API
//!
//! Fixtures are synthesized at test time: noise from a seeded ChaCha RNG,
//! PNGs through the `image` crate and WAVs through `hound`, written to the
//! system temp directory and removed afterwards.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustfft::{num_complex::Complex, FftPlanner};
use std::f64::consts::PI;
use std::path::PathBuf;

use stegsift::analyzer::extract::{extract, pack_bits, unpack_bits};
use stegsift::config::{DctBand, ExtractionConfig};
use stegsift::report::{self, Summary};
use stegsift::{
    decode, AnalysisError, Analyzer, AudioBuffer, DetectorConfig, ImageBuffer, MediaAsset,
    MediaInfo, Method, ReportBatch, VideoSource,
};

const MESSAGE: &str = "This is a hidden message in the image!";

// ==========================================================================
// FIXTURES
// ==========================================================================

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("stegsift_it_{}_{}", std::process::id(), name))
}

fn noise_image(width: usize, height: usize, channels: usize, seed: u64) -> ImageBuffer {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut data = vec![0u8; width * height * channels];
    rng.fill(&mut data[..]);
    ImageBuffer::new(width, height, channels, data)
}

/// White cover with `message` plus a 16-bit end marker in the LSBs,
/// one bit per color sample, starting at pixel 0
fn stego_cover(width: usize, height: usize, message: &str) -> ImageBuffer {
    let mut data = vec![255u8; width * height * 3];
    let mut bits = unpack_bits(message.as_bytes());
    bits.extend(unpack_bits(&[0xFF, 0xFE]));
    for (sample, bit) in data.iter_mut().zip(bits) {
        *sample = (*sample & 0xFE) | bit;
    }
    ImageBuffer::new(width, height, 3, data)
}

/// Mono signal whose bins all carry phase +π/2 or -π/2
fn phase_coded_signal(segment_len: usize, segments: usize, amplitude: f64, seed: u64) -> Vec<i16> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut spectrum = vec![Complex::new(0.0f64, 0.0); segment_len];
    for k in 1..segment_len / 2 {
        let phase = if rng.gen::<bool>() { PI / 2.0 } else { -PI / 2.0 };
        let bin = Complex::from_polar(amplitude / 2.0, phase);
        spectrum[k] = bin;
        spectrum[segment_len - k] = bin.conj();
    }

    let mut planner = FftPlanner::new();
    planner.plan_fft_inverse(segment_len).process(&mut spectrum);

    let segment: Vec<i16> = spectrum
        .iter()
        .map(|c| c.re.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16)
        .collect();
    segment.iter().cycle().take(segment_len * segments).copied().collect()
}

fn write_wav(path: &PathBuf, sample_rate: u32, samples: &[i16]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

fn save_png(path: &PathBuf, img: &ImageBuffer) {
    let (width, height) = (img.width as u32, img.height as u32);
    let rgb = image::RgbImage::from_raw(width, height, img.data.clone()).unwrap();
    rgb.save(path).unwrap();
}

// ==========================================================================
// SCENARIO 1: random LSBs are not flagged
// ==========================================================================

#[test]
fn test_random_lsb_image_is_clean() {
    let img = noise_image(400, 300, 3, 7);
    let report = Analyzer::new().analyze(&MediaAsset::Image(img)).unwrap();

    let lsb = report.detection(Method::Lsb).unwrap();
    assert!(!lsb.detected);
    assert!(lsb.confidence < 1.0, "confidence = {}", lsb.confidence);
    assert!(lsb.details.get_f64("chi_square").unwrap() < 100.0);
    assert_eq!(lsb.details.get_f64("total_pixels"), Some(120_000.0));

    let dct = report.detection(Method::Dct).unwrap();
    assert!(!dct.detected, "ac_dispersion = {:?}", dct.details.get_f64("ac_dispersion"));
    assert!(!report.any_detected());
    assert!(report.extractions().is_empty());
}

// ==========================================================================
// SCENARIO 2: embedded message is detected and recovered
// ==========================================================================

#[test]
fn test_embedded_message_detected_and_recovered() {
    let img = stego_cover(400, 300, MESSAGE);
    let report = Analyzer::new().analyze(&MediaAsset::Image(img)).unwrap();

    let lsb = report.detection(Method::Lsb).unwrap();
    assert!(lsb.detected);
    assert!(lsb.confidence > 80.0, "confidence = {}", lsb.confidence);
    // White cover: mostly flat blocks, still a valid statistic
    assert!(report.detection(Method::Dct).unwrap().error().is_none());

    let extraction = report.extraction(Method::LsbExtraction).unwrap();
    assert!(extraction.extracted);
    assert_eq!(extraction.text(), Some(MESSAGE));
    assert_eq!(extraction.bits_extracted, 1000);
}

#[test]
fn test_embedded_message_survives_png_file() {
    let path = temp_path("stego.png");
    save_png(&path, &stego_cover(400, 300, MESSAGE));

    let asset = decode::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let report = Analyzer::new().analyze(&asset).unwrap();
    match report.media() {
        MediaInfo::Image { width, height, channels, format } => {
            assert_eq!((*width, *height, *channels), (400, 300, 3));
            assert_eq!(format.as_deref(), Some("png"));
        }
        other => panic!("expected image info, got {:?}", other),
    }
    assert_eq!(
        report.extraction(Method::LsbExtraction).and_then(|e| e.text()),
        Some(MESSAGE)
    );
}

// ==========================================================================
// SCENARIO 3: phase-coded WAV
// ==========================================================================

#[test]
fn test_phase_coded_wav_detected() {
    let path = temp_path("phase.wav");
    let samples = phase_coded_signal(8192, 2, 60.0, 11);
    write_wav(&path, 44100, &samples);

    let asset = decode::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let report = Analyzer::new().analyze(&asset).unwrap();
    let phase = report.detection(Method::Phase).unwrap();

    assert!(phase.detected);
    let std = phase.details.get_f64("phase_std").unwrap();
    assert!(std > phase.details.get_f64("threshold").unwrap(), "phase_std = {}", std);
    assert_eq!(phase.details.get_f64("segments_analyzed"), Some(2.0));
}

#[test]
fn test_short_wav_phase_is_insufficient() {
    let path = temp_path("short.wav");
    write_wav(&path, 8000, &phase_coded_signal(1024, 1, 60.0, 3));

    let asset = decode::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let report = Analyzer::new().analyze(&asset).unwrap();
    let phase = report.detection(Method::Phase).unwrap();
    assert!(!phase.detected);
    assert_eq!(phase.confidence, 0.0);
    assert!(phase.details.get("note").is_some());
}

// ==========================================================================
// SCENARIO 4: 6 of 10 sampled frames flagged
// ==========================================================================

fn six_of_ten_frames() -> Vec<ImageBuffer> {
    (0..10)
        .map(|i| {
            if i % 5 < 3 {
                stego_cover(64, 64, "frame payload")
            } else {
                noise_image(64, 64, 3, 100 + i as u64)
            }
        })
        .collect()
}

#[test]
fn test_video_majority_of_sampled_frames() {
    let video = VideoSource::from_frames(six_of_ten_frames(), 25.0);
    let report = Analyzer::new().analyze(&MediaAsset::Video(video)).unwrap();

    let frames = report.detection(Method::Frames).unwrap();
    assert_eq!(frames.details.get_f64("detection_rate"), Some(0.6));
    assert_eq!(frames.details.get_f64("frames_with_steganography"), Some(6.0));
    assert!(frames.detected);
    assert!((frames.confidence - 60.0).abs() < 1e-9);

    assert_eq!(report.frames().len(), 10);
    // Noise frames stay clean under both detectors
    for f in report.frames().iter().filter(|f| f.frame_index % 5 >= 3) {
        assert!(!f.flagged(), "frame {} flagged", f.frame_index);
        assert_eq!(f.dct_error, None);
    }
    assert_eq!(
        report.extraction(Method::LsbExtraction).and_then(|e| e.text()),
        Some("frame payload")
    );
}

#[test]
fn test_video_from_frame_directory() {
    let dir = temp_path("frames");
    std::fs::create_dir_all(&dir).unwrap();
    for (i, frame) in six_of_ten_frames().iter().enumerate() {
        save_png(&dir.join(format!("{:05}.png", i)), frame);
    }

    let asset = decode::load_frames(&dir, 24.0).unwrap();
    let report = Analyzer::new().analyze(&asset).unwrap();
    std::fs::remove_dir_all(&dir).ok();

    match report.media() {
        MediaInfo::Video { frame_count, width, .. } => {
            assert_eq!(*frame_count, 10);
            assert_eq!(*width, 64);
        }
        other => panic!("expected video info, got {:?}", other),
    }
    let frames = report.detection(Method::Frames).unwrap();
    assert!(frames.detected);
    assert_eq!(frames.details.get_f64("detection_rate"), Some(0.6));
}

#[test]
fn test_video_minority_not_flagged() {
    let frames: Vec<ImageBuffer> = (0..10)
        .map(|i| {
            if i < 4 {
                stego_cover(32, 32, "x")
            } else {
                noise_image(32, 32, 3, i as u64)
            }
        })
        .collect();
    let video = VideoSource::from_frames(frames, 25.0);
    let report = Analyzer::new().analyze(&MediaAsset::Video(video)).unwrap();

    let result = report.detection(Method::Frames).unwrap();
    assert!(!result.detected);
    assert_eq!(result.details.get_f64("detection_rate"), Some(0.4));
    assert!(report.extractions().is_empty());
}

// ==========================================================================
// SCENARIO 5: malformed buffer
// ==========================================================================

#[test]
fn test_missing_channel_metadata_is_decode_error() {
    let img = ImageBuffer::new(400, 300, 0, vec![0; 400 * 300 * 3]);
    let err = Analyzer::new().analyze(&MediaAsset::Image(img)).unwrap_err();
    assert!(matches!(err, AnalysisError::Decode(_)));
}

#[test]
fn test_audio_missing_sample_rate_is_decode_error() {
    let audio = AudioBuffer::new(0, 1, vec![0; 100]);
    let err = Analyzer::new().analyze(&MediaAsset::Audio(audio)).unwrap_err();
    assert!(matches!(err, AnalysisError::Decode(_)));
}

// ==========================================================================
// SCENARIO 6: a single 8x8 block
// ==========================================================================

#[test]
fn test_single_block_gray_image() {
    let img = noise_image(8, 8, 1, 5);
    let report = Analyzer::new().analyze(&MediaAsset::Image(img)).unwrap();

    let dct = report.detection(Method::Dct).unwrap();
    assert!(dct.error().is_none());
    assert_eq!(dct.details.get_f64("blocks_analyzed"), Some(1.0));

    let lsb = report.detection(Method::Lsb).unwrap();
    assert_eq!(lsb.details.get_f64("total_samples"), Some(64.0));
}

// ==========================================================================
// PROPERTIES
// ==========================================================================

#[test]
fn test_dct_failure_is_isolated_from_lsb() {
    // Inverted band: DCT cannot classify anything
    let config = DetectorConfig {
        dct: DctBand { ratio_low: 3.0, ratio_high: 0.5 },
        ..DetectorConfig::default()
    };
    let img = ImageBuffer::new(64, 64, 1, vec![128; 64 * 64]);
    let report = Analyzer::new()
        .with_config(config)
        .analyze(&MediaAsset::Image(img))
        .unwrap();

    let dct = report.detection(Method::Dct).unwrap();
    assert!(!dct.detected);
    assert!(dct.error().is_some());
    let lsb = report.detection(Method::Lsb).unwrap();
    assert!(lsb.error().is_none());
    // 128 has LSB 0 everywhere
    assert!(lsb.detected);
}

#[test]
fn test_flat_image_dct_is_not_a_failure() {
    let img = ImageBuffer::new(64, 64, 1, vec![128; 64 * 64]);
    let report = Analyzer::new().analyze(&MediaAsset::Image(img)).unwrap();

    let dct = report.detection(Method::Dct).unwrap();
    assert!(!dct.detected);
    assert!(dct.error().is_none());
    assert!(dct.details.get("note").is_some());
    assert!(report.detection(Method::Lsb).unwrap().detected);
}

#[test]
fn test_analysis_is_idempotent() {
    let analyzer = Analyzer::new();
    let asset = MediaAsset::Image(noise_image(40, 30, 3, 99));
    assert_eq!(analyzer.analyze(&asset).unwrap(), analyzer.analyze(&asset).unwrap());
}

#[test]
fn test_extraction_inverts_bit_packing() {
    for text in ["abcd", MESSAGE, "Zero-width? No: plain ASCII ~!@#$%^&*()"] {
        let bits = unpack_bits(text.as_bytes());
        assert_eq!(pack_bits(&bits), text.as_bytes());
        let result = extract(&bits, &ExtractionConfig::default());
        assert_eq!(result.text(), Some(text));
    }
}

#[test]
fn test_balanced_bits_never_flagged() {
    // Alternating LSBs: exactly half ones
    let samples: Vec<i32> = (0..4096).map(|i| 1000 + (i % 2)).collect();
    let report = Analyzer::new()
        .analyze(&MediaAsset::Audio(AudioBuffer::new(8000, 1, samples)))
        .unwrap();
    let lsb = report.detection(Method::Lsb).unwrap();
    assert!(!lsb.detected);
    assert_eq!(lsb.details.get_f64("chi_square"), Some(0.0));
}

// ==========================================================================
// BATCH AND REPORTS
// ==========================================================================

#[test]
fn test_batch_report_files() {
    let analyzer = Analyzer::new();
    let clean = MediaAsset::Image(noise_image(64, 64, 3, 1));
    let stego = MediaAsset::Image(stego_cover(64, 64, MESSAGE));
    let mut batch = ReportBatch::new();
    batch = analyzer.analyze_into(batch, "clean.png", &clean);
    batch = analyzer.analyze_into(batch, "stego.png", &stego);
    batch = analyzer.analyze_into(
        batch,
        "broken.png",
        &MediaAsset::Image(ImageBuffer::new(4, 4, 0, vec![0; 48])),
    );

    let summary = Summary::from_batch(&batch);
    assert_eq!((summary.clean, summary.flagged, summary.failed), (1, 1, 1));
    assert_eq!(summary.exit_code(), 2);

    let json_path = temp_path("batch.json");
    report::generate(&json_path, &batch).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    std::fs::remove_file(&json_path).ok();

    assert_eq!(json["files"][1]["file"], "stego.png");
    assert_eq!(
        json["files"][1]["report"]["extractions"]["LSB Extraction"]["data"],
        MESSAGE
    );

    let csv_path = temp_path("batch.csv");
    report::generate(&csv_path, &batch).unwrap();
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    std::fs::remove_file(&csv_path).ok();
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.contains(MESSAGE));
}

#[test]
fn test_config_file_overrides() {
    let path = temp_path("config.json");
    let json = r#"{ "video": { "sample_frames": 4 }, "extraction": { "min_printable": 50 } }"#;
    std::fs::write(&path, json).unwrap();
    let config = DetectorConfig::from_json_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.video.sample_frames, 4);
    assert_eq!(config.video.majority, 0.5);

    // A 38-character message is now too short to count
    let report = Analyzer::new()
        .with_config(config)
        .analyze(&MediaAsset::Image(stego_cover(100, 100, MESSAGE)))
        .unwrap();
    let extraction = report.extraction(Method::LsbExtraction).unwrap();
    assert!(!extraction.extracted);
}
