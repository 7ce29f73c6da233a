//! Core analysis engine
//!
//! Runs the detectors that apply to a decoded media asset, then attempts
//! payload extraction when any of them fired:
//!
//! | Media | Detectors |
//! |-------|-----------|
//! | Image | LSB, DCT |
//! | Audio | LSB, phase coding |
//! | Video | frame-sampled LSB + DCT, aggregated |
//!
//! A detector that fails is recorded as a negative result with an `error`
//! detail. Only invalid input (missing metadata) aborts an analysis.

pub mod bitplane;
pub mod dct;
pub mod extract;
pub mod phase;
pub mod result;
pub mod video;

pub use result::{
    AnalysisReport, DetailValue, Details, DetectionResult, ExtractedData, ExtractionResult,
    FrameFinding, Method,
};

use crate::config::DetectorConfig;
use crate::error::{AnalysisError, DetectorError};
use crate::media::{AudioBuffer, ImageBuffer, MediaAsset, MediaKind, VideoSource};

/// Detectors that run for each media kind, in report order
pub fn detectors_for(kind: MediaKind) -> &'static [Method] {
    match kind {
        MediaKind::Image => &[Method::Lsb, Method::Dct],
        MediaKind::Audio => &[Method::Lsb, Method::Phase],
        MediaKind::Video => &[Method::Frames],
    }
}

/// Stateless analyzer; one instance can serve any number of threads
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: DetectorConfig,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: DetectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Number of frames sampled per video
    pub fn with_sample_frames(mut self, k: usize) -> Self {
        self.config.video.sample_frames = k;
        self
    }

    /// Expose raw bytes when no printable message is found
    pub fn with_binary_preview(mut self, enabled: bool) -> Self {
        self.config.extraction.binary_preview = enabled;
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Analyze one decoded asset
    ///
    /// Returns `Err` only for input the engine cannot interpret at all. Every
    /// detector outcome, including failures, ends up in the report.
    pub fn analyze(&self, asset: &MediaAsset) -> Result<AnalysisReport, AnalysisError> {
        asset.validate()?;
        let kind = asset.kind();
        log::debug!("Dispatch: {} -> {:?}", kind, detectors_for(kind));

        let report = match asset {
            MediaAsset::Image(img) => self.analyze_image(img),
            MediaAsset::Audio(audio) => self.analyze_audio(audio),
            MediaAsset::Video(video) => self.analyze_video(video),
        };
        Ok(report)
    }

    /// Analyze `asset` and append the outcome to a caller-owned batch
    pub fn analyze_into(
        &self,
        mut batch: ReportBatch,
        label: impl Into<String>,
        asset: &MediaAsset,
    ) -> ReportBatch {
        batch.push(label, self.analyze(asset));
        batch
    }

    fn analyze_image(&self, img: &ImageBuffer) -> AnalysisReport {
        let detections: Vec<DetectionResult> = detectors_for(MediaKind::Image)
            .iter()
            .map(|&method| {
                let outcome = match method {
                    Method::Lsb => Ok(bitplane::detect_image(
                        img,
                        &self.config.image_lsb,
                        self.config.min_lsb_samples,
                    )),
                    Method::Dct => dct::detect(img, &self.config.dct),
                    other => Err(unroutable(other, MediaKind::Image)),
                };
                absorb(method, outcome)
            })
            .collect();

        let extractions = if detections.iter().any(|d| d.detected) {
            vec![extract::extract_image(img, &self.config.extraction)]
        } else {
            Vec::new()
        };

        AnalysisReport::new(img.info(), detections, extractions, Vec::new())
    }

    fn analyze_audio(&self, audio: &AudioBuffer) -> AnalysisReport {
        let detections: Vec<DetectionResult> = detectors_for(MediaKind::Audio)
            .iter()
            .map(|&method| {
                let outcome = match method {
                    Method::Lsb => Ok(bitplane::detect_audio(
                        audio,
                        &self.config.audio_lsb,
                        self.config.min_lsb_samples,
                    )),
                    Method::Phase => phase::detect(audio, &self.config.phase),
                    other => Err(unroutable(other, MediaKind::Audio)),
                };
                absorb(method, outcome)
            })
            .collect();

        let extractions = if detections.iter().any(|d| d.detected) {
            vec![extract::extract_audio(audio, &self.config.extraction)]
        } else {
            Vec::new()
        };

        AnalysisReport::new(audio.info(), detections, extractions, Vec::new())
    }

    fn analyze_video(&self, video: &VideoSource) -> AnalysisReport {
        let analysis = video::analyze(video, &self.config);

        let mut extractions = Vec::new();
        if analysis.result.detected {
            if let Some(index) = analysis.first_lsb_frame {
                match video.frames().frame(index) {
                    Ok(frame) => {
                        let mut extraction =
                            extract::extract_image(&frame, &self.config.extraction);
                        extraction.details.insert("frame_index", index);
                        extractions.push(extraction);
                    }
                    Err(e) => log::warn!("frame {}: extraction skipped: {}", index, e),
                }
            }
        }

        AnalysisReport::new(video.info(), vec![analysis.result], extractions, analysis.findings)
    }
}

fn unroutable(method: Method, kind: MediaKind) -> DetectorError {
    DetectorError::Failure(format!("{} does not apply to {}", method, kind))
}

/// Turn a detector error into a negative result for that method only
fn absorb(method: Method, outcome: Result<DetectionResult, DetectorError>) -> DetectionResult {
    match outcome {
        Ok(result) => result,
        Err(e) => {
            log::warn!("{} detector failed: {}", method, e);
            DetectionResult::from_error(method, &e)
        }
    }
}

/// Outcome of one file in a batch
#[derive(Debug)]
pub struct BatchEntry {
    pub label: String,
    pub outcome: Result<AnalysisReport, AnalysisError>,
}

impl BatchEntry {
    pub fn report(&self) -> Option<&AnalysisReport> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&AnalysisError> {
        self.outcome.as_ref().err()
    }

    pub fn flagged(&self) -> bool {
        self.report().is_some_and(AnalysisReport::any_detected)
    }
}

/// Caller-owned accumulator of per-file outcomes, in insertion order
#[derive(Debug, Default)]
pub struct ReportBatch {
    entries: Vec<BatchEntry>,
}

impl ReportBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        label: impl Into<String>,
        outcome: Result<AnalysisReport, AnalysisError>,
    ) {
        self.entries.push(BatchEntry {
            label: label.into(),
            outcome,
        });
    }

    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BatchEntry> {
        self.entries.iter()
    }
}

impl FromIterator<(String, Result<AnalysisReport, AnalysisError>)> for ReportBatch {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (String, Result<AnalysisReport, AnalysisError>)>,
    {
        let mut batch = Self::new();
        for (label, outcome) in iter {
            batch.push(label, outcome);
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DctBand;
    use crate::media::ImageBuffer;

    // ==========================================================================
    // DISPATCH TABLE
    // ==========================================================================

    #[test]
    fn test_dispatch_table() {
        assert_eq!(detectors_for(MediaKind::Image), &[Method::Lsb, Method::Dct]);
        assert_eq!(detectors_for(MediaKind::Audio), &[Method::Lsb, Method::Phase]);
        assert_eq!(detectors_for(MediaKind::Video), &[Method::Frames]);
    }

    #[test]
    fn test_image_report_lists_detectors_in_order() {
        let img = ImageBuffer::new(16, 16, 1, (0..=255u8).collect());
        let report = Analyzer::new().analyze(&MediaAsset::Image(img)).unwrap();
        let methods: Vec<Method> = report.detections().iter().map(|d| d.method).collect();
        assert_eq!(methods, vec![Method::Lsb, Method::Dct]);
    }

    // ==========================================================================
    // FAILURE ISOLATION
    // ==========================================================================
    //
    // An inverted DCT band makes the DCT detector fail. LSB must still report,
    // and extraction must still run because LSB fired.
    // ==========================================================================

    fn inverted_band() -> DetectorConfig {
        DetectorConfig {
            dct: DctBand { ratio_low: 5.0, ratio_high: 1.0 },
            ..DetectorConfig::default()
        }
    }

    #[test]
    fn test_dct_failure_does_not_hide_lsb() {
        let img = ImageBuffer::new(16, 16, 3, vec![255; 16 * 16 * 3]);
        let report = Analyzer::new()
            .with_config(inverted_band())
            .analyze(&MediaAsset::Image(img))
            .unwrap();

        let dct = report.detection(Method::Dct).unwrap();
        assert!(!dct.detected);
        assert_eq!(dct.confidence, 0.0);
        assert!(dct.error().unwrap().contains("invalid DCT band"));

        let lsb = report.detection(Method::Lsb).unwrap();
        assert!(lsb.detected);
        assert!(report.extraction(Method::LsbExtraction).is_some());
    }

    #[test]
    fn test_invalid_dct_band_still_reports() {
        let img = ImageBuffer::new(8, 8, 1, (0..64u8).map(|v| v * 3).collect());
        let report = Analyzer::new()
            .with_config(inverted_band())
            .analyze(&MediaAsset::Image(img))
            .unwrap();
        assert_eq!(report.detections().len(), 2);
        assert!(report.detection(Method::Lsb).unwrap().error().is_none());
    }

    #[test]
    fn test_flat_image_is_not_a_dct_failure() {
        let img = ImageBuffer::new(16, 16, 3, vec![255; 16 * 16 * 3]);
        let report = Analyzer::new().analyze(&MediaAsset::Image(img)).unwrap();

        let dct = report.detection(Method::Dct).unwrap();
        assert!(!dct.detected);
        assert_eq!(dct.error(), None);
        assert!(dct.details.get("note").is_some());
    }

    // ==========================================================================
    // FATAL ERRORS
    // ==========================================================================

    #[test]
    fn test_missing_channels_is_fatal() {
        let img = ImageBuffer::new(10, 10, 0, vec![0; 300]);
        let err = Analyzer::new().analyze(&MediaAsset::Image(img)).unwrap_err();
        assert!(matches!(err, AnalysisError::Decode(_)));
    }

    // ==========================================================================
    // EXTRACTION GATING
    // ==========================================================================

    #[test]
    fn test_no_extraction_when_nothing_detected() {
        // Alternating LSBs: perfectly balanced
        let samples: Vec<i32> = (0..100).map(|i| if i % 2 == 0 { 10 } else { 11 }).collect();
        let audio = AudioBuffer::new(8000, 1, samples);
        let report = Analyzer::new().analyze(&MediaAsset::Audio(audio)).unwrap();

        assert!(!report.any_detected());
        assert!(report.extractions().is_empty());
        // Too short for one phase segment
        let phase = report.detection(Method::Phase).unwrap();
        assert!(phase.details.get("note").is_some());
    }

    #[test]
    fn test_video_extraction_uses_flagged_frame() {
        let bits = extract::unpack_bits(b"frame secret");
        let mut data = vec![255u8; 16 * 16 * 3];
        for (sample, bit) in data.iter_mut().zip(&bits) {
            *sample = 0xFE | bit;
        }
        let frame = ImageBuffer::new(16, 16, 3, data);
        let video = VideoSource::from_frames(vec![frame; 4], 24.0);

        let report = Analyzer::new().analyze(&MediaAsset::Video(video)).unwrap();
        assert!(report.detection(Method::Frames).unwrap().detected);
        assert_eq!(report.frames().len(), 4);

        let extraction = report.extraction(Method::LsbExtraction).unwrap();
        assert_eq!(extraction.text(), Some("frame secret"));
        assert_eq!(extraction.details.get_f64("frame_index"), Some(0.0));
    }

    // ==========================================================================
    // IDEMPOTENCE AND BUILDER
    // ==========================================================================

    #[test]
    fn test_repeated_analysis_is_identical() {
        let data: Vec<u8> = (0..32 * 32).map(|i| ((i * 37) % 251) as u8).collect();
        let img = ImageBuffer::new(32, 32, 1, data);
        let asset = MediaAsset::Image(img);
        let analyzer = Analyzer::new();

        let a = analyzer.analyze(&asset).unwrap();
        let b = analyzer.analyze(&asset).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_builder_overrides() {
        let analyzer = Analyzer::new().with_sample_frames(3).with_binary_preview(true);
        assert_eq!(analyzer.config().video.sample_frames, 3);
        assert!(analyzer.config().extraction.binary_preview);
    }

    // ==========================================================================
    // BATCH ACCUMULATOR
    // ==========================================================================

    #[test]
    fn test_batch_keeps_insertion_order_and_errors() {
        let analyzer = Analyzer::new();
        let good = MediaAsset::Image(ImageBuffer::new(8, 8, 1, vec![255; 64]));
        let bad = MediaAsset::Image(ImageBuffer::new(8, 8, 0, vec![255; 64]));

        let batch = ReportBatch::new();
        let batch = analyzer.analyze_into(batch, "first.png", &good);
        let batch = analyzer.analyze_into(batch, "second.png", &bad);

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.entries()[0].label, "first.png");
        assert!(batch.entries()[0].flagged());
        assert!(batch.entries()[1].error().is_some());
        assert!(!batch.entries()[1].flagged());
    }
}
