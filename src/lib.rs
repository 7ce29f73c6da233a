//! Stegsift - Detect hidden payloads in images, audio and video
//!
//! Stegsift runs statistical steganalysis on decoded media: it decides
//! whether a file likely carries a hidden message, scores that decision, and
//! tries to recover the message when something is found.
//!
//! # Overview
//!
//! Hiding data in media means changing samples the eye or ear will not miss.
//! Those changes still leave statistical fingerprints: least significant bits
//! stop looking like coin flips, block transforms get an unnatural spread of
//! coefficients, and phase-coded audio loses the phase coherence of natural
//! sound. Stegsift measures those fingerprints.
//!
//! # Detection Methods
//!
//! 1. **LSB** (images, audio): ones-ratio and chi-square test on the least
//!    significant bit plane.
//! 2. **DCT** (images): dispersion of 8×8 block AC coefficients against a
//!    natural-image band.
//! 3. **Phase coding** (audio): spread of adjacent-bin phase differences
//!    across fixed FFT segments.
//! 4. **Frame-based** (video): LSB and DCT on evenly sampled frames, flagged
//!    when a majority of them are.
//!
//! When any detector fires, the LSB plane is packed into bytes and scanned
//! for a printable message.
//!
//! # Quick Start
//!
//! ```no_run
//! use stegsift::{decode, Analyzer};
//!
//! let asset = decode::load("suspicious.png")?;
//! let report = Analyzer::new().analyze(&asset)?;
//!
//! for d in report.detections() {
//!     println!("{}: detected={} confidence={:.1}%", d.method, d.detected, d.confidence);
//! }
//! for e in report.extractions() {
//!     if let Some(text) = e.text() {
//!         println!("Recovered: {}", text);
//!     }
//! }
//! # Ok::<(), stegsift::AnalysisError>(())
//! ```
//!
//! # Errors
//!
//! Only unusable input fails an analysis ([`AnalysisError`]). A detector that
//! cannot compute its statistic reports `detected = false` with a note in its
//! details instead, so one broken detector never hides the others.
//!
//! # Modules
//!
//! - [`analyzer`]: detectors, extraction and the orchestrating [`Analyzer`]
//! - [`media`]: decoded buffers and the [`FrameSource`] trait for video
//! - [`decode`]: file decoding used by the CLI (images, audio, frame directories)
//! - [`config`]: thresholds and tunables
//! - [`report`]: output formatters (JSON, CSV)

pub mod analyzer;
pub mod config;
pub mod decode;
pub mod error;
pub mod media;
pub mod report;

pub use analyzer::{
    detectors_for, AnalysisReport, Analyzer, BatchEntry, DetectionResult, ExtractedData,
    ExtractionResult, FrameFinding, Method, ReportBatch,
};
pub use config::DetectorConfig;
pub use error::{AnalysisError, DetectorError};
pub use media::{
    AudioBuffer, FrameSource, ImageBuffer, MediaAsset, MediaInfo, MediaKind, VideoSource,
};
