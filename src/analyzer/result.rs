//! Result records produced by the detectors
//!
//! Field names here are a contract with whatever renders or transports the
//! report: `method`, `detected`, `confidence`, `details` for detections and
//! `method`, `extracted`, `data`, `bits_extracted` for extractions.

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::DetectorError;
use crate::media::MediaInfo;

/// Which detector or extractor produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Lsb,
    Dct,
    Phase,
    Frames,
    LsbExtraction,
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Method::Lsb => "LSB (Least Significant Bit)",
            Method::Dct => "DCT (Discrete Cosine Transform)",
            Method::Phase => "Phase Coding",
            Method::Frames => "Frame-based Analysis",
            Method::LsbExtraction => "LSB Extraction",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Method {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// A single detail value: a number or a short note
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DetailValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl DetailValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DetailValue::Int(i) => Some(*i as f64),
            DetailValue::Float(f) => Some(*f),
            DetailValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DetailValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<usize> for DetailValue {
    fn from(v: usize) -> Self {
        DetailValue::Int(v as i64)
    }
}

impl From<u32> for DetailValue {
    fn from(v: u32) -> Self {
        DetailValue::Int(v as i64)
    }
}

impl From<i64> for DetailValue {
    fn from(v: i64) -> Self {
        DetailValue::Int(v)
    }
}

impl From<f64> for DetailValue {
    fn from(v: f64) -> Self {
        DetailValue::Float(v)
    }
}

impl From<&str> for DetailValue {
    fn from(v: &str) -> Self {
        DetailValue::Text(v.to_string())
    }
}

impl From<String> for DetailValue {
    fn from(v: String) -> Self {
        DetailValue::Text(v)
    }
}

/// Insertion-ordered detail map
///
/// Serializes as a JSON object whose keys keep the order they were added in,
/// so rendered reports are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Details(Vec<(String, DetailValue)>);

impl Details {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing an existing value in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<DetailValue>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<DetailValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&DetailValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(DetailValue::as_f64)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DetailValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Details {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Outcome of one detector on one buffer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    pub method: Method,
    pub detected: bool,
    /// Percentage in `[0, 100]`
    pub confidence: f64,
    pub details: Details,
}

impl DetectionResult {
    pub fn new(method: Method, detected: bool, confidence: f64, details: Details) -> Self {
        Self {
            method,
            detected,
            confidence: confidence.clamp(0.0, 100.0),
            details,
        }
    }

    /// Too few samples: negative result that records how many there were
    pub fn insufficient(method: Method, needed: usize, got: usize) -> Self {
        Self::new(
            method,
            false,
            0.0,
            Details::new()
                .with("note", "insufficient data for a meaningful statistic")
                .with("samples", got)
                .with("min_samples", needed),
        )
    }

    /// Convert a local detector error into a negative, annotated result
    pub fn from_error(method: Method, err: &DetectorError) -> Self {
        match err {
            DetectorError::InsufficientData { needed, got } => {
                Self::insufficient(method, *needed, *got)
            }
            DetectorError::Failure(_) => Self::new(
                method,
                false,
                0.0,
                Details::new().with("error", err.to_string()),
            ),
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.details.get("error").and_then(DetailValue::as_str)
    }
}

/// Recovered payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractedData {
    Text(String),
    Bytes(Vec<u8>),
}

impl ExtractedData {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ExtractedData::Text(s) => Some(s),
            ExtractedData::Bytes(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub method: Method,
    pub extracted: bool,
    pub data: Option<ExtractedData>,
    pub bits_extracted: usize,
    pub details: Details,
}

impl ExtractionResult {
    pub fn text(&self) -> Option<&str> {
        self.data.as_ref().and_then(ExtractedData::as_text)
    }
}

/// Per-frame outcome inside a video analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameFinding {
    pub frame_index: usize,
    pub lsb_detected: bool,
    pub lsb_confidence: f64,
    pub dct_detected: bool,
    /// DCT detector failure on an otherwise usable frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dct_error: Option<String>,
    /// Frame could not be fetched or is malformed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FrameFinding {
    /// Sampled frame that never reached the detectors
    pub fn failed(frame_index: usize, error: String) -> Self {
        Self {
            frame_index,
            lsb_detected: false,
            lsb_confidence: 0.0,
            dct_detected: false,
            dct_error: None,
            error: Some(error),
        }
    }

    pub fn flagged(&self) -> bool {
        self.lsb_detected || self.dct_detected
    }
}

/// Everything learned about one media file
///
/// Built once by the analyzer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    media: MediaInfo,
    detections: Vec<DetectionResult>,
    extractions: Vec<ExtractionResult>,
    frames: Vec<FrameFinding>,
}

impl AnalysisReport {
    pub(crate) fn new(
        media: MediaInfo,
        detections: Vec<DetectionResult>,
        extractions: Vec<ExtractionResult>,
        frames: Vec<FrameFinding>,
    ) -> Self {
        Self {
            media,
            detections,
            extractions,
            frames,
        }
    }

    pub fn media(&self) -> &MediaInfo {
        &self.media
    }

    /// Detections in the order the detectors ran
    pub fn detections(&self) -> &[DetectionResult] {
        &self.detections
    }

    pub fn detection(&self, method: Method) -> Option<&DetectionResult> {
        self.detections.iter().find(|d| d.method == method)
    }

    pub fn extractions(&self) -> &[ExtractionResult] {
        &self.extractions
    }

    pub fn extraction(&self, method: Method) -> Option<&ExtractionResult> {
        self.extractions.iter().find(|e| e.method == method)
    }

    pub fn frames(&self) -> &[FrameFinding] {
        &self.frames
    }

    pub fn any_detected(&self) -> bool {
        self.detections.iter().any(|d| d.detected)
    }

    /// Highest confidence among detectors that fired
    pub fn max_confidence(&self) -> f64 {
        self.detections
            .iter()
            .filter(|d| d.detected)
            .map(|d| d.confidence)
            .fold(0.0, f64::max)
    }
}

/// Results keyed by method name, in insertion order
struct ByMethod<'a, T>(&'a [T], fn(&T) -> Method);

impl<T: Serialize> Serialize for ByMethod<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for item in self.0 {
            map.serialize_entry((self.1)(item).name(), item)?;
        }
        map.end()
    }
}

impl Serialize for AnalysisReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("AnalysisReport", 4)?;
        s.serialize_field("media", &self.media)?;
        s.serialize_field("detections", &ByMethod(self.detections.as_slice(), |d| d.method))?;
        s.serialize_field("extractions", &ByMethod(self.extractions.as_slice(), |e| e.method))?;
        if self.frames.is_empty() {
            s.skip_field("frames")?;
        } else {
            s.serialize_field("frames", &self.frames)?;
        }
        s.end()
    }
}
