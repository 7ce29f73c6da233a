//! CSV report: one row per file
//!
//! Columns for detectors that do not apply to a file's media kind are left
//! empty, so every row has the same shape.

use std::io::{self, Write};

use super::Status;
use crate::analyzer::{AnalysisReport, Method, ReportBatch};

const HEADER: &str = "file,status,media,max_confidence,\
lsb_detected,lsb_confidence,dct_detected,dct_confidence,\
phase_detected,phase_confidence,frames_detected,frames_confidence,\
extracted,message,error";

const METHOD_COLUMNS: [Method; 4] = [Method::Lsb, Method::Dct, Method::Phase, Method::Frames];

pub fn write<W: Write>(writer: &mut W, batch: &ReportBatch) -> io::Result<()> {
    writeln!(writer, "{}", HEADER)?;

    for entry in batch.iter() {
        let mut row = vec![escape(&entry.label), Status::of(entry).as_str().to_string()];
        match &entry.outcome {
            Ok(report) => {
                row.extend(report_columns(report));
                row.push(String::new());
            }
            Err(e) => {
                // media, max_confidence, 4 detectors x 2, extracted, message
                row.extend(std::iter::repeat(String::new()).take(12));
                row.push(escape(&e.to_string()));
            }
        }
        writeln!(writer, "{}", row.join(","))?;
    }

    Ok(())
}

fn report_columns(report: &AnalysisReport) -> Vec<String> {
    let mut cols = vec![
        report.media().kind().to_string(),
        format!("{:.1}", report.max_confidence()),
    ];

    for method in METHOD_COLUMNS {
        match report.detection(method) {
            Some(d) => {
                cols.push(d.detected.to_string());
                cols.push(format!("{:.1}", d.confidence));
            }
            None => {
                cols.push(String::new());
                cols.push(String::new());
            }
        }
    }

    let extraction = report.extraction(Method::LsbExtraction);
    cols.push(extraction.map(|e| e.extracted.to_string()).unwrap_or_default());
    cols.push(escape(extraction.and_then(|e| e.text()).unwrap_or("")));
    cols
}

/// Quote a field when it contains a separator, quote or line break
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
