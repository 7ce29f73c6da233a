//! JSON report: summary plus every report in full

use serde::Serialize;
use std::io::{self, Write};

use super::{Status, Summary};
use crate::analyzer::{AnalysisReport, ReportBatch};

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    summary: Summary,
    files: Vec<JsonEntry<'a>>,
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    file: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a AnalysisReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn write<W: Write>(writer: &mut W, batch: &ReportBatch) -> io::Result<()> {
    let files = batch
        .iter()
        .map(|entry| JsonEntry {
            file: &entry.label,
            status: match Status::of(entry) {
                Status::Clean => "clean",
                Status::Flagged => "flagged",
                Status::Failed => "error",
            },
            report: entry.report(),
            error: entry.error().map(|e| e.to_string()),
        })
        .collect();

    let doc = JsonReport {
        generated_at: chrono::Local::now().to_rfc3339(),
        summary: Summary::from_batch(batch),
        files,
    };

    serde_json::to_writer_pretty(&mut *writer, &doc)?;
    writeln!(writer)
}
