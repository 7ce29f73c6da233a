//! Report generation for batches of analysis results
//!
//! - **JSON**: every report in full, for programmatic consumption
//! - **CSV**: one row per file, for spreadsheets and bulk triage
//!
//! # Usage
//!
//! ```ignore
//! use stegsift::report;
//!
//! // Picks the format from the extension
//! report::generate("report.json", &batch)?;  // JSON
//! report::generate("report.csv", &batch)?;   // CSV
//! ```

pub mod csv;
pub mod json;

use crate::analyzer::{BatchEntry, ReportBatch};
use std::io;
use std::path::Path;

/// Generate a report in the format implied by the file extension
pub fn generate<P: AsRef<Path>>(path: P, batch: &ReportBatch) -> io::Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut file = std::fs::File::create(path)?;

    match ext.as_str() {
        "json" => json::write(&mut file, batch),
        _ => csv::write(&mut file, batch),
    }
}

/// Per-file status shown in reports and on the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Clean,
    Flagged,
    Failed,
}

impl Status {
    pub fn of(entry: &BatchEntry) -> Self {
        match &entry.outcome {
            Ok(report) if report.any_detected() => Status::Flagged,
            Ok(_) => Status::Clean,
            Err(_) => Status::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Clean => "CLEAN",
            Status::Flagged => "FLAGGED",
            Status::Failed => "ERROR",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary statistics for a batch
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Summary {
    pub total: usize,
    pub clean: usize,
    pub flagged: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_batch(batch: &ReportBatch) -> Self {
        let mut summary = Self {
            total: batch.len(),
            ..Self::default()
        };

        for entry in batch.iter() {
            match Status::of(entry) {
                Status::Clean => summary.clean += 1,
                Status::Flagged => summary.flagged += 1,
                Status::Failed => summary.failed += 1,
            }
        }

        summary
    }

    /// Process exit code: 2 if anything was flagged, 1 if anything failed
    pub fn exit_code(&self) -> i32 {
        if self.flagged > 0 {
            2
        } else if self.failed > 0 {
            1
        } else {
            0
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // SUMMARY STATISTICS TESTS
    // ==========================================================================
    //
    // The Summary struct counts clean / flagged / failed files in a batch.
    // It drives the console summary and the process exit code.
    // ==========================================================================

    #[test]
    fn test_summary_empty() {
        let summary = Summary::from_batch(&ReportBatch::new());
        assert_eq!(summary, Summary::default());
        assert_eq!(summary.exit_code(), 0);
    }

    #[test]
    fn test_summary_mixed() {
        let summary = Summary::from_batch(&fixtures::batch());

        assert_eq!(summary.total, 3);
        assert_eq!(summary.clean, 1);
        assert_eq!(summary.flagged, 1);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn test_exit_code_priority() {
        // Flagged wins over failed
        assert_eq!(Summary { total: 2, clean: 0, flagged: 1, failed: 1 }.exit_code(), 2);
        assert_eq!(Summary { total: 2, clean: 1, flagged: 0, failed: 1 }.exit_code(), 1);
        assert_eq!(Summary { total: 1, clean: 1, flagged: 0, failed: 0 }.exit_code(), 0);
    }

    #[test]
    fn test_status_of_entries() {
        let batch = fixtures::batch();
        let statuses: Vec<Status> = batch.iter().map(Status::of).collect();
        assert_eq!(statuses, vec![Status::Clean, Status::Flagged, Status::Failed]);
    }

    #[test]
    fn test_generate_picks_format_by_extension() {
        let dir = std::env::temp_dir();
        let json_path = dir.join("stegsift_report_test.json");
        let csv_path = dir.join("stegsift_report_test.csv");

        generate(&json_path, &fixtures::batch()).unwrap();
        generate(&csv_path, &fixtures::batch()).unwrap();

        let json = std::fs::read_to_string(&json_path).unwrap();
        let csv = std::fs::read_to_string(&csv_path).unwrap();
        std::fs::remove_file(&json_path).ok();
        std::fs::remove_file(&csv_path).ok();

        assert!(json.trim_start().starts_with('{'));
        assert!(csv.starts_with("file,status,"));
    }
}
