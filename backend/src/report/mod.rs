//! Report files.
//!
//! A report folder holds two CSV files:
//!
//! | File          | One row per               |
//! |---------------|---------------------------|
//! | `results.csv` | flagged case              |
//! | `stats.csv`   | event code                |
//!
//! Headers are always written, even when there are no rows.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::models::DiscrepancyResult;
use crate::reconcile::{EventStatistics, Reconciliation};

pub const RESULTS_FILE: &str = "results.csv";
pub const STATS_FILE: &str = "stats.csv";

pub const RESULT_COLUMNS: [&str; 7] = [
    "CaseID",
    "EventCode",
    "EventName",
    "MMWRYear",
    "MMWRWeek",
    "Reason",
    "ReasonID",
];

pub const STATS_COLUMNS: [&str; 7] = [
    "EventCode",
    "EventName",
    "TotalCases",
    "TotalDuplicates",
    "TotalMissingFromReference",
    "TotalMissingFromSource",
    "TotalWrongAttributes",
];

/// Paths of a written report.
#[derive(Debug, Clone)]
pub struct ReportFiles {
    pub results: PathBuf,
    pub stats: PathBuf,
}

/// Write discrepancy rows as CSV.
pub fn write_results<W: Write>(writer: W, results: &[DiscrepancyResult]) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(RESULT_COLUMNS)?;
    for result in results {
        wtr.serialize(result)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write statistics rows as CSV.
pub fn write_statistics<W: Write>(writer: W, stats: &EventStatistics) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(STATS_COLUMNS)?;
    for stat in stats.iter() {
        wtr.serialize(stat)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `results.csv` and `stats.csv` into `dir`, creating it if needed.
pub fn write_report_dir(dir: &Path, reconciliation: &Reconciliation) -> Result<ReportFiles, PipelineError> {
    fs::create_dir_all(dir)?;

    let files = ReportFiles {
        results: dir.join(RESULTS_FILE),
        stats: dir.join(STATS_FILE),
    };

    write_results(fs::File::create(&files.results)?, &reconciliation.results)?;
    write_statistics(fs::File::create(&files.stats)?, &reconciliation.statistics)?;

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawTable;
    use crate::reconcile::{reconcile_tables, ReconcileOptions};

    fn reconciliation() -> Reconciliation {
        let source = RawTable::new(&["CaseID", "EventCode", "EventName", "MMWRYear", "MMWRWeek", "AddTime"])
            .with_row(&["C1", "100", "Flu, seasonal", "2023", "5", "2023-01-01 00:00:00.000000"]);
        let reference = RawTable::new(&["CaseID", "EventCode", "EventName", "MMWRYear", "MMWRWeek"])
            .with_row(&["C3", "100", "Flu, seasonal", "2023", "6"]);

        reconcile_tables(&source, &reference, &ReconcileOptions::default()).unwrap()
    }

    #[test]
    fn test_results_csv() {
        let mut buf = Vec::new();
        write_results(&mut buf, &reconciliation().results).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "CaseID,EventCode,EventName,MMWRYear,MMWRWeek,Reason,ReasonID");
        assert_eq!(
            lines[1],
            "C1,100,\"Flu, seasonal\",2023,5,Case ID not found in reference file,2"
        );
        assert_eq!(
            lines[2],
            "C3,100,\"Flu, seasonal\",2023,6,Case ID not found in source file,4"
        );
    }

    #[test]
    fn test_stats_csv() {
        let mut buf = Vec::new();
        write_statistics(&mut buf, &reconciliation().statistics).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], STATS_COLUMNS.join(","));
        assert_eq!(lines[1], "100,\"Flu, seasonal\",2,0,1,1,0");
    }

    #[test]
    fn test_empty_results_still_have_header() {
        let mut buf = Vec::new();
        write_results(&mut buf, &[]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_write_report_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("report-2023");

        let files = write_report_dir(&dir, &reconciliation()).unwrap();

        assert!(files.results.ends_with("results.csv"));
        let stats = fs::read_to_string(&files.stats).unwrap();
        assert!(stats.starts_with("EventCode,EventName,TotalCases"));
        let results = fs::read_to_string(&files.results).unwrap();
        assert_eq!(results.lines().count(), 3);
    }
}
