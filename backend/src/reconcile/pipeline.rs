//! High-level pipeline API for reconciling two CSV exports.
//!
//! Combines parsing, loading, filtering and reconciliation, logging progress
//! through the shared log broadcaster.
//!
//! # Example
//!
//! ```rust,ignore
//! use caserecon::{reconcile_files, ReconcileOptions};
//! use std::path::Path;
//!
//! let report = reconcile_files(
//!     Path::new("state.csv"),
//!     Path::new("cdc.csv"),
//!     ReconcileOptions::default(),
//! )?;
//! println!("{} discrepancies", report.reconciliation.results.len());
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::engine::{Reconciliation, ReconciliationEngine};
use super::record_set::EventCodeFilter;
use super::reference::ReferenceLoader;
use super::source::SourceLoader;
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::PipelineError;
use crate::models::RawTable;
use crate::parser::{parse_bytes_auto, parse_csv_file_auto, ParseResult};

/// Options for one reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOptions {
    /// Explicit event code allow-list, applied to both sides
    pub event_codes: Option<EventCodeFilter>,

    /// Restrict the source side to event codes present in the reference data
    pub filter_by_reference: bool,
}

/// CSV file information
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

impl From<&ParseResult> for CsvInfo {
    fn from(parsed: &ParseResult) -> Self {
        Self {
            encoding: parsed.encoding.clone(),
            delimiter: parsed.delimiter,
            headers: parsed.table.headers.clone(),
            row_count: parsed.table.rows.len(),
        }
    }
}

/// Result of a complete pipeline run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResult {
    pub reconciliation: Reconciliation,
    pub source_info: CsvInfo,
    pub reference_info: CsvInfo,
}

/// Reconcile a state CSV file against a CDC CSV file.
pub fn reconcile_files(
    source: &Path,
    reference: &Path,
    options: ReconcileOptions,
) -> Result<ReportResult, PipelineError> {
    log_info(format!("📖 Reading source file {}", source.display()));
    let source = parse_csv_file_auto(source)?;
    log_info(format!("📖 Reading reference file {}", reference.display()));
    let reference = parse_csv_file_auto(reference)?;

    run_parsed(source, reference, &options)
}

/// Same as [`reconcile_files`] for uploaded bytes.
pub fn reconcile_bytes(
    source: &[u8],
    reference: &[u8],
    options: ReconcileOptions,
) -> Result<ReportResult, PipelineError> {
    let source = parse_bytes_auto(source)?;
    let reference = parse_bytes_auto(reference)?;

    run_parsed(source, reference, &options)
}

/// Reconcile two already materialized tables.
pub fn reconcile_tables(
    source: &RawTable,
    reference: &RawTable,
    options: &ReconcileOptions,
) -> Result<Reconciliation, PipelineError> {
    let explicit = options.event_codes.as_ref();
    if let Some(filter) = explicit {
        log_info(format!("Restricting both sides to {} event code(s)", filter.len()));
    }

    // The reference side is loaded first: it may provide the source allow-list.
    let reference = ReferenceLoader::new(explicit).load(reference)?;
    log_success(format!(
        "Reference: {} case(s), {} duplicate row(s), {} event code(s)",
        reference.records.len(),
        reference.duplicates.len(),
        reference.observed_events.len()
    ));

    let reference_codes;
    let source_filter = if options.filter_by_reference {
        log_info("Filtering source by reference event codes");
        reference_codes = reference.event_codes();
        Some(&reference_codes)
    } else {
        explicit
    };

    let source = SourceLoader::new(source_filter).load(source)?;
    log_success(format!("Source: {} case(s) after filtering and dedup", source.len()));

    log_info("⚖️  Comparing...");
    let reconciliation = ReconciliationEngine::new().reconcile(&source, &reference)?;
    print_summary(&reconciliation);

    Ok(reconciliation)
}

fn run_parsed(
    source: ParseResult,
    reference: ParseResult,
    options: &ReconcileOptions,
) -> Result<ReportResult, PipelineError> {
    let source_info = CsvInfo::from(&source);
    let reference_info = CsvInfo::from(&reference);
    print_csv_info("Source", &source_info);
    print_csv_info("Reference", &reference_info);

    if source.table.is_empty() {
        log_warning("Source file has no rows");
    }
    if reference.table.is_empty() {
        log_warning("Reference file has no rows");
    }

    let reconciliation = reconcile_tables(&source.table, &reference.table, options)?;

    Ok(ReportResult {
        reconciliation,
        source_info,
        reference_info,
    })
}

fn print_csv_info(label: &str, info: &CsvInfo) {
    log_success(format!(
        "{}: {} rows, {} columns (encoding {}, delimiter '{}')",
        label,
        info.row_count,
        info.headers.len(),
        info.encoding,
        format_delimiter(info.delimiter)
    ));
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn print_summary(reconciliation: &Reconciliation) {
    let summary = &reconciliation.summary;
    if summary.discrepancies() == 0 {
        log_success(format!("All {} case(s) match", summary.matched_identical));
        return;
    }

    log_warning(format!("{} discrepancies found", summary.discrepancies()));
    log_info_indent(format!("Matched:                {}", summary.matched_identical), 1);
    log_info_indent(format!("Different attributes:   {}", summary.matched_different), 1);
    log_info_indent(format!("Missing from reference: {}", summary.missing_from_reference), 1);
    log_info_indent(format!("Missing from source:    {}", summary.missing_from_source), 1);
    log_info_indent(format!("Duplicate in reference: {}", summary.duplicate_in_reference), 1);
}
