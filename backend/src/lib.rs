//! # caserecon - State vs CDC case reconciliation
//!
//! Compares a state-side case export with the CDC's copy of the same cases
//! and reports every discrepancy, along with per-event-code statistics.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐
//! │  State CSV  │────▶│ SourceLoader │──┐
//! └─────────────┘     └──────────────┘  │    ┌─────────────────┐     ┌──────────────┐
//!                                       ├───▶│ Reconciliation  │────▶│ results.csv  │
//! ┌─────────────┐     ┌──────────────┐  │    │     Engine      │     │ stats.csv    │
//! │   CDC CSV   │────▶│ Reference    │──┘    └─────────────────┘     └──────────────┘
//! └─────────────┘     │ Loader       │
//!                     └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use caserecon::{reconcile_files, write_report_dir, ReconcileOptions};
//! use std::path::Path;
//!
//! let report = reconcile_files(Path::new("state.csv"), Path::new("cdc.csv"), ReconcileOptions::default())?;
//! write_report_dir(Path::new("report"), &report.reconciliation)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (CaseRecord, DiscrepancyResult, EventStatistic)
//! - [`parser`] - CSV parsing with auto-detection
//! - [`reconcile`] - Loaders, engine and pipeline
//! - [`report`] - results.csv / stats.csv output
//! - [`config`] - Defaults and environment overrides
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Reconciliation
pub mod reconcile;

// Output
pub mod report;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{InputError, PipelineError, ReconcileError, ServerError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CaseOutcome, CaseRecord, DiscrepancyResult, EventStatistic, RawTable, ReasonCode,
    ReconciliationSummary, Side,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_csv,
    parse_csv_file_auto, parse_str, table_to_json, CsvError, ParseResult,
};

// =============================================================================
// Re-exports - Reconciliation
// =============================================================================

pub use reconcile::{
    reconcile_bytes, reconcile_files, reconcile_tables, CsvInfo, EventCodeFilter,
    EventStatistics, NormalizedRecordSet, ReconcileOptions, Reconciliation,
    ReconciliationEngine, ReferenceLoad, ReferenceLoader, ReportResult, SourceLoader,
};

// =============================================================================
// Re-exports - Reports
// =============================================================================

pub use report::{write_report_dir, write_results, write_statistics, ReportFiles};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, ReportQuery, ReportResponse};
pub use config::ServerConfig;

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
