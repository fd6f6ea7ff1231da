//! Error types for the reconciliation pipeline.
//!
//! - [`InputError`] - A table cannot be turned into case records
//! - [`ReconcileError`] - The two sides cannot be compared
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! CSV parsing errors live next to the parser ([`crate::parser::CsvError`])
//! since they carry line and column context. Conversion is automatic via
//! `From` implementations, allowing `?` to work across error boundaries.

use thiserror::Error;

use crate::models::Side;
use crate::parser::CsvError;

// =============================================================================
// Input Errors
// =============================================================================

/// Errors while loading one side into a normalized record set.
///
/// Any of these aborts the run before results are produced.
#[derive(Debug, Error)]
pub enum InputError {
    /// A required column is absent from the header.
    #[error("{side} data: missing required column '{column}'")]
    MissingColumn { side: Side, column: String },

    /// A row is shorter than the header.
    #[error("{side} data, line {line}: missing value for column '{column}'")]
    MissingField { side: Side, line: usize, column: String },

    /// An `AddTime` value does not match `YYYY-MM-DD HH:MM:SS.ffffff`.
    #[error("{side} data: cannot parse AddTime '{value}' for case '{case_id}'")]
    Timestamp { side: Side, case_id: String, value: String },
}

// =============================================================================
// Reconciliation Errors
// =============================================================================

/// Errors raised by the engine before any comparison happens.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The two sides disagree on comparable attribute names.
    #[error(
        "attribute schemas differ: only in source {source_only:?}, only in reference {reference_only:?}"
    )]
    SchemaMismatch {
        source_only: Vec<String>,
        reference_only: Vec<String>,
    },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::reconcile::pipeline`]
/// functions. It wraps all lower-level errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Input validation error.
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// Reconciliation error.
    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// Report writing error.
    #[error("Report error: {0}")]
    Report(#[from] csv::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for loader operations.
pub type InputResult<T> = Result<T, InputError>;

/// Result type for engine operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // InputError -> PipelineError
        let input_err = InputError::MissingColumn {
            side: Side::Reference,
            column: "CaseID".into(),
        };
        let pipeline_err: PipelineError = input_err.into();
        let msg = pipeline_err.to_string();
        assert!(msg.contains("reference"));
        assert!(msg.contains("CaseID"));

        // PipelineError -> ServerError
        let server_err: ServerError = pipeline_err.into();
        assert!(server_err.to_string().contains("CaseID"));
    }

    #[test]
    fn test_timestamp_error_names_case_and_value() {
        let err = InputError::Timestamp {
            side: Side::Source,
            case_id: "C5".into(),
            value: "yesterday".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("C5"));
        assert!(msg.contains("yesterday"));
    }

    #[test]
    fn test_schema_mismatch_format() {
        let err = ReconcileError::SchemaMismatch {
            source_only: vec!["Age".into()],
            reference_only: vec![],
        };
        assert!(err.to_string().contains("Age"));
    }
}
