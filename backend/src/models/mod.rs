//! Domain models for the case reconciliation pipeline.
//!
//! This module contains the core data structures shared by the loaders,
//! the engine and the outer layers:
//!
//! - [`RawTable`] - Headers plus string rows, as read from a CSV or a query
//! - [`CaseRecord`] - One validated case from either side
//! - [`DiscrepancyResult`] - One flagged case with its [`ReasonCode`]
//! - [`EventStatistic`] - Per-event-code counters
//! - [`CaseOutcome`] - Terminal classification of a single case

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

// =============================================================================
// Column names
// =============================================================================

pub const CASE_ID: &str = "CaseID";
pub const EVENT_CODE: &str = "EventCode";
pub const EVENT_NAME: &str = "EventName";
pub const MMWR_YEAR: &str = "MMWRYear";
pub const MMWR_WEEK: &str = "MMWRWeek";
pub const ADD_TIME: &str = "AddTime";
pub const CASE_CLASS_STATUS: &str = "CaseClassStatus";

/// Columns that identify or classify a case and are never compared.
///
/// `AddTime` and `CaseClassStatus` only exist on the source side.
pub const NON_COMPARABLE_COLUMNS: [&str; 5] =
    [CASE_ID, EVENT_CODE, EVENT_NAME, ADD_TIME, CASE_CLASS_STATUS];

/// Value substituted for empty attributes before comparison.
pub const NULL_SENTINEL: &str = "NULL";

/// Returns true if the column takes part in attribute comparison.
pub fn is_comparable(column: &str) -> bool {
    !NON_COMPARABLE_COLUMNS.contains(&column)
}

// =============================================================================
// Sides
// =============================================================================

/// Which dataset a table or record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Local (state) authority data.
    Source,
    /// Central (CDC) authority export.
    Reference,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => write!(f, "source"),
            Side::Reference => write!(f, "reference"),
        }
    }
}

// =============================================================================
// Raw input
// =============================================================================

/// Tabular input before validation.
///
/// Rows are positional: `rows[i][j]` is the value of `headers[j]`. A row may
/// be shorter than the header list; loaders report that as a missing field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new<S: AsRef<str>>(headers: &[S]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, builder style.
    pub fn with_row<S: AsRef<str>>(mut self, values: &[S]) -> Self {
        self.push_row(values);
        self
    }

    pub fn push_row<S: AsRef<str>>(&mut self, values: &[S]) {
        self.rows
            .push(values.iter().map(|v| v.as_ref().to_string()).collect());
    }

    /// Position of a column in the header list.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// =============================================================================
// Case Record
// =============================================================================

/// One validated case row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub case_id: String,
    pub event_code: String,
    pub event_name: String,
    pub mmwr_year: String,
    pub mmwr_week: String,
    /// Source side only. Raw value; parsed lazily when deduplicating.
    pub add_time: Option<String>,
    /// Source side only. Carried through, never compared.
    pub case_class_status: Option<String>,
    /// Comparable attributes in declared column order.
    pub attributes: Vec<(String, String)>,
}

impl CaseRecord {
    /// Value of a comparable attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Map empty values to [`NULL_SENTINEL`].
pub fn normalize_value(value: &str) -> &str {
    if value.is_empty() {
        NULL_SENTINEL
    } else {
        value
    }
}

// =============================================================================
// Reasons
// =============================================================================

/// Closed taxonomy of discrepancies. Serialized as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReasonCode {
    /// (1) CaseID appears more than once in the reference data.
    DuplicateInReference,
    /// (2) CaseID only exists on the source side.
    MissingFromReference,
    /// (3) CaseID exists on both sides with different attributes.
    AttributeMismatch,
    /// (4) CaseID only exists on the reference side.
    MissingFromSource,
}

impl ReasonCode {
    pub fn code(self) -> u8 {
        match self {
            ReasonCode::DuplicateInReference => 1,
            ReasonCode::MissingFromReference => 2,
            ReasonCode::AttributeMismatch => 3,
            ReasonCode::MissingFromSource => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ReasonCode::DuplicateInReference),
            2 => Some(ReasonCode::MissingFromReference),
            3 => Some(ReasonCode::AttributeMismatch),
            4 => Some(ReasonCode::MissingFromSource),
            _ => None,
        }
    }

    /// Human readable reason written next to the code.
    pub fn reason(self) -> &'static str {
        match self {
            ReasonCode::DuplicateInReference => "Duplicate Case ID found in reference file",
            ReasonCode::MissingFromReference => "Case ID not found in reference file",
            ReasonCode::AttributeMismatch => {
                "Case has different attributes between source and reference"
            }
            ReasonCode::MissingFromSource => "Case ID not found in source file",
        }
    }
}

impl Serialize for ReasonCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for ReasonCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        ReasonCode::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown reason code {}", code)))
    }
}

// =============================================================================
// Results
// =============================================================================

/// One row of the discrepancy report.
///
/// Field names follow the historical `results.csv` layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscrepancyResult {
    #[serde(rename = "CaseID")]
    pub case_id: String,
    #[serde(rename = "EventCode")]
    pub event_code: String,
    #[serde(rename = "EventName")]
    pub event_name: String,
    #[serde(rename = "MMWRYear")]
    pub mmwr_year: String,
    #[serde(rename = "MMWRWeek")]
    pub mmwr_week: String,
    #[serde(rename = "Reason")]
    pub reason: String,
    #[serde(rename = "ReasonID")]
    pub reason_code: ReasonCode,
}

impl DiscrepancyResult {
    pub fn new(record: &CaseRecord, reason_code: ReasonCode) -> Self {
        Self {
            case_id: record.case_id.clone(),
            event_code: record.event_code.clone(),
            event_name: record.event_name.clone(),
            mmwr_year: record.mmwr_year.clone(),
            mmwr_week: record.mmwr_week.clone(),
            reason: reason_code.reason().to_string(),
            reason_code,
        }
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Aggregate counters for one event code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStatistic {
    #[serde(rename = "EventCode")]
    pub event_code: String,
    #[serde(rename = "EventName")]
    pub event_name: String,
    #[serde(rename = "TotalCases")]
    pub total_cases: u64,
    #[serde(rename = "TotalDuplicates")]
    pub total_duplicates: u64,
    #[serde(rename = "TotalMissingFromReference")]
    pub total_missing_from_reference: u64,
    #[serde(rename = "TotalMissingFromSource")]
    pub total_missing_from_source: u64,
    #[serde(rename = "TotalWrongAttributes")]
    pub total_wrong_attributes: u64,
}

impl EventStatistic {
    pub fn new(event_code: impl Into<String>, event_name: impl Into<String>) -> Self {
        Self {
            event_code: event_code.into(),
            event_name: event_name.into(),
            ..Default::default()
        }
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Terminal classification reached by a case during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseOutcome {
    MatchedIdentical,
    MatchedDifferent,
    MissingFromReference,
    MissingFromSource,
    DuplicateInReference,
}

/// Number of cases per terminal classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationSummary {
    pub matched_identical: usize,
    pub matched_different: usize,
    pub missing_from_reference: usize,
    pub missing_from_source: usize,
    pub duplicate_in_reference: usize,
}

impl ReconciliationSummary {
    pub fn record(&mut self, outcome: CaseOutcome) {
        match outcome {
            CaseOutcome::MatchedIdentical => self.matched_identical += 1,
            CaseOutcome::MatchedDifferent => self.matched_different += 1,
            CaseOutcome::MissingFromReference => self.missing_from_reference += 1,
            CaseOutcome::MissingFromSource => self.missing_from_source += 1,
            CaseOutcome::DuplicateInReference => self.duplicate_in_reference += 1,
        }
    }

    /// Total number of terminal classifications.
    pub fn total(&self) -> usize {
        self.matched_identical
            + self.matched_different
            + self.missing_from_reference
            + self.missing_from_source
            + self.duplicate_in_reference
    }

    /// Number of classifications that produce a result row.
    pub fn discrepancies(&self) -> usize {
        self.total() - self.matched_identical
    }
}
