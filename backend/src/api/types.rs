//! REST API types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::{DiscrepancyResult, EventStatistic, ReconciliationSummary};
use crate::reconcile::{CsvInfo, EventCodeFilter, ReconcileOptions, ReportResult};

/// Response sent after a report has been generated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    /// Unique report identifier
    pub report_id: String,

    /// Status: "clean" when nothing was flagged, "discrepancies" otherwise
    pub status: String,

    pub created_at: DateTime<Utc>,

    pub number_of_discrepancies: usize,

    pub summary: ReconciliationSummary,

    pub results: Vec<DiscrepancyResult>,

    pub statistics: Vec<EventStatistic>,

    pub source_info: CsvInfo,

    pub reference_info: CsvInfo,
}

impl From<ReportResult> for ReportResponse {
    fn from(report: ReportResult) -> Self {
        let reconciliation = report.reconciliation;
        let number_of_discrepancies = reconciliation.results.len();

        ReportResponse {
            report_id: Uuid::new_v4().to_string(),
            status: if number_of_discrepancies == 0 { "clean" } else { "discrepancies" }.to_string(),
            created_at: Utc::now(),
            number_of_discrepancies,
            summary: reconciliation.summary,
            results: reconciliation.results,
            statistics: reconciliation.statistics.into_vec(),
            source_info: report.source_info,
            reference_info: report.reference_info,
        }
    }
}

/// Query string of the report endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    /// Restrict the state side to event codes found in the CDC file
    #[serde(default)]
    pub filter_by_reference: bool,

    /// Comma separated event code allow-list
    pub event_codes: Option<String>,
}

impl From<ReportQuery> for ReconcileOptions {
    fn from(query: ReportQuery) -> Self {
        ReconcileOptions {
            event_codes: query.event_codes.as_deref().map(EventCodeFilter::parse_list),
            filter_by_reference: query.filter_by_reference,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "reportId": null,
        "status": "error",
        "error": error,
        "numberOfDiscrepancies": 0,
        "results": [],
        "statistics": []
    })
}
