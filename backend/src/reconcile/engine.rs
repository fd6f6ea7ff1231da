//! Matching and classification of the two normalized sides.
//!
//! # Algorithm
//!
//! ```text
//! reference duplicates ──────────────────────────────▶ DuplicateInReference (1)
//!
//! for case in source (insertion order):
//!     not in reference ──────────────────────────────▶ MissingFromReference (2)
//!     first differing attribute (empty == "NULL") ───▶ AttributeMismatch (3)
//!     mark visited
//!
//! for case in reference (insertion order), not visited ▶ MissingFromSource (4)
//! ```
//!
//! The engine performs no I/O and never mutates its inputs; every call owns
//! a fresh visited set and statistics table.

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

use super::reference::ReferenceLoad;
use super::record_set::NormalizedRecordSet;
use super::stats::{EventStatistics, StatsAccumulator};
use crate::error::{ReconcileError, ReconcileResult};
use crate::models::{
    normalize_value, CaseOutcome, CaseRecord, DiscrepancyResult, ReasonCode,
    ReconciliationSummary,
};

/// Output of one reconciliation run.
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    /// Discrepancies in discovery order.
    pub results: Vec<DiscrepancyResult>,
    /// Per-event-code counters in creation order.
    pub statistics: EventStatistics,
    /// Number of cases per terminal classification.
    pub summary: ReconciliationSummary,
}

/// Stateless entry point; all run state lives inside [`Self::reconcile`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconciliationEngine;

impl ReconciliationEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn reconcile(
        &self,
        source: &NormalizedRecordSet,
        reference: &ReferenceLoad,
    ) -> ReconcileResult<Reconciliation> {
        check_schemas(source, &reference.records)?;

        let mut run = Run::default();

        for (event_code, event_name) in &reference.observed_events {
            run.stats.observe(event_code, event_name);
        }
        for duplicate in &reference.duplicates {
            run.stats.duplicate(&duplicate.event_code, &duplicate.event_name);
            run.push(duplicate.clone());
        }

        let mut visited: HashSet<&str> = HashSet::with_capacity(source.len());

        for record in source.iter() {
            run.stats
                .count_case(&record.event_code, &record.event_name, &record.case_id);

            match reference.records.get(&record.case_id) {
                None => {
                    run.stats
                        .missing_from_reference(&record.event_code, &record.event_name);
                    run.flag(record, ReasonCode::MissingFromReference);
                }
                Some(other) => {
                    if first_difference(record, other).is_some() {
                        run.stats
                            .wrong_attributes(&record.event_code, &record.event_name);
                        run.flag(record, ReasonCode::AttributeMismatch);
                    } else {
                        run.summary.record(CaseOutcome::MatchedIdentical);
                    }
                    visited.insert(record.case_id.as_str());
                }
            }
        }

        for record in reference.records.iter() {
            if visited.contains(record.case_id.as_str()) {
                continue;
            }
            if run
                .stats
                .count_case(&record.event_code, &record.event_name, &record.case_id)
            {
                run.stats
                    .missing_from_source(&record.event_code, &record.event_name);
            }
            run.flag(record, ReasonCode::MissingFromSource);
        }

        Ok(Reconciliation {
            results: run.results,
            statistics: run.stats.finish(),
            summary: run.summary,
        })
    }
}

#[derive(Default)]
struct Run {
    results: Vec<DiscrepancyResult>,
    stats: StatsAccumulator,
    summary: ReconciliationSummary,
}

impl Run {
    fn flag(&mut self, record: &CaseRecord, reason_code: ReasonCode) {
        self.push(DiscrepancyResult::new(record, reason_code));
    }

    /// Record a result and its terminal outcome.
    fn push(&mut self, result: DiscrepancyResult) {
        let outcome = match result.reason_code {
            ReasonCode::DuplicateInReference => CaseOutcome::DuplicateInReference,
            ReasonCode::MissingFromReference => CaseOutcome::MissingFromReference,
            ReasonCode::AttributeMismatch => CaseOutcome::MatchedDifferent,
            ReasonCode::MissingFromSource => CaseOutcome::MissingFromSource,
        };
        self.summary.record(outcome);
        self.results.push(result);
    }
}

/// Both sides must expose the same comparable attribute names.
fn check_schemas(
    source: &NormalizedRecordSet,
    reference: &NormalizedRecordSet,
) -> ReconcileResult<()> {
    let ours: BTreeSet<&String> = source.attributes().iter().collect();
    let theirs: BTreeSet<&String> = reference.attributes().iter().collect();

    if ours == theirs {
        return Ok(());
    }

    Err(ReconcileError::SchemaMismatch {
        source_only: ours.difference(&theirs).map(|s| s.to_string()).collect(),
        reference_only: theirs.difference(&ours).map(|s| s.to_string()).collect(),
    })
}

/// Name of the first attribute, in the source record's order, whose
/// normalized value differs on the reference side.
pub fn first_difference<'a>(source: &'a CaseRecord, reference: &CaseRecord) -> Option<&'a str> {
    source
        .attributes
        .iter()
        .find(|(name, value)| {
            let theirs = reference.attribute(name).unwrap_or("");
            normalize_value(value) != normalize_value(theirs)
        })
        .map(|(name, _)| name.as_str())
}
