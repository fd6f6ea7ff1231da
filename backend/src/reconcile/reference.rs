//! CDC-side ingestion.
//!
//! Unlike the source side, a repeated CaseID is never merged: every extra
//! occurrence is reported as a [`ReasonCode::DuplicateInReference`] result
//! and only the first row is kept.

use std::collections::HashSet;

use super::columns::{line_of, ColumnMap};
use super::record_set::{allowed, EventCodeFilter, NormalizedRecordSet};
use crate::error::InputResult;
use crate::models::{DiscrepancyResult, RawTable, ReasonCode, Side};

/// Output of [`ReferenceLoader::load`].
#[derive(Debug, Clone, Default)]
pub struct ReferenceLoad {
    /// First-seen row per CaseID.
    pub records: NormalizedRecordSet,
    /// One result per extra occurrence, in file order.
    pub duplicates: Vec<DiscrepancyResult>,
    /// (EventCode, EventName) in order of first observation.
    pub observed_events: Vec<(String, String)>,
}

impl ReferenceLoad {
    /// Event codes present in the reference data, usable as the source
    /// side's allow-list.
    pub fn event_codes(&self) -> EventCodeFilter {
        EventCodeFilter::new(self.observed_events.iter().map(|(code, _)| code.clone()))
    }
}

/// Loads the reference-side table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceLoader<'a> {
    allowed_event_codes: Option<&'a EventCodeFilter>,
}

impl<'a> ReferenceLoader<'a> {
    pub fn new(allowed_event_codes: Option<&'a EventCodeFilter>) -> Self {
        Self { allowed_event_codes }
    }

    pub fn load(&self, table: &RawTable) -> InputResult<ReferenceLoad> {
        let columns = ColumnMap::resolve(Side::Reference, table)?;
        let mut load = ReferenceLoad {
            records: NormalizedRecordSet::new(columns.attribute_names()),
            ..Default::default()
        };

        let mut seen_events = HashSet::new();

        for (i, row) in table.rows.iter().enumerate() {
            let line = line_of(i);

            let event_code = columns.event_code(row, line)?;
            if !allowed(self.allowed_event_codes, event_code) {
                continue;
            }

            let record = columns.read(row, line)?;
            if seen_events.insert(record.event_code.clone()) {
                load.observed_events
                    .push((record.event_code.clone(), record.event_name.clone()));
            }

            if load.records.contains(&record.case_id) {
                load.duplicates.push(DiscrepancyResult::new(
                    &record,
                    ReasonCode::DuplicateInReference,
                ));
            } else {
                load.records.insert(record);
            }
        }

        Ok(load)
    }
}
