//! Per-side record sets and the event code allow-list.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::models::CaseRecord;

// =============================================================================
// NormalizedRecordSet
// =============================================================================

/// CaseID → the single authoritative record from one side.
///
/// Iteration follows first-insertion order. Replacing a record keeps the
/// position of the CaseID's first appearance.
#[derive(Debug, Clone, Default)]
pub struct NormalizedRecordSet {
    attributes: Vec<String>,
    records: Vec<CaseRecord>,
    index: HashMap<String, usize>,
}

impl NormalizedRecordSet {
    /// Empty set whose records share the given comparable attributes.
    pub fn new(attributes: Vec<String>) -> Self {
        Self {
            attributes,
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Comparable attribute names in declared order.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn get(&self, case_id: &str) -> Option<&CaseRecord> {
        self.index.get(case_id).map(|&i| &self.records[i])
    }

    pub fn contains(&self, case_id: &str) -> bool {
        self.index.contains_key(case_id)
    }

    /// Insert a record for a new CaseID. Returns false, leaving the set
    /// untouched, if the CaseID is already present.
    pub fn insert(&mut self, record: CaseRecord) -> bool {
        if self.index.contains_key(&record.case_id) {
            return false;
        }
        self.index.insert(record.case_id.clone(), self.records.len());
        self.records.push(record);
        true
    }

    /// Replace the record stored for `record.case_id`, or insert it if absent.
    pub fn replace(&mut self, record: CaseRecord) {
        match self.index.get(&record.case_id) {
            Some(&i) => self.records[i] = record,
            None => {
                self.insert(record);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CaseRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// =============================================================================
// EventCodeFilter
// =============================================================================

/// Allow-list of event codes applied identically by both loaders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCodeFilter {
    codes: HashSet<String>,
}

impl EventCodeFilter {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a comma separated list such as `"10110, 10120"`.
    pub fn parse_list(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty()),
        )
    }

    pub fn allows(&self, event_code: &str) -> bool {
        self.codes.contains(event_code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Returns true if the row passes the optional allow-list.
pub(crate) fn allowed(filter: Option<&EventCodeFilter>, event_code: &str) -> bool {
    filter.map_or(true, |f| f.allows(event_code))
}
