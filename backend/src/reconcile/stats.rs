//! Per-event-code statistics.

use serde::{Serialize, Serializer};
use std::collections::{HashMap, HashSet};

use crate::models::EventStatistic;

/// Statistics table of one run, iterated in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventStatistics {
    entries: Vec<EventStatistic>,
    index: HashMap<String, usize>,
}

impl EventStatistics {
    pub fn get(&self, event_code: &str) -> Option<&EventStatistic> {
        self.index.get(event_code).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventStatistic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<EventStatistic> {
        self.entries
    }

    fn entry(&mut self, event_code: &str, event_name: &str) -> &mut EventStatistic {
        let i = match self.index.get(event_code) {
            Some(&i) => i,
            None => {
                self.entries.push(EventStatistic::new(event_code, event_name));
                self.index.insert(event_code.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[i]
    }
}

impl Serialize for EventStatistics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

/// Running counters for one reconciliation run.
///
/// Entries are created lazily with the first EventName observed for their
/// code. CaseIDs are tracked per event code so a repeated CaseID counts as a
/// duplicate rather than a new case.
#[derive(Debug, Default)]
pub(crate) struct StatsAccumulator {
    stats: EventStatistics,
    seen: HashMap<String, HashSet<String>>,
}

impl StatsAccumulator {
    /// Make sure an entry exists for `event_code`.
    pub(crate) fn observe(&mut self, event_code: &str, event_name: &str) {
        self.stats.entry(event_code, event_name);
    }

    /// Count a case under its event code. Returns true if the CaseID is new
    /// for that code (`TotalCases` incremented), false if it repeats
    /// (`TotalDuplicates` incremented).
    pub(crate) fn count_case(&mut self, event_code: &str, event_name: &str, case_id: &str) -> bool {
        let is_new = self
            .seen
            .entry(event_code.to_string())
            .or_default()
            .insert(case_id.to_string());

        let entry = self.stats.entry(event_code, event_name);
        if is_new {
            entry.total_cases += 1;
        } else {
            entry.total_duplicates += 1;
        }
        is_new
    }

    pub(crate) fn duplicate(&mut self, event_code: &str, event_name: &str) {
        self.stats.entry(event_code, event_name).total_duplicates += 1;
    }

    pub(crate) fn missing_from_reference(&mut self, event_code: &str, event_name: &str) {
        self.stats.entry(event_code, event_name).total_missing_from_reference += 1;
    }

    pub(crate) fn missing_from_source(&mut self, event_code: &str, event_name: &str) {
        self.stats.entry(event_code, event_name).total_missing_from_source += 1;
    }

    pub(crate) fn wrong_attributes(&mut self, event_code: &str, event_name: &str) {
        self.stats.entry(event_code, event_name).total_wrong_attributes += 1;
    }

    pub(crate) fn finish(self) -> EventStatistics {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keep_creation_order_and_first_name() {
        let mut acc = StatsAccumulator::default();
        acc.observe("200", "Measles");
        acc.observe("100", "Flu");
        acc.observe("200", "Renamed");

        let stats = acc.finish();
        let codes: Vec<&str> = stats.iter().map(|s| s.event_code.as_str()).collect();
        assert_eq!(codes, vec!["200", "100"]);
        assert_eq!(stats.get("200").unwrap().event_name, "Measles");
        assert_eq!(stats.get("200").unwrap().total_cases, 0);
    }

    #[test]
    fn test_repeated_case_counts_as_duplicate() {
        let mut acc = StatsAccumulator::default();
        assert!(acc.count_case("100", "Flu", "C1"));
        assert!(!acc.count_case("100", "Flu", "C1"));
        assert!(acc.count_case("200", "Measles", "C1"));

        let stats = acc.finish();
        assert_eq!(stats.get("100").unwrap().total_cases, 1);
        assert_eq!(stats.get("100").unwrap().total_duplicates, 1);
        assert_eq!(stats.get("200").unwrap().total_cases, 1);
    }

    #[test]
    fn test_serializes_as_list() {
        let mut acc = StatsAccumulator::default();
        acc.wrong_attributes("100", "Flu");

        let json = serde_json::to_value(acc.finish()).unwrap();
        assert_eq!(json[0]["EventCode"], "100");
        assert_eq!(json[0]["TotalWrongAttributes"], 1);
    }
}
