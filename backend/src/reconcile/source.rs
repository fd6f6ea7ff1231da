//! State-side ingestion.
//!
//! Filters out rows that are not real cases, applies the optional event code
//! allow-list and keeps, per CaseID, the most recently added row.

use chrono::NaiveDateTime;

use super::columns::{line_of, ColumnMap};
use super::record_set::{allowed, EventCodeFilter, NormalizedRecordSet};
use crate::error::{InputError, InputResult};
use crate::models::{CaseRecord, RawTable, Side};

/// Format of the `AddTime` column, e.g. `2023-06-01 13:45:00.000000`.
pub const ADD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Loads the state-side table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceLoader<'a> {
    allowed_event_codes: Option<&'a EventCodeFilter>,
}

impl<'a> SourceLoader<'a> {
    pub fn new(allowed_event_codes: Option<&'a EventCodeFilter>) -> Self {
        Self { allowed_event_codes }
    }

    /// Build the normalized record set for the source side.
    ///
    /// Intra-source duplicates are resolved silently: the row with the later
    /// `AddTime` wins and keeps the position of the first occurrence. Equal
    /// timestamps keep the row seen first.
    pub fn load(&self, table: &RawTable) -> InputResult<NormalizedRecordSet> {
        let columns = ColumnMap::resolve(Side::Source, table)?;
        let mut set = NormalizedRecordSet::new(columns.attribute_names());

        for (i, row) in table.rows.iter().enumerate() {
            let line = line_of(i);

            let event_code = columns.event_code(row, line)?;
            if !is_case_event_code(event_code) || !allowed(self.allowed_event_codes, event_code) {
                continue;
            }

            let record = columns.read(row, line)?;
            let keep = match set.get(&record.case_id) {
                None => true,
                Some(existing) => added_at(&record)? > added_at(existing)?,
            };
            if keep {
                set.replace(record);
            }
        }

        Ok(set)
    }
}

/// Event codes of real cases are purely numeric; anything else is a mapping
/// marker or summary row from the state query.
pub fn is_case_event_code(event_code: &str) -> bool {
    !event_code.is_empty() && event_code.bytes().all(|b| b.is_ascii_digit())
}

/// Parse an `AddTime` value.
///
/// The fractional part is mandatory and holds 1 to 6 digits.
pub fn parse_add_time(value: &str) -> Option<NaiveDateTime> {
    let (_, fraction) = value.rsplit_once('.')?;
    if fraction.is_empty() || fraction.len() > 6 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDateTime::parse_from_str(value, ADD_TIME_FORMAT).ok()
}

fn added_at(record: &CaseRecord) -> InputResult<NaiveDateTime> {
    let value = record.add_time.as_deref().unwrap_or("");
    parse_add_time(value).ok_or_else(|| InputError::Timestamp {
        side: Side::Source,
        case_id: record.case_id.clone(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADERS: [&str; 8] = [
        "CaseID",
        "EventCode",
        "EventName",
        "MMWRYear",
        "MMWRWeek",
        "CaseClassStatus",
        "AddTime",
        "Age",
    ];

    fn row(case_id: &str, event_code: &str, add_time: &str, age: &str) -> Vec<String> {
        [case_id, event_code, "Flu", "2023", "5", "Confirmed", add_time, age]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn table(rows: Vec<Vec<String>>) -> RawTable {
        let mut table = RawTable::new(&HEADERS);
        table.rows = rows;
        table
    }

    #[test]
    fn test_later_add_time_wins() {
        let table = table(vec![
            row("C5", "100", "2023-01-01 00:00:00.000000", "30"),
            row("C5", "100", "2023-06-01 00:00:00.000000", "31"),
        ]);

        let set = SourceLoader::default().load(&table).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("C5").unwrap().attribute("Age"), Some("31"));
    }

    #[test]
    fn test_earlier_duplicate_discarded() {
        let table = table(vec![
            row("C5", "100", "2023-06-01 00:00:00.000000", "31"),
            row("C5", "100", "2023-01-01 00:00:00.000000", "30"),
        ]);

        let set = SourceLoader::default().load(&table).unwrap();
        assert_eq!(set.get("C5").unwrap().attribute("Age"), Some("31"));
    }

    #[test]
    fn test_equal_add_time_keeps_first() {
        let table = table(vec![
            row("C5", "100", "2023-06-01 00:00:00.000000", "first"),
            row("C5", "100", "2023-06-01 00:00:00.000000", "second"),
        ]);

        let set = SourceLoader::default().load(&table).unwrap();
        assert_eq!(set.get("C5").unwrap().attribute("Age"), Some("first"));
    }

    #[test]
    fn test_replacement_keeps_first_position() {
        let table = table(vec![
            row("C1", "100", "2023-01-01 00:00:00.000000", "1"),
            row("C2", "100", "2023-01-01 00:00:00.000000", "2"),
            row("C1", "100", "2023-02-01 00:00:00.000000", "3"),
        ]);

        let set = SourceLoader::default().load(&table).unwrap();
        let ids: Vec<&str> = set.iter().map(|r| r.case_id.as_str()).collect();
        assert_eq!(ids, vec!["C1", "C2"]);
    }

    #[test]
    fn test_non_numeric_event_codes_dropped() {
        let table = table(vec![
            row("C1", "100", "2023-01-01 00:00:00.000000", "1"),
            row("M1", "MAPPING", "2023-01-01 00:00:00.000000", "1"),
            row("M2", "", "2023-01-01 00:00:00.000000", "1"),
        ]);

        let set = SourceLoader::default().load(&table).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains("C1"));
    }

    #[test]
    fn test_allow_list() {
        let table = table(vec![
            row("C1", "100", "2023-01-01 00:00:00.000000", "1"),
            row("C2", "200", "2023-01-01 00:00:00.000000", "1"),
        ]);
        let filter = EventCodeFilter::new(["100"]);

        let set = SourceLoader::new(Some(&filter)).load(&table).unwrap();
        assert_eq!(set.len(), 1);
        assert!(!set.contains("C2"));
    }

    #[test]
    fn test_malformed_timestamp_is_fatal() {
        let table = table(vec![
            row("C7", "100", "2023-01-01 00:00:00.000000", "1"),
            row("C7", "100", "01/02/2023", "1"),
        ]);

        let err = SourceLoader::default().load(&table).unwrap_err();
        match err {
            InputError::Timestamp { case_id, value, .. } => {
                assert_eq!(case_id, "C7");
                assert_eq!(value, "01/02/2023");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unique_rows_do_not_parse_timestamps() {
        let table = table(vec![row("C1", "100", "not a time", "1")]);
        assert!(SourceLoader::default().load(&table).is_ok());
    }

    #[test]
    fn test_attributes_exclude_source_only_columns() {
        let table = table(vec![row("C1", "100", "2023-01-01 00:00:00.000000", "1")]);
        let set = SourceLoader::default().load(&table).unwrap();

        assert_eq!(set.attributes(), ["MMWRYear", "MMWRWeek", "Age"]);
        let record = set.get("C1").unwrap();
        assert_eq!(record.case_class_status.as_deref(), Some("Confirmed"));
    }

    #[test]
    fn test_parse_add_time() {
        assert!(parse_add_time("2023-06-01 13:45:10.123456").is_some());
        assert!(parse_add_time("2023-06-01 13:45:10.5").is_some());
        assert!(parse_add_time("2023-06-01").is_none());
    }

    #[test]
    fn test_parse_add_time_requires_fraction() {
        assert!(parse_add_time("2023-06-01 13:45:10").is_none());
        assert!(parse_add_time("2023-06-01 13:45:10.").is_none());
    }

    #[test]
    fn test_parse_add_time_rejects_more_than_six_digits() {
        assert!(parse_add_time("2023-01-01 00:00:00.1234567").is_none());
        assert!(parse_add_time("2023-01-01 00:00:00.123456789").is_none());
    }

    #[test]
    fn test_missing_fraction_in_duplicate_is_fatal() {
        let table = table(vec![
            row("C5", "100", "2023-01-01 00:00:00", "2"),
            row("C5", "100", "2023-06-01 00:00:00", "3"),
        ]);

        let err = SourceLoader::default().load(&table).unwrap_err();
        match err {
            InputError::Timestamp { case_id, value, .. } => {
                assert_eq!(case_id, "C5");
                assert_eq!(value, "2023-06-01 00:00:00");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
