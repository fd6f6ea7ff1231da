//! Column resolution shared by both loaders.
//!
//! Headers are resolved to indices once per table; each row is then turned
//! into a [`CaseRecord`] without further name lookups.

use crate::error::{InputError, InputResult};
use crate::models::{
    is_comparable, CaseRecord, RawTable, Side, ADD_TIME, CASE_CLASS_STATUS, CASE_ID, EVENT_CODE,
    EVENT_NAME, MMWR_WEEK, MMWR_YEAR,
};

/// Header indices for one table.
#[derive(Debug, Clone)]
pub(crate) struct ColumnMap {
    side: Side,
    case_id: usize,
    event_code: usize,
    event_name: usize,
    mmwr_year: usize,
    mmwr_week: usize,
    add_time: Option<usize>,
    case_class_status: Option<usize>,
    /// (name, index) of comparable columns in declared order.
    attributes: Vec<(String, usize)>,
}

impl ColumnMap {
    /// Resolve the columns of `table`. `AddTime` is required on the source side.
    pub(crate) fn resolve(side: Side, table: &RawTable) -> InputResult<Self> {
        let require = |column: &str| {
            table
                .column_index(column)
                .ok_or_else(|| InputError::MissingColumn {
                    side,
                    column: column.to_string(),
                })
        };

        let add_time = match side {
            Side::Source => Some(require(ADD_TIME)?),
            Side::Reference => table.column_index(ADD_TIME),
        };

        let attributes = table
            .headers
            .iter()
            .enumerate()
            .filter(|(_, name)| is_comparable(name))
            .map(|(i, name)| (name.clone(), i))
            .collect();

        Ok(Self {
            side,
            case_id: require(CASE_ID)?,
            event_code: require(EVENT_CODE)?,
            event_name: require(EVENT_NAME)?,
            mmwr_year: require(MMWR_YEAR)?,
            mmwr_week: require(MMWR_WEEK)?,
            add_time,
            case_class_status: table.column_index(CASE_CLASS_STATUS),
            attributes,
        })
    }

    /// Comparable attribute names in declared order.
    pub(crate) fn attribute_names(&self) -> Vec<String> {
        self.attributes.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Event code of a row, without building the whole record.
    pub(crate) fn event_code<'a>(&self, row: &'a [String], line: usize) -> InputResult<&'a str> {
        self.value(row, self.event_code, EVENT_CODE, line)
    }

    /// Build a record from a row. `line` is the 1-based file line for errors.
    pub(crate) fn read(&self, row: &[String], line: usize) -> InputResult<CaseRecord> {
        let add_time = match self.add_time {
            Some(i) => Some(self.value(row, i, ADD_TIME, line)?.to_string()),
            None => None,
        };
        let case_class_status = match self.case_class_status {
            Some(i) => Some(self.value(row, i, CASE_CLASS_STATUS, line)?.to_string()),
            None => None,
        };

        let attributes = self
            .attributes
            .iter()
            .map(|(name, i)| Ok((name.clone(), self.value(row, *i, name, line)?.to_string())))
            .collect::<InputResult<Vec<_>>>()?;

        Ok(CaseRecord {
            case_id: self.value(row, self.case_id, CASE_ID, line)?.to_string(),
            event_code: self.value(row, self.event_code, EVENT_CODE, line)?.to_string(),
            event_name: self.value(row, self.event_name, EVENT_NAME, line)?.to_string(),
            mmwr_year: self.value(row, self.mmwr_year, MMWR_YEAR, line)?.to_string(),
            mmwr_week: self.value(row, self.mmwr_week, MMWR_WEEK, line)?.to_string(),
            add_time,
            case_class_status,
            attributes,
        })
    }

    fn value<'a>(
        &self,
        row: &'a [String],
        index: usize,
        column: &str,
        line: usize,
    ) -> InputResult<&'a str> {
        row.get(index)
            .map(String::as_str)
            .ok_or_else(|| InputError::MissingField {
                side: self.side,
                line,
                column: column.to_string(),
            })
    }
}

/// File line of the row at `index` (header is line 1).
pub(crate) fn line_of(index: usize) -> usize {
    index + 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<&'static str> {
        vec!["CaseID", "EventCode", "EventName", "MMWRYear", "MMWRWeek", "Age"]
    }

    #[test]
    fn test_reference_does_not_need_add_time() {
        let table = RawTable::new(&headers());
        let columns = ColumnMap::resolve(Side::Reference, &table).unwrap();
        assert_eq!(columns.attribute_names(), vec!["MMWRYear", "MMWRWeek", "Age"]);
    }

    #[test]
    fn test_source_requires_add_time() {
        let table = RawTable::new(&headers());
        let err = ColumnMap::resolve(Side::Source, &table).unwrap_err();
        assert!(matches!(err, InputError::MissingColumn { ref column, .. } if column == "AddTime"));
    }

    #[test]
    fn test_short_row_is_missing_field() {
        let table = RawTable::new(&headers());
        let columns = ColumnMap::resolve(Side::Reference, &table).unwrap();
        let row: Vec<String> = ["C1", "100", "Flu", "2023", "4"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let err = columns.read(&row, 7).unwrap_err();
        match err {
            InputError::MissingField { line, column, .. } => {
                assert_eq!(line, 7);
                assert_eq!(column, "Age");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_keeps_declared_order() {
        let table = RawTable::new(&["Age", "CaseID", "EventCode", "EventName", "MMWRYear", "MMWRWeek"]);
        let columns = ColumnMap::resolve(Side::Reference, &table).unwrap();
        let row: Vec<String> = ["30", "C1", "100", "Flu", "2023", "4"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let record = columns.read(&row, 2).unwrap();
        assert_eq!(record.case_id, "C1");
        assert_eq!(record.attributes[0], ("Age".to_string(), "30".to_string()));
        assert_eq!(record.add_time, None);
    }
}
