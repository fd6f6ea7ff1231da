//! CSV reader with encoding and delimiter auto-detection.
//!
//! Turns CSV bytes into a [`RawTable`]. No case-specific logic here: column
//! validation happens in the loaders.

use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;

use crate::models::RawTable;

/// CSV parsing error with context
#[derive(Debug, Clone)]
pub struct CsvError {
    pub line: usize,
    pub column: Option<String>,
    pub value: Option<String>,
    pub message: String,
}

impl std::fmt::Display for CsvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.column, &self.value) {
            (Some(col), Some(val)) => {
                write!(f, "Line {}, column '{}' (value '{}'): {}", self.line, col, val, self.message)
            }
            (Some(col), None) => {
                write!(f, "Line {}, column '{}': {}", self.line, col, self.message)
            }
            _ => {
                write!(f, "Line {}: {}", self.line, self.message)
            }
        }
    }
}

impl std::error::Error for CsvError {}

impl CsvError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column: None,
            value: None,
            message: message.into(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    fn from_csv(err: csv::Error) -> Self {
        let line = err
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(0);
        CsvError::new(line, err.to_string())
    }
}

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed table
    pub table: RawTable,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        // UTF-8 and anything unknown: lossy UTF-8
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting occurrences in the header line.
///
/// Ties go to the comma, which is what both the state query export and the
/// CDC extract use.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV from a reader into a table.
///
/// The first record is the header. Blank lines are skipped; rows shorter or
/// longer than the header are kept as-is.
pub fn parse_csv<R: Read>(reader: R, delimiter: char) -> Result<RawTable, CsvError> {
    let delimiter = u8::try_from(delimiter)
        .map_err(|_| CsvError::new(0, format!("Unsupported delimiter '{}'", delimiter)))?;

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(CsvError::from_csv)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::new(1, "Empty CSV file"));
    }

    let mut table = RawTable {
        headers,
        rows: Vec::new(),
    };

    for record in rdr.records() {
        let record = record.map_err(CsvError::from_csv)?;
        table.rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(table)
}

/// Parse a CSV string with an explicit delimiter.
///
/// # Example
/// ```ignore
/// use caserecon::parse_str;
///
/// let table = parse_str("CaseID,EventCode\nC1,10110", ',').unwrap();
/// assert_eq!(table.headers, vec!["CaseID", "EventCode"]);
/// assert_eq!(table.rows[0][0], "C1");
/// ```
pub fn parse_str(content: &str, delimiter: char) -> Result<RawTable, CsvError> {
    parse_csv(content.as_bytes(), delimiter)
}

/// Parse CSV file with auto-detection of encoding and delimiter.
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> Result<ParseResult, CsvError> {
    let bytes = std::fs::read(path.as_ref()).map_err(|e| {
        CsvError::new(0, format!("Cannot read file '{}': {}", path.as_ref().display(), e))
    })?;

    parse_bytes_auto(&bytes)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> Result<ParseResult, CsvError> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(CsvError::new(1, "Empty CSV file"));
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    let table = parse_str(&content, delimiter)?;

    Ok(ParseResult {
        table,
        encoding,
        delimiter,
    })
}

/// Render table rows as JSON objects keyed by header.
///
/// Missing trailing values become empty strings.
pub fn table_to_json(table: &RawTable) -> Vec<Value> {
    table
        .rows
        .iter()
        .map(|row| {
            let mut obj = Map::new();
            for (i, header) in table.headers.iter().enumerate() {
                let value = row.get(i).map(String::as_str).unwrap_or("");
                obj.insert(header.clone(), Value::String(value.to_string()));
            }
            Value::Object(obj)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let table = parse_str("CaseID,EventCode\nC1,10110\nC2,10120", ',').unwrap();

        assert_eq!(table.headers, vec!["CaseID", "EventCode"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["C2", "10120"]);
    }

    #[test]
    fn test_quoted_values_keep_delimiters() {
        let csv = "CaseID,EventName\nC1,\"Salmonellosis, excluding typhoid\"";
        let table = parse_str(csv, ',').unwrap();

        assert_eq!(table.rows[0][1], "Salmonellosis, excluding typhoid");
    }

    #[test]
    fn test_empty_lines_skipped() {
        let table = parse_str("a,b\n1,2\n\n3,4\n", ',').unwrap();
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_empty_values_preserved() {
        let table = parse_str("a,b,c\n1,,3", ',').unwrap();
        assert_eq!(table.rows[0], vec!["1", "", "3"]);
    }

    #[test]
    fn test_short_rows_kept() {
        let table = parse_str("a,b,c\n1,2", ',').unwrap();
        assert_eq!(table.rows[0].len(), 2);
    }

    #[test]
    fn test_bom_stripped_from_header() {
        let table = parse_str("\u{feff}CaseID,EventCode\nC1,1", ',').unwrap();
        assert_eq!(table.headers[0], "CaseID");
    }

    #[test]
    fn test_error_message_format() {
        let err = CsvError::new(5, "Invalid value")
            .with_column("AddTime")
            .with_value("abc");

        let msg = err.to_string();
        assert!(msg.contains("Line 5"));
        assert!(msg.contains("column 'AddTime'"));
        assert!(msg.contains("value 'abc'"));
    }

    #[test]
    fn test_empty_csv_error() {
        let err = parse_bytes_auto(b"").unwrap_err();
        assert!(err.message.contains("Empty"));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_auto_parse() {
        let result = parse_bytes_auto(b"CaseID;EventCode\nC1;10110").unwrap();

        assert_eq!(result.delimiter, ';');
        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.table.rows.len(), 1);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_table_to_json_pads_missing_values() {
        let table = RawTable::new(&["a", "b"]).with_row(&["1"]);
        let json = table_to_json(&table);

        assert_eq!(json[0]["a"], "1");
        assert_eq!(json[0]["b"], "");
    }
}
