//! CSV parser with automatic type inference.
//!
//! Parses CSV text into a [`DataFrame`](crate::dataframe::DataFrame)
//! with column storage types inferred from content. The inference
//! priority is: Numeric → Boolean → Datetime → Categorical → Text.
//!
//! # Features
//!
//! - RFC 4180 compliant (quoted fields, escaped quotes, commas in fields)
//! - Automatic type inference per column, including common date formats
//! - Standard null markers recognized: empty, `NA`, `N/A`, `null`, `NULL`, `None`, `.`
//! - Low-cardinality strings are dictionary-encoded as Categorical
//! - Configurable delimiter and null markers
//!
//! # Example
//!
//! ```
//! use datalens::csv_parser::CsvParser;
//! use datalens::dataframe::DataType;
//!
//! let csv = "name,value,seen\nAlice,1.5,2024-01-02\nBob,2.3,2024-01-03\n";
//! let df = CsvParser::new().parse_str(csv).unwrap();
//! assert_eq!(df.row_count(), 2);
//! assert_eq!(df.column(1).unwrap().data_type(), DataType::Numeric);
//! assert_eq!(df.column(2).unwrap().data_type(), DataType::Datetime);
//! ```

use crate::dataframe::{Column, DataFrame, DataType, ValidityBitmap};
use crate::error::LensError;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;

/// Standard null value markers recognized during parsing.
const DEFAULT_NULL_MARKERS: &[&str] = &[
    "", "NA", "N/A", "na", "n/a", "null", "NULL", "None", "none", ".",
    "NaN", "nan", "NAN", "#N/A", "#NA",
];

/// Maximum unique-value ratio for a string column to be stored
/// dictionary-encoded instead of as plain text.
const DICTIONARY_THRESHOLD: f64 = 0.5;

/// Maximum dictionary size for categorical storage.
const MAX_DICTIONARY_UNIQUE: usize = 1000;

/// Timestamp formats tried during datetime inference, most specific first.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Date-only formats; parsed values carry a midnight time part.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parses a string as a timestamp using the supported formats.
pub(crate) fn parse_datetime_str(s: &str) -> Option<NaiveDateTime> {
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// CSV parser configuration and entry point.
///
/// ```
/// use datalens::csv_parser::CsvParser;
///
/// let csv = "a,b\n1,2\n3,4\n";
/// let df = CsvParser::new().parse_str(csv).unwrap();
/// assert_eq!(df.row_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct CsvParser {
    delimiter: u8,
    has_header: bool,
    null_markers: Vec<String>,
}

impl CsvParser {
    /// Creates a parser with default settings (comma delimiter, header row, standard null markers).
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            null_markers: DEFAULT_NULL_MARKERS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }

    /// Sets the field delimiter (default: comma).
    pub fn delimiter(mut self, delim: u8) -> Self {
        self.delimiter = delim;
        self
    }

    /// Sets whether the first row is a header (default: true).
    pub fn has_header(mut self, header: bool) -> Self {
        self.has_header = header;
        self
    }

    /// Sets custom null markers (replaces defaults).
    pub fn null_markers(mut self, markers: Vec<String>) -> Self {
        self.null_markers = markers;
        self
    }

    /// Parses a CSV string into a DataFrame.
    pub fn parse_str(&self, input: &str) -> Result<DataFrame, LensError> {
        // Strip BOM if present
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);

        let raw_rows = self.parse_raw(input)?;
        if raw_rows.is_empty() {
            return Ok(DataFrame::new());
        }

        let (headers, data_rows) = if self.has_header {
            let headers: Vec<String> = raw_rows[0].clone();
            (headers, &raw_rows[1..])
        } else {
            let n_cols = raw_rows[0].len();
            let headers: Vec<String> = (0..n_cols).map(|i| format!("col_{i}")).collect();
            (headers, &raw_rows[..])
        };

        if data_rows.is_empty() {
            return Ok(DataFrame::new());
        }

        let n_cols = headers.len();
        let n_rows = data_rows.len();

        // Transpose to column-major raw strings
        let mut raw_columns: Vec<Vec<String>> = vec![Vec::with_capacity(n_rows); n_cols];
        for (line_idx, row) in data_rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(LensError::CsvParse {
                    line: if self.has_header {
                        line_idx + 2
                    } else {
                        line_idx + 1
                    },
                    message: format!("expected {n_cols} fields, got {}", row.len()),
                });
            }
            for (col_idx, field) in row.iter().enumerate() {
                raw_columns[col_idx].push(field.clone());
            }
        }

        let mut df = DataFrame::new();
        for (col_idx, raw_col) in raw_columns.iter().enumerate() {
            let col = self.build_column(raw_col);
            df.add_column(headers[col_idx].clone(), col)
                .expect("all columns same length");
        }

        Ok(df)
    }

    // ── Internal parsing ─────────────────────────────────────────

    /// Parses raw CSV text into rows of string fields.
    fn parse_raw(&self, input: &str) -> Result<Vec<Vec<String>>, LensError> {
        let delim = self.delimiter as char;
        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut current_row: Vec<String> = Vec::new();
        let mut current_field = String::new();
        let mut in_quotes = false;
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            if in_quotes {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        // Escaped quote ""
                        chars.next();
                        current_field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    current_field.push(c);
                }
            } else if c == '"' && current_field.is_empty() {
                in_quotes = true;
            } else if c == delim {
                current_row.push(std::mem::take(&mut current_field));
            } else if c == '\n' {
                // Handle \r\n: strip trailing \r from field
                if current_field.ends_with('\r') {
                    current_field.truncate(current_field.len() - 1);
                }
                current_row.push(std::mem::take(&mut current_field));
                finish_row(&mut rows, &mut current_row);
            } else if c == '\r' {
                // Standalone \r (old Mac style) - treat as newline
                if chars.peek() != Some(&'\n') {
                    current_row.push(std::mem::take(&mut current_field));
                    finish_row(&mut rows, &mut current_row);
                }
            } else {
                current_field.push(c);
            }
        }

        // Handle last field/row (no trailing newline)
        if !current_field.is_empty() || !current_row.is_empty() {
            current_row.push(current_field);
            finish_row(&mut rows, &mut current_row);
        }

        // Remove trailing empty rows
        while rows.last().is_some_and(|r| r.iter().all(|f| f.is_empty())) {
            rows.pop();
        }

        Ok(rows)
    }

    /// Checks if a trimmed value is a null marker.
    pub(crate) fn is_null(&self, value: &str) -> bool {
        let trimmed = value.trim();
        self.null_markers.iter().any(|m| m == trimmed)
    }

    /// Infers the column storage type and builds a typed Column.
    ///
    /// Also used by the spreadsheet loader, which stringifies cells and
    /// runs them through the same inference path.
    pub(crate) fn build_column(&self, raw_values: &[String]) -> Column {
        let n = raw_values.len();
        let trimmed: Vec<&str> = raw_values.iter().map(|s| s.trim()).collect();
        let null_flags: Vec<bool> = trimmed.iter().map(|s| self.is_null(s)).collect();

        let non_null_count = null_flags.iter().filter(|&&is_null| !is_null).count();
        if non_null_count == 0 {
            // All null: default to numeric
            return Column::numeric(vec![0.0; n], ValidityBitmap::all_invalid(n));
        }

        match self.try_infer_type(&trimmed, &null_flags) {
            DataType::Numeric => build_numeric_column(&trimmed, &null_flags),
            DataType::Boolean => build_boolean_column(&trimmed, &null_flags),
            DataType::Datetime => build_datetime_column(&trimmed, &null_flags),
            DataType::Categorical => build_categorical_column(&trimmed, &null_flags),
            DataType::Text => build_text_column(&trimmed, &null_flags),
        }
    }

    /// Determines the most specific storage type that fits all non-null values.
    fn try_infer_type(&self, values: &[&str], null_flags: &[bool]) -> DataType {
        let non_null: Vec<&str> = values
            .iter()
            .zip(null_flags.iter())
            .filter(|(_, &is_null)| !is_null)
            .map(|(&v, _)| v)
            .collect();

        if non_null.iter().all(|s| s.parse::<f64>().is_ok()) {
            return DataType::Numeric;
        }

        if non_null.iter().all(|s| is_boolean_str(s)) {
            return DataType::Boolean;
        }

        if non_null.iter().all(|s| parse_datetime_str(s).is_some()) {
            return DataType::Datetime;
        }

        // Categorical vs Text storage: based on cardinality
        let mut unique = std::collections::HashSet::new();
        for &v in &non_null {
            unique.insert(v);
        }
        let ratio = unique.len() as f64 / non_null.len() as f64;
        if ratio < DICTIONARY_THRESHOLD && unique.len() <= MAX_DICTIONARY_UNIQUE {
            DataType::Categorical
        } else {
            DataType::Text
        }
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Completes a row, discarding blank lines (a single empty field).
fn finish_row(rows: &mut Vec<Vec<String>>, current_row: &mut Vec<String>) {
    if current_row.len() == 1 && current_row[0].is_empty() {
        current_row.clear();
    } else {
        rows.push(std::mem::take(current_row));
    }
}

// ── Column builders ───────────────────────────────────────────────────
//
// Shared with the Excel loader, which feeds stringified cells through
// the same inference path.

pub(crate) fn build_numeric_column(values: &[&str], null_flags: &[bool]) -> Column {
    let n = values.len();
    let mut nums = Vec::with_capacity(n);
    let mut validity = ValidityBitmap::empty();

    for (i, &val) in values.iter().enumerate() {
        if null_flags[i] {
            nums.push(0.0);
            validity.push(false);
        } else {
            match val.parse::<f64>() {
                Ok(v) => {
                    nums.push(v);
                    validity.push(true);
                }
                Err(_) => {
                    // Non-convertible values become missing markers
                    nums.push(0.0);
                    validity.push(false);
                }
            }
        }
    }

    Column::numeric(nums, validity)
}

pub(crate) fn build_boolean_column(values: &[&str], null_flags: &[bool]) -> Column {
    let n = values.len();
    let mut bools = Vec::with_capacity(n);
    let mut validity = ValidityBitmap::empty();

    for (i, &val) in values.iter().enumerate() {
        if null_flags[i] {
            bools.push(false);
            validity.push(false);
        } else {
            bools.push(parse_boolean_str(val));
            validity.push(true);
        }
    }

    Column::boolean(bools, validity)
}

pub(crate) fn build_datetime_column(values: &[&str], null_flags: &[bool]) -> Column {
    let n = values.len();
    let epoch = NaiveDateTime::UNIX_EPOCH;
    let mut stamps = Vec::with_capacity(n);
    let mut validity = ValidityBitmap::empty();

    for (i, &val) in values.iter().enumerate() {
        if null_flags[i] {
            stamps.push(epoch);
            validity.push(false);
        } else {
            match parse_datetime_str(val) {
                Some(dt) => {
                    stamps.push(dt);
                    validity.push(true);
                }
                None => {
                    stamps.push(epoch);
                    validity.push(false);
                }
            }
        }
    }

    Column::datetime(stamps, validity)
}

pub(crate) fn build_categorical_column(values: &[&str], null_flags: &[bool]) -> Column {
    let n = values.len();
    let mut dict_map: HashMap<String, u32> = HashMap::new();
    let mut dictionary: Vec<String> = Vec::new();
    let mut indices = Vec::with_capacity(n);
    let mut validity = ValidityBitmap::empty();

    for (i, &val) in values.iter().enumerate() {
        if null_flags[i] {
            indices.push(0);
            validity.push(false);
        } else {
            let idx = if let Some(&existing) = dict_map.get(val) {
                existing
            } else {
                let idx = dictionary.len() as u32;
                dictionary.push(val.to_string());
                dict_map.insert(val.to_string(), idx);
                idx
            };
            indices.push(idx);
            validity.push(true);
        }
    }

    Column::categorical(dictionary, indices, validity)
}

pub(crate) fn build_text_column(values: &[&str], null_flags: &[bool]) -> Column {
    let n = values.len();
    let mut texts = Vec::with_capacity(n);
    let mut validity = ValidityBitmap::empty();

    for (i, &val) in values.iter().enumerate() {
        if null_flags[i] {
            texts.push(String::new());
            validity.push(false);
        } else {
            texts.push(val.to_string());
            validity.push(true);
        }
    }

    Column::text(texts, validity)
}

// ── Helper functions ──────────────────────────────────────────────────

/// Checks if a string represents a boolean value.
pub(crate) fn is_boolean_str(s: &str) -> bool {
    matches!(
        s.to_lowercase().as_str(),
        "true" | "false" | "yes" | "no" | "t" | "f" | "y" | "n"
    )
}

/// Parses a boolean string to `bool`.
pub(crate) fn parse_boolean_str(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "true" | "yes" | "t" | "y")
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Basic CSV parsing ────────────────────────────────────────

    #[test]
    fn parse_simple_csv() {
        let csv = "a,b,c\n1,2,3\n4,5,6\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        assert_eq!(df.row_count(), 2);
        assert_eq!(df.column_count(), 3);
        assert_eq!(df.column_names(), &["a", "b", "c"]);
    }

    #[test]
    fn parse_numeric_columns() {
        let csv = "x,y\n1.5,2.7\n3.1,-4.2\n0,100\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let x = df.column_by_name("x").unwrap();
        assert_eq!(x.data_type(), DataType::Numeric);
        assert_eq!(x.as_numeric().unwrap(), &[1.5, 3.1, 0.0]);
    }

    #[test]
    fn parse_boolean_column() {
        let csv = "flag\ntrue\nfalse\nyes\nno\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let flag = df.column_by_name("flag").unwrap();
        assert_eq!(flag.data_type(), DataType::Boolean);
        assert_eq!(flag.as_boolean().unwrap(), &[true, false, true, false]);
    }

    #[test]
    fn parse_datetime_column() {
        let csv = "when\n2024-01-02\n2024-01-03\n2024-01-04\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let when = df.column_by_name("when").unwrap();
        assert_eq!(when.data_type(), DataType::Datetime);
    }

    #[test]
    fn parse_datetime_with_time_part() {
        let csv = "when\n2024-01-02 10:30:00\n2024-01-02T11:45:15\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let when = df.column_by_name("when").unwrap();
        assert_eq!(when.data_type(), DataType::Datetime);
        assert_eq!(when.null_count(), 0);
    }

    #[test]
    fn parse_datetime_with_nulls() {
        let csv = "when\n2024-01-02\nNA\n2024-01-04\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let when = df.column_by_name("when").unwrap();
        assert_eq!(when.data_type(), DataType::Datetime);
        assert_eq!(when.null_count(), 1);
        assert!(!when.is_valid(1));
    }

    #[test]
    fn mixed_date_and_text_is_not_datetime() {
        let csv = "x\n2024-01-02\nnot a date\n2024-01-04\nalso text\nmore\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let x = df.column_by_name("x").unwrap();
        assert_ne!(x.data_type(), DataType::Datetime);
    }

    #[test]
    fn parse_categorical_column() {
        // 3 unique values / 7 rows → dictionary-encoded
        let csv = "status\nA\nB\nC\nA\nB\nA\nC\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let status = df.column_by_name("status").unwrap();
        assert_eq!(status.data_type(), DataType::Categorical);
        assert_eq!(status.category_at(0), Some("A"));
        assert_eq!(status.category_at(2), Some("C"));
    }

    #[test]
    fn parse_text_column() {
        // High cardinality: all unique values
        let csv = "name\nAlice\nBob\nCharlie\nDave\nEve\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let name = df.column_by_name("name").unwrap();
        assert_eq!(name.data_type(), DataType::Text);
        assert_eq!(name.text_at(0), Some("Alice"));
    }

    // ── Null handling ────────────────────────────────────────────

    #[test]
    fn parse_null_markers() {
        let csv = "x,y\n1.0,a\nNA,b\n3.0,\n5.0,c\nnull,d\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let x = df.column_by_name("x").unwrap();
        assert_eq!(x.data_type(), DataType::Numeric);
        assert_eq!(x.null_count(), 2); // NA, null
        assert!(x.is_valid(0));
        assert!(!x.is_valid(1));
        assert!(!x.is_valid(4));
        // Empty field is a null too
        assert_eq!(df.column_by_name("y").unwrap().null_count(), 1);
    }

    #[test]
    fn blank_lines_skipped() {
        let csv = "a,b\n1,2\n\n3,4\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        assert_eq!(df.row_count(), 2);
    }

    #[test]
    fn all_null_column() {
        let csv = "x\nNA\nn/a\nnull\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let x = df.column_by_name("x").unwrap();
        assert_eq!(x.data_type(), DataType::Numeric); // defaults to numeric
        assert_eq!(x.null_count(), 3);
    }

    // ── Quoted fields ────────────────────────────────────────────

    #[test]
    fn parse_quoted_fields() {
        let csv = "name,desc\nAlice,\"hello, world\"\nBob,\"she said \"\"hi\"\"\"\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let desc = df.column_by_name("desc").unwrap();
        assert_eq!(desc.text_at(0), Some("hello, world"));
        assert_eq!(desc.text_at(1), Some("she said \"hi\""));
    }

    #[test]
    fn parse_quoted_newlines() {
        let csv = "name,note\nAlice,\"line1\nline2\"\nBob,simple\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        assert_eq!(df.row_count(), 2);
        let note = df.column_by_name("note").unwrap();
        assert_eq!(note.text_at(0), Some("line1\nline2"));
    }

    // ── Edge cases ───────────────────────────────────────────────

    #[test]
    fn parse_crlf_line_endings() {
        let csv = "a,b\r\n1,2\r\n3,4\r\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        assert_eq!(df.row_count(), 2);
        let a = df.column_by_name("a").unwrap();
        assert_eq!(a.as_numeric().unwrap(), &[1.0, 3.0]);
    }

    #[test]
    fn parse_no_trailing_newline() {
        let csv = "x\n1\n2\n3";
        let df = CsvParser::new().parse_str(csv).unwrap();
        assert_eq!(df.row_count(), 3);
    }

    #[test]
    fn parse_bom() {
        let csv = "\u{feff}x,y\n1,2\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        assert_eq!(df.column_names(), &["x", "y"]);
    }

    #[test]
    fn parse_empty_csv() {
        let df = CsvParser::new().parse_str("").unwrap();
        assert_eq!(df.row_count(), 0);
        assert_eq!(df.column_count(), 0);
    }

    #[test]
    fn parse_header_only() {
        let df = CsvParser::new().parse_str("a,b,c\n").unwrap();
        assert_eq!(df.row_count(), 0);
        assert_eq!(df.column_count(), 0);
    }

    #[test]
    fn parse_column_count_mismatch_error() {
        let csv = "a,b\n1,2\n3\n";
        let result = CsvParser::new().parse_str(csv);
        assert!(matches!(result, Err(LensError::CsvParse { line: 3, .. })));
    }

    #[test]
    fn parse_without_header() {
        let csv = "1,2\n3,4\n";
        let df = CsvParser::new().has_header(false).parse_str(csv).unwrap();
        assert_eq!(df.row_count(), 2);
        assert_eq!(df.column_names(), &["col_0", "col_1"]);
    }

    #[test]
    fn parse_semicolon_delimiter() {
        let csv = "a;b\n1;2\n3;4\n";
        let df = CsvParser::new().delimiter(b';').parse_str(csv).unwrap();
        assert_eq!(df.row_count(), 2);
        assert_eq!(df.column_names(), &["a", "b"]);
    }

    // ── Type inference edge cases ────────────────────────────────

    #[test]
    fn numeric_with_leading_spaces() {
        let csv = "x\n  1.5  \n  2.3  \n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let x = df.column_by_name("x").unwrap();
        assert_eq!(x.data_type(), DataType::Numeric);
        assert_eq!(x.as_numeric().unwrap(), &[1.5, 2.3]);
    }

    #[test]
    fn single_non_numeric_demotes_column() {
        let csv = "x\n1\n2\nthree\n4\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let x = df.column_by_name("x").unwrap();
        assert_ne!(x.data_type(), DataType::Numeric);
    }

    #[test]
    fn boolean_mixed_formats() {
        let csv = "x\ntrue\nFalse\nYes\nno\nT\nf\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let x = df.column_by_name("x").unwrap();
        assert_eq!(x.data_type(), DataType::Boolean);
        assert_eq!(
            x.as_boolean().unwrap(),
            &[true, false, true, false, true, false]
        );
    }

    #[test]
    fn negative_and_scientific_notation() {
        let csv = "x\n-1.5\n2.3e10\n-4.5E-3\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let x = df.column_by_name("x").unwrap();
        assert_eq!(x.data_type(), DataType::Numeric);
        assert_eq!(x.as_numeric().unwrap()[0], -1.5);
    }

    #[test]
    fn custom_null_markers() {
        let csv = "x\n1.0\n-999\n3.0\n";
        let df = CsvParser::new()
            .null_markers(vec!["-999".to_string()])
            .parse_str(csv)
            .unwrap();
        let x = df.column_by_name("x").unwrap();
        assert_eq!(x.null_count(), 1);
        assert!(!x.is_valid(1));
    }

    #[test]
    fn slash_date_formats() {
        assert!(parse_datetime_str("2024/06/15").is_some());
        assert!(parse_datetime_str("06/15/2024").is_some());
        assert!(parse_datetime_str("15 June 2024").is_none());
    }
}
