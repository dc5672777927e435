//! File loading: CSV and Excel ingestion with cleanup passes.
//!
//! Entry point is [`load_bytes`], which dispatches on the file extension,
//! parses the payload into a [`DataFrame`], and applies two cleanup
//! passes:
//!
//! 1. Columns where every cell is missing are dropped.
//! 2. String columns where strictly more than half of the non-missing
//!    values parse as numbers are coerced to numeric storage; values
//!    that do not parse become missing.
//!
//! CSV input gets delimiter sniffing over the first line (comma,
//! semicolon, tab, pipe; comma wins ties and is the fallback). Excel
//! input is read from the first worksheet with the first row as header.
//!
//! # Example
//!
//! ```
//! use datalens::loader::load_bytes;
//!
//! let csv = b"id;amount\n1;10.5\n2;20.0\n";
//! let df = load_bytes("sales.csv", csv).unwrap();
//! assert_eq!(df.row_count(), 2);
//! assert_eq!(df.column_names(), &["id", "amount"]);
//! ```

use crate::csv_parser::CsvParser;
use crate::dataframe::{Column, DataFrame, DataType};
use crate::error::LensError;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use tracing::{debug, info};

/// Delimiters tried during sniffing, in tie-break priority order.
const SNIFF_CANDIDATES: &[u8] = &[b',', b';', b'\t', b'|'];

/// Fraction of non-missing values that must parse as numbers before a
/// string column is coerced to numeric storage. Strict: exactly half is
/// not enough.
const COERCION_THRESHOLD: f64 = 0.5;

/// Loads a dataset from an in-memory file payload.
///
/// The format is chosen by the (case-insensitive) extension of
/// `filename`: `.csv`, `.xlsx`, or `.xls`. Anything else is rejected
/// with [`LensError::UnsupportedFormat`].
pub fn load_bytes(filename: &str, bytes: &[u8]) -> Result<DataFrame, LensError> {
    let ext = filename
        .rsplit('.')
        .next()
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let mut df = match ext.as_str() {
        "csv" => load_csv(bytes)?,
        "xlsx" | "xls" => load_excel(bytes)?,
        _ => {
            return Err(LensError::UnsupportedFormat {
                filename: filename.to_string(),
            })
        }
    };

    drop_empty_columns(&mut df);
    coerce_numeric_strings(&mut df)?;

    info!(
        filename,
        rows = df.row_count(),
        columns = df.column_count(),
        "dataset loaded"
    );
    Ok(df)
}

// ── CSV ───────────────────────────────────────────────────────────────

fn load_csv(bytes: &[u8]) -> Result<DataFrame, LensError> {
    let text = String::from_utf8_lossy(bytes);
    let delimiter = sniff_delimiter(&text);
    CsvParser::new().delimiter(delimiter).parse_str(&text)
}

/// Picks the delimiter with the most occurrences in the first line,
/// counting only characters outside quoted sections.
fn sniff_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or("");
    let mut best = b',';
    let mut best_count = 0usize;
    for &cand in SNIFF_CANDIDATES {
        let mut count = 0usize;
        let mut in_quotes = false;
        for c in first_line.chars() {
            if c == '"' {
                in_quotes = !in_quotes;
            } else if !in_quotes && c == cand as char {
                count += 1;
            }
        }
        if count > best_count {
            best = cand;
            best_count = count;
        }
    }
    best
}

// ── Excel ─────────────────────────────────────────────────────────────

fn load_excel(bytes: &[u8]) -> Result<DataFrame, LensError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)?;
    let range = match workbook.worksheet_range_at(0) {
        Some(result) => result?,
        None => return Ok(DataFrame::new()),
    };

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let s = stringify_cell(cell);
                if s.is_empty() {
                    format!("col_{i}")
                } else {
                    s
                }
            })
            .collect(),
        None => return Ok(DataFrame::new()),
    };

    let n_cols = headers.len();
    let mut raw_columns: Vec<Vec<String>> = vec![Vec::new(); n_cols];
    for row in rows {
        for (col_idx, raw_col) in raw_columns.iter_mut().enumerate() {
            let cell = row.get(col_idx).unwrap_or(&Data::Empty);
            raw_col.push(stringify_cell(cell));
        }
    }

    // Run stringified cells through the same inference path CSV uses
    let parser = CsvParser::new();
    let mut df = DataFrame::new();
    for (header, raw_col) in headers.into_iter().zip(raw_columns.iter()) {
        let col = parser.build_column(raw_col);
        df.add_column(header, col)
            .expect("all columns same length");
    }
    Ok(df)
}

fn stringify_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => format!("{f}"),
        Data::Int(i) => format!("{i}"),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => ndt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => String::new(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

// ── Cleanup passes ────────────────────────────────────────────────────

fn drop_empty_columns(df: &mut DataFrame) {
    let before = df.column_count();
    df.retain_columns(|_, col| col.valid_count() > 0);
    let dropped = before - df.column_count();
    if dropped > 0 {
        debug!(dropped, "dropped all-missing columns");
    }
}

/// Coerces string columns that are mostly numeric to numeric storage.
fn coerce_numeric_strings(df: &mut DataFrame) -> Result<(), LensError> {
    let n = df.row_count();
    let mut conversions: Vec<(String, Column)> = Vec::new();

    for (name, col) in df.iter() {
        if !matches!(col.data_type(), DataType::Categorical | DataType::Text) {
            continue;
        }
        let valid = col.valid_count();
        if valid == 0 {
            continue;
        }
        let mut parseable = 0usize;
        for idx in 0..n {
            if let Some(label) = col.label_at(idx) {
                if label.trim().parse::<f64>().is_ok() {
                    parseable += 1;
                }
            }
        }
        if (parseable as f64) / (valid as f64) > COERCION_THRESHOLD {
            let mut values = Vec::with_capacity(n);
            let mut validity = crate::dataframe::ValidityBitmap::empty();
            for idx in 0..n {
                match col.label_at(idx).and_then(|s| s.trim().parse::<f64>().ok()) {
                    Some(v) => {
                        values.push(v);
                        validity.push(true);
                    }
                    None => {
                        values.push(0.0);
                        validity.push(false);
                    }
                }
            }
            debug!(column = name, parseable, valid, "coerced column to numeric");
            conversions.push((name.to_string(), Column::numeric(values, validity)));
        }
    }

    for (name, col) in conversions {
        df.replace_column(&name, col)?;
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────
