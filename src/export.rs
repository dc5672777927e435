//! Dataset export to CSV, Excel, and HTML.
//!
//! [`export`] renders a table into a downloadable [`ExportFile`]: bytes
//! plus the filename and content type the HTTP layer serves verbatim.
//! The export filename is the original filename's stem (everything
//! before the first dot) with `_export` and the format's extension.
//!
//! Missing cells render as empty; datetimes are ISO-formatted in all
//! three formats.

use crate::dataframe::{CellValue, DataFrame};
use crate::error::LensError;
use rust_xlsxwriter::Workbook;
use std::fmt::Write as _;

/// Timestamp format used in exported cells.
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Excel,
    Html,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "xlsx",
            Self::Html => "html",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            Self::Html => "text/html",
        }
    }
}

/// A rendered export, ready to serve.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Exports the table in the requested format.
pub fn export(
    df: &DataFrame,
    format: ExportFormat,
    original_filename: &str,
) -> Result<ExportFile, LensError> {
    let bytes = match format {
        ExportFormat::Csv => render_csv(df).into_bytes(),
        ExportFormat::Excel => render_excel(df)?,
        ExportFormat::Html => render_html(df).into_bytes(),
    };
    Ok(ExportFile {
        filename: export_filename(original_filename, format),
        content_type: format.content_type().to_string(),
        bytes,
    })
}

/// `sales.backup.csv` + Excel → `sales_export.xlsx`.
fn export_filename(original: &str, format: ExportFormat) -> String {
    let stem = original.split('.').next().unwrap_or(original);
    let stem = if stem.is_empty() { "dataset" } else { stem };
    format!("{stem}_export.{}", format.extension())
}

fn cell_text(cell: CellValue<'_>) -> String {
    match cell {
        CellValue::Null => String::new(),
        CellValue::Number(v) => v.to_string(),
        CellValue::Bool(b) => b.to_string(),
        CellValue::Datetime(dt) => dt.format(DATETIME_FORMAT).to_string(),
        CellValue::Str(s) => s.to_string(),
    }
}

// ── CSV ───────────────────────────────────────────────────────────────

fn render_csv(df: &DataFrame) -> String {
    let mut out = String::new();
    let header: Vec<String> = df
        .column_names()
        .iter()
        .map(|n| csv_escape(n))
        .collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for row_idx in 0..df.row_count() {
        let mut first = true;
        for (_, col) in df.iter() {
            if !first {
                out.push(',');
            }
            first = false;
            out.push_str(&csv_escape(&cell_text(col.cell(row_idx))));
        }
        out.push('\n');
    }
    out
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

// ── Excel ─────────────────────────────────────────────────────────────

fn render_excel(df: &DataFrame) -> Result<Vec<u8>, LensError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col_idx, name) in df.column_names().iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, name)?;
    }
    for row_idx in 0..df.row_count() {
        for (col_idx, (_, col)) in df.iter().enumerate() {
            let row = (row_idx + 1) as u32;
            let c = col_idx as u16;
            match col.cell(row_idx) {
                CellValue::Null => {}
                CellValue::Number(v) => {
                    worksheet.write_number(row, c, v)?;
                }
                other => {
                    worksheet.write_string(row, c, &cell_text(other))?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

// ── HTML ──────────────────────────────────────────────────────────────

fn render_html(df: &DataFrame) -> String {
    use crate::charts::palette;

    let mut out = String::new();
    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n\
         body {{ background: {bg}; color: {text}; font-family: sans-serif; }}\n\
         table {{ border-collapse: collapse; }}\n\
         th {{ background: {primary}; color: #fff; padding: 6px 12px; }}\n\
         td {{ border: 1px solid #ddd; padding: 4px 12px; }}\n\
         tr:nth-child(even) {{ background: #fff; }}\n\
         </style>\n</head>\n<body>\n<table>\n<thead>\n<tr>",
        bg = palette::BACKGROUND,
        text = palette::TEXT,
        primary = palette::PRIMARY,
    );
    for name in df.column_names() {
        let _ = write!(out, "<th>{}</th>", html_escape(name));
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");
    for row_idx in 0..df.row_count() {
        out.push_str("<tr>");
        for (_, col) in df.iter() {
            let _ = write!(out, "<td>{}</td>", html_escape(&cell_text(col.cell(row_idx))));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    out
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_parser::CsvParser;
    use crate::loader::load_bytes;

    fn sample() -> DataFrame {
        let csv = "name,score,when\nalpha,10.5,2024-01-02\n\"has, comma\",20,2024-01-03\n";
        CsvParser::new().parse_str(csv).unwrap()
    }

    #[test]
    fn filename_uses_stem_before_first_dot() {
        assert_eq!(
            export_filename("sales.backup.csv", ExportFormat::Excel),
            "sales_export.xlsx"
        );
        assert_eq!(export_filename("data.csv", ExportFormat::Csv), "data_export.csv");
        assert_eq!(export_filename("noext", ExportFormat::Html), "noext_export.html");
    }

    #[test]
    fn csv_export_round_trips() {
        let df = sample();
        let file = export(&df, ExportFormat::Csv, "data.csv").unwrap();
        assert_eq!(file.content_type, "text/csv");
        assert_eq!(file.filename, "data_export.csv");

        let text = String::from_utf8(file.bytes).unwrap();
        let back = CsvParser::new().parse_str(&text).unwrap();
        assert_eq!(back.row_count(), 2);
        assert_eq!(back.column_names(), df.column_names());
        assert_eq!(back.column_by_name("name").unwrap().text_at(1), Some("has, comma"));
    }

    #[test]
    fn csv_escapes_quotes() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn csv_missing_cells_are_empty_fields() {
        let df = CsvParser::new().parse_str("x,y\n1,a\nNA,b\n").unwrap();
        let file = export(&df, ExportFormat::Csv, "d.csv").unwrap();
        let text = String::from_utf8(file.bytes).unwrap();
        assert!(text.contains("\n,b\n"));
    }

    #[test]
    fn excel_export_loads_back() {
        let df = sample();
        let file = export(&df, ExportFormat::Excel, "data.csv").unwrap();
        assert_eq!(
            file.content_type,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );

        let back = load_bytes(&file.filename, &file.bytes).unwrap();
        assert_eq!(back.row_count(), 2);
        assert_eq!(back.column_names(), df.column_names());
        let score = back.column_by_name("score").unwrap();
        assert_eq!(score.as_numeric().unwrap(), &[10.5, 20.0]);
    }

    #[test]
    fn html_export_escapes_and_styles() {
        let csv = "col\n<script>\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let file = export(&df, ExportFormat::Html, "page.csv").unwrap();
        let html = String::from_utf8(file.bytes).unwrap();

        assert_eq!(file.content_type, "text/html");
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains(crate::charts::palette::PRIMARY));
    }

    #[test]
    fn datetimes_iso_formatted() {
        let df = sample();
        let file = export(&df, ExportFormat::Csv, "d.csv").unwrap();
        let text = String::from_utf8(file.bytes).unwrap();
        assert!(text.contains("2024-01-02T00:00:00"));
    }
}
