//! Per-column descriptive statistics.
//!
//! [`describe`] walks every column of a table and produces one summary
//! per column: numeric columns get the full moment/quantile treatment,
//! everything else gets count/cardinality/mode. Columns the semantic map
//! does not cover are skipped.
//!
//! Numeric metrics are computed over non-missing values only and rounded
//! to 3 decimal places. A numeric column with zero non-missing values
//! still produces a summary (count 0, all metrics absent).
//!
//! # Example
//!
//! ```
//! use datalens::csv_parser::CsvParser;
//! use datalens::classify::classify;
//! use datalens::profiling::{describe, ColumnSummary};
//!
//! let csv = "price,tier\n10.0,A\n20.0,B\n30.0,A\n";
//! let df = CsvParser::new().parse_str(csv).unwrap();
//! let types = classify(&df);
//! let report = describe(&df, &types);
//! assert_eq!(report.len(), 2);
//! match &report[0] {
//!     ColumnSummary::Numeric(s) => assert_eq!(s.mean, Some(20.0)),
//!     _ => panic!("price should be numeric"),
//! }
//! ```

use crate::classify::{ColumnTypeMap, SemanticType};
use crate::dataframe::{CellValue, Column, DataFrame};
use crate::stats;
use serde::Serialize;
use std::collections::HashMap;

/// Summary of a numeric column.
#[derive(Debug, Clone, Serialize)]
pub struct NumericSummary {
    pub name: String,
    /// Non-missing value count.
    pub count: usize,
    pub missing: usize,
    pub missing_pct: f64,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub variance: Option<f64>,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
    pub range: Option<f64>,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
}

/// Summary of a categorical, datetime, or text column.
#[derive(Debug, Clone, Serialize)]
pub struct CategoricalSummary {
    pub name: String,
    /// Non-missing value count.
    pub count: usize,
    pub missing: usize,
    pub missing_pct: f64,
    /// Distinct non-missing values.
    pub unique: usize,
    /// Most frequent value and its count. Absent when every value is missing.
    pub most_common: Option<(String, usize)>,
    /// Share of non-missing values held by the most frequent value.
    pub most_common_pct: Option<f64>,
}

/// One entry of a [`describe`] report.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ColumnSummary {
    Numeric(NumericSummary),
    Categorical(CategoricalSummary),
}

impl ColumnSummary {
    /// Column name, regardless of summary kind.
    pub fn name(&self) -> &str {
        match self {
            Self::Numeric(s) => &s.name,
            Self::Categorical(s) => &s.name,
        }
    }
}

/// Produces one summary per column, in column order.
pub fn describe(df: &DataFrame, types: &ColumnTypeMap) -> Vec<ColumnSummary> {
    df.iter()
        .filter_map(|(name, col)| {
            let semantic = types.get(name)?;
            Some(match semantic {
                SemanticType::Numeric => {
                    ColumnSummary::Numeric(describe_numeric(name, col))
                }
                SemanticType::Categorical | SemanticType::Datetime | SemanticType::Text => {
                    ColumnSummary::Categorical(describe_categorical(name, col))
                }
            })
        })
        .collect()
}

fn describe_numeric(name: &str, col: &Column) -> NumericSummary {
    let values = col.valid_numeric_values().unwrap_or_default();
    let n = col.len();
    let missing = col.null_count();

    let mut sorted = values.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let min = stats::min(&values);
    let max = stats::max(&values);
    let q = |p: f64| {
        if sorted.is_empty() {
            None
        } else {
            Some(stats::quantile_sorted(&sorted, p))
        }
    };

    let r3 = |v: Option<f64>| v.map(stats::round3);
    NumericSummary {
        name: name.to_string(),
        count: values.len(),
        missing,
        missing_pct: missing_pct(missing, n),
        mean: r3(stats::mean(&values)),
        std: r3(stats::std_dev(&values)),
        variance: r3(stats::variance(&values)),
        min: r3(min),
        q1: r3(q(0.25)),
        median: r3(q(0.5)),
        q3: r3(q(0.75)),
        max: r3(max),
        range: r3(min.zip(max).map(|(lo, hi)| hi - lo)),
        skewness: r3(stats::skewness(&values)),
        kurtosis: r3(stats::kurtosis(&values)),
    }
}

fn describe_categorical(name: &str, col: &Column) -> CategoricalSummary {
    let n = col.len();
    let missing = col.null_count();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for idx in 0..n {
        if let Some(label) = display_label(col, idx) {
            *counts.entry(label).or_insert(0) += 1;
        }
    }

    let count: usize = counts.values().sum();
    let unique = counts.len();
    // Ties break on the lexically smaller label so results are stable
    let most_common = counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)));
    let most_common_pct = most_common
        .as_ref()
        .filter(|_| count > 0)
        .map(|(_, c)| stats::round3(*c as f64 / count as f64 * 100.0));

    CategoricalSummary {
        name: name.to_string(),
        count,
        missing,
        missing_pct: missing_pct(missing, n),
        unique,
        most_common,
        most_common_pct,
    }
}

fn missing_pct(missing: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        stats::round3(missing as f64 / total as f64 * 100.0)
    }
}

/// Display string for any non-missing cell of a non-numeric column.
fn display_label(col: &Column, idx: usize) -> Option<String> {
    match col.cell(idx) {
        CellValue::Str(s) => Some(s.to_string()),
        CellValue::Bool(b) => Some(b.to_string()),
        CellValue::Datetime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        CellValue::Number(v) => Some(v.to_string()),
        CellValue::Null => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::csv_parser::CsvParser;
    use crate::dataframe::ValidityBitmap;

    fn numeric_summary(report: &[ColumnSummary], name: &str) -> NumericSummary {
        report
            .iter()
            .find_map(|s| match s {
                ColumnSummary::Numeric(n) if n.name == name => Some(n.clone()),
                _ => None,
            })
            .unwrap_or_else(|| panic!("no numeric summary for '{name}'"))
    }

    fn categorical_summary(report: &[ColumnSummary], name: &str) -> CategoricalSummary {
        report
            .iter()
            .find_map(|s| match s {
                ColumnSummary::Categorical(c) if c.name == name => Some(c.clone()),
                _ => None,
            })
            .unwrap_or_else(|| panic!("no categorical summary for '{name}'"))
    }

    #[test]
    fn one_summary_per_column_in_order() {
        let csv = "a,b,c\n1,x,2024-01-01\n2,y,2024-01-02\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let types = classify(&df);
        let report = describe(&df, &types);
        let names: Vec<&str> = report.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn numeric_metrics() {
        let csv = "x\n1\n2\n3\n4\n5\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let types = classify(&df);
        let s = numeric_summary(&describe(&df, &types), "x");

        assert_eq!(s.count, 5);
        assert_eq!(s.missing, 0);
        assert_eq!(s.mean, Some(3.0));
        assert_eq!(s.min, Some(1.0));
        assert_eq!(s.max, Some(5.0));
        assert_eq!(s.median, Some(3.0));
        assert_eq!(s.q1, Some(2.0));
        assert_eq!(s.q3, Some(4.0));
        assert_eq!(s.range, Some(4.0));
        assert_eq!(s.variance, Some(2.5));
        assert_eq!(s.skewness, Some(0.0));
    }

    #[test]
    fn numeric_metrics_skip_missing() {
        let csv = "x\n1\nNA\n3\nNA\n5\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let types = classify(&df);
        let s = numeric_summary(&describe(&df, &types), "x");

        assert_eq!(s.count, 3);
        assert_eq!(s.missing, 2);
        assert_eq!(s.missing_pct, 40.0);
        assert_eq!(s.mean, Some(3.0));
    }

    #[test]
    fn all_missing_numeric_column() {
        let mut df = DataFrame::new();
        df.add_column(
            "x".into(),
            Column::numeric(vec![0.0; 3], ValidityBitmap::all_invalid(3)),
        )
        .unwrap();
        let types = classify(&df);
        let s = numeric_summary(&describe(&df, &types), "x");

        assert_eq!(s.count, 0);
        assert_eq!(s.missing, 3);
        assert_eq!(s.missing_pct, 100.0);
        assert_eq!(s.mean, None);
        assert_eq!(s.median, None);
        assert_eq!(s.min, None);
    }

    #[test]
    fn categorical_metrics() {
        let csv = "tier\nA\nB\nA\nA\nNA\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let types = classify(&df);
        let s = categorical_summary(&describe(&df, &types), "tier");

        assert_eq!(s.count, 4);
        assert_eq!(s.missing, 1);
        assert_eq!(s.unique, 2);
        assert_eq!(s.most_common, Some(("A".to_string(), 3)));
        assert_eq!(s.most_common_pct, Some(75.0));
    }

    #[test]
    fn all_missing_categorical_has_no_mode() {
        let mut df = DataFrame::new();
        df.add_column(
            "g".into(),
            Column::text(vec![String::new(); 2], ValidityBitmap::all_invalid(2)),
        )
        .unwrap();
        let types = classify(&df);
        let s = categorical_summary(&describe(&df, &types), "g");

        assert_eq!(s.count, 0);
        assert_eq!(s.unique, 0);
        assert_eq!(s.most_common, None);
        assert_eq!(s.most_common_pct, None);
    }

    #[test]
    fn datetime_column_gets_categorical_summary() {
        let csv = "when\n2024-01-01\n2024-01-01\n2024-01-02\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let types = classify(&df);
        let s = categorical_summary(&describe(&df, &types), "when");

        assert_eq!(s.count, 3);
        assert_eq!(s.unique, 2);
        assert_eq!(
            s.most_common,
            Some(("2024-01-01 00:00:00".to_string(), 2))
        );
    }

    #[test]
    fn metrics_are_rounded() {
        let csv = "x\n1\n2\n4\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let types = classify(&df);
        let s = numeric_summary(&describe(&df, &types), "x");
        // mean = 7/3 = 2.333...
        assert_eq!(s.mean, Some(2.333));
    }

    #[test]
    fn serializes_with_kind_tag() {
        let csv = "x\n1\n2\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let types = classify(&df);
        let json = serde_json::to_string(&describe(&df, &types)).unwrap();
        assert!(json.contains("\"kind\":\"numeric\""));
    }
}
