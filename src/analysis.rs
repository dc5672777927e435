//! Cross-column analysis: correlation matrices and grouped statistics.
//!
//! Correlation uses pairwise-complete observations: for each column pair,
//! only rows where both values are non-missing contribute. Coefficients
//! are rounded to 3 decimal places, the matrix is exactly symmetric with
//! a unit diagonal, and a pair with no usable relationship (fewer than 2
//! complete rows, or zero variance on either side) yields `None`.
//!
//! Grouped statistics aggregate one numeric column by the labels of a
//! grouping column. Rows where either the key or the value is missing are
//! dropped. A group with a single row has no standard deviation, and a
//! group whose mean is zero has an undefined coefficient of variation;
//! both cases are carried as explicit markers rather than NaN.

use crate::classify::{ColumnTypeMap, SemanticType};
use crate::dataframe::{Column, DataFrame};
use crate::error::LensError;
use crate::stats;
use serde::Serialize;
use std::collections::HashMap;

/// Minimum numeric columns for a correlation matrix.
const MIN_CORRELATION_COLUMNS: usize = 2;

// ── Correlation ───────────────────────────────────────────────────────

/// Pearson correlation matrix over the table's numeric columns.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    /// Numeric column names, in column order. Row/column `i` of
    /// `values` corresponds to `names[i]`.
    pub names: Vec<String>,
    /// Symmetric matrix with unit diagonal. `None` marks a pair with
    /// fewer than 2 complete observations or zero variance.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Coefficient for a named pair, if both columns are present.
    pub fn get(&self, a: &str, b: &str) -> Option<Option<f64>> {
        let i = self.names.iter().position(|n| n == a)?;
        let j = self.names.iter().position(|n| n == b)?;
        Some(self.values[i][j])
    }
}

/// Result of a correlation request.
///
/// Too few numeric columns is an expected outcome for real datasets, not
/// a failure, so it is carried as a tagged variant the dashboard can
/// render as a notice.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CorrelationOutcome {
    Matrix(CorrelationMatrix),
    Insufficient { reason: String },
}

/// Computes the correlation matrix over all numeric columns.
pub fn correlation(df: &DataFrame, types: &ColumnTypeMap) -> CorrelationOutcome {
    let names: Vec<String> = types
        .numeric_columns()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    if names.len() < MIN_CORRELATION_COLUMNS {
        return CorrelationOutcome::Insufficient {
            reason: format!(
                "correlation requires at least {MIN_CORRELATION_COLUMNS} numeric columns, found {}",
                names.len()
            ),
        };
    }

    let columns: Vec<&Column> = names
        .iter()
        .filter_map(|n| df.column_by_name(n))
        .collect();
    let k = columns.len();
    let mut values = vec![vec![None; k]; k];

    for i in 0..k {
        values[i][i] = Some(1.0);
        for j in (i + 1)..k {
            let r = pairwise_pearson(columns[i], columns[j]).map(stats::round3);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationOutcome::Matrix(CorrelationMatrix { names, values })
}

/// Pearson r over rows where both columns are non-missing.
fn pairwise_pearson(a: &Column, b: &Column) -> Option<f64> {
    let (av, bv) = (a.as_numeric()?, b.as_numeric()?);
    let n = av.len().min(bv.len());
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for i in 0..n {
        if a.is_valid(i) && b.is_valid(i) {
            xs.push(av[i]);
            ys.push(bv[i]);
        }
    }
    stats::pearson(&xs, &ys)
}

// ── Grouped statistics ────────────────────────────────────────────────

/// Coefficient of variation: `std / mean * 100`.
///
/// Undefined when the group mean is zero; serialized as the string
/// `"undefined"` so the dashboard can render it verbatim.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cv {
    Value(f64),
    Undefined,
}

impl Serialize for Cv {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => serializer.serialize_f64(*v),
            Self::Undefined => serializer.serialize_str("undefined"),
        }
    }
}

/// Aggregates for one group, all rounded to 3 decimal places.
#[derive(Debug, Clone, Serialize)]
pub struct GroupRow {
    pub group: String,
    pub count: usize,
    pub mean: f64,
    /// Absent for singleton groups.
    pub std: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub cv: Cv,
}

/// Computes per-group statistics of `value_col` keyed by `group_col`.
///
/// Rows are sorted by group label. Returns an error if either column is
/// missing, the value column is not numeric, or no complete rows remain.
pub fn grouped_statistics(
    df: &DataFrame,
    group_col: &str,
    value_col: &str,
) -> Result<Vec<GroupRow>, LensError> {
    let keys = df
        .column_by_name(group_col)
        .ok_or_else(|| LensError::ColumnNotFound {
            name: group_col.to_string(),
        })?;
    let values_col = df
        .column_by_name(value_col)
        .ok_or_else(|| LensError::ColumnNotFound {
            name: value_col.to_string(),
        })?;
    let values = values_col
        .as_numeric()
        .ok_or_else(|| LensError::NonNumericColumn {
            name: value_col.to_string(),
        })?;

    let mut groups: HashMap<String, Vec<f64>> = HashMap::new();
    for idx in 0..df.row_count() {
        if !values_col.is_valid(idx) {
            continue;
        }
        if let Some(label) = keys.label_at(idx) {
            groups.entry(label).or_default().push(values[idx]);
        }
    }

    if groups.is_empty() {
        return Err(LensError::InsufficientData {
            min_required: 1,
            actual: 0,
        });
    }

    let mut rows: Vec<GroupRow> = groups
        .into_iter()
        .map(|(group, mut vals)| {
            vals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let mean = stats::mean(&vals).unwrap_or(0.0);
            let std = stats::std_dev(&vals);
            let cv = match std {
                Some(s) if mean != 0.0 => Cv::Value(stats::round3(s / mean * 100.0)),
                Some(_) => Cv::Undefined,
                None => Cv::Undefined,
            };
            GroupRow {
                group,
                count: vals.len(),
                mean: stats::round3(mean),
                std: std.map(stats::round3),
                min: stats::round3(vals[0]),
                q1: stats::round3(stats::quantile_sorted(&vals, 0.25)),
                median: stats::round3(stats::quantile_sorted(&vals, 0.5)),
                q3: stats::round3(stats::quantile_sorted(&vals, 0.75)),
                max: stats::round3(vals[vals.len() - 1]),
                cv,
            }
        })
        .collect();
    rows.sort_by(|a, b| a.group.cmp(&b.group));
    Ok(rows)
}

/// Columns usable as grouping keys: categorical semantics only.
pub fn groupable_columns<'a>(types: &'a ColumnTypeMap) -> Vec<&'a str> {
    types.columns_of(SemanticType::Categorical)
}

// ── Tests ─────────────────────────────────────────────────────────────
