//! Declarative chart specifications.
//!
//! Each builder validates its inputs against the table and produces a
//! serde-serializable [`ChartSpec`] the front-end renderer draws; no
//! drawing happens here. Colors come from the fixed dashboard palette.
//!
//! # Example
//!
//! ```
//! use datalens::csv_parser::CsvParser;
//! use datalens::classify::classify;
//! use datalens::charts::{scatter, ChartSpec};
//!
//! let csv = "x,y\n1,2\n2,4\n3,6\n";
//! let df = CsvParser::new().parse_str(csv).unwrap();
//! let types = classify(&df);
//! match scatter(&df, &types, "x", "y", None).unwrap() {
//!     ChartSpec::Scatter(s) => assert!(s.trendline.is_some()),
//!     _ => unreachable!(),
//! }
//! ```

use crate::analysis::{correlation, CorrelationOutcome};
use crate::classify::{ColumnTypeMap, SemanticType};
use crate::dataframe::{Column, DataFrame};
use crate::error::LensError;
use crate::stats;
use serde::Serialize;
use std::collections::HashMap;

/// Dashboard color palette.
pub mod palette {
    pub const PRIMARY: &str = "#1E88E5";
    pub const SECONDARY: &str = "#7CB342";
    pub const BACKGROUND: &str = "#FAFAFA";
    pub const TEXT: &str = "#212121";
    pub const ACCENT: &str = "#FFA000";

    /// Cycle used for multi-series charts.
    pub const SERIES_CYCLE: &[&str] = &[PRIMARY, SECONDARY, ACCENT, "#8E24AA", "#00897B"];
}

/// Box plots keep at most this many groups, by descending frequency.
const MAX_BOX_GROUPS: usize = 20;

// ── Spec types ────────────────────────────────────────────────────────

/// A complete chart description, tagged by kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartSpec {
    Scatter(ScatterChart),
    Histogram(HistogramChart),
    Box(BoxChart),
    Heatmap(HeatmapChart),
}

#[derive(Debug, Clone, Serialize)]
pub struct ScatterChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<ScatterSeries>,
    /// Present only for uncolored scatters with at least 2 valid pairs.
    pub trendline: Option<Trendline>,
    /// Pearson r annotation, paired with the trendline.
    pub annotation: Option<String>,
    pub background: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScatterSeries {
    /// Group label; absent for the single uncolored series.
    pub label: Option<String>,
    pub color: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Least-squares line segment spanning the data's x range.
#[derive(Debug, Clone, Serialize)]
pub struct Trendline {
    pub slope: f64,
    pub intercept: f64,
    pub x_start: f64,
    pub x_end: f64,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistogramChart {
    pub title: String,
    pub x_label: String,
    pub bins: Vec<HistogramBin>,
    pub mean_marker: f64,
    pub median_marker: f64,
    pub color: String,
    pub background: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoxChart {
    pub title: String,
    pub value_label: String,
    pub groups: Vec<BoxGroup>,
    /// True when more groups existed than are shown.
    pub truncated: bool,
    pub color: String,
    pub background: String,
}

/// Five-number summary for one box.
#[derive(Debug, Clone, Serialize)]
pub struct BoxGroup {
    /// Absent for the single ungrouped box.
    pub label: Option<String>,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatmapChart {
    pub title: String,
    pub names: Vec<String>,
    /// Correlation grid; `None` cells had no usable relationship.
    pub values: Vec<Vec<Option<f64>>>,
    pub z_min: f64,
    pub z_max: f64,
    pub color_scale: String,
    pub background: String,
}

// ── Builders ──────────────────────────────────────────────────────────

/// Scatter plot of two numeric columns, optionally colored by a third.
///
/// Without a color column the spec carries a trendline and a Pearson r
/// annotation when at least 2 complete pairs exist.
pub fn scatter(
    df: &DataFrame,
    types: &ColumnTypeMap,
    x: &str,
    y: &str,
    color: Option<&str>,
) -> Result<ChartSpec, LensError> {
    let x_col = numeric_column(df, types, x)?;
    let y_col = numeric_column(df, types, y)?;
    let xv = x_col.as_numeric().expect("validated numeric");
    let yv = y_col.as_numeric().expect("validated numeric");

    let mut chart = ScatterChart {
        title: format!("{y} vs {x}"),
        x_label: x.to_string(),
        y_label: y.to_string(),
        series: Vec::new(),
        trendline: None,
        annotation: None,
        background: palette::BACKGROUND.to_string(),
    };

    match color {
        Some(color_name) => {
            let color_col =
                df.column_by_name(color_name)
                    .ok_or_else(|| LensError::ColumnNotFound {
                        name: color_name.to_string(),
                    })?;
            // Rows missing any of x, y, or the color label are dropped
            let mut by_label: Vec<(String, Vec<f64>, Vec<f64>)> = Vec::new();
            for idx in 0..df.row_count() {
                if !(x_col.is_valid(idx) && y_col.is_valid(idx)) {
                    continue;
                }
                let Some(label) = color_col.label_at(idx) else {
                    continue;
                };
                match by_label.iter_mut().find(|(l, _, _)| *l == label) {
                    Some((_, xs, ys)) => {
                        xs.push(xv[idx]);
                        ys.push(yv[idx]);
                    }
                    None => by_label.push((label, vec![xv[idx]], vec![yv[idx]])),
                }
            }
            chart.series = by_label
                .into_iter()
                .enumerate()
                .map(|(i, (label, xs, ys))| ScatterSeries {
                    label: Some(label),
                    color: palette::SERIES_CYCLE[i % palette::SERIES_CYCLE.len()].to_string(),
                    x: xs,
                    y: ys,
                })
                .collect();
        }
        None => {
            let mut xs = Vec::new();
            let mut ys = Vec::new();
            for idx in 0..df.row_count() {
                if x_col.is_valid(idx) && y_col.is_valid(idx) {
                    xs.push(xv[idx]);
                    ys.push(yv[idx]);
                }
            }
            if let (Some((slope, intercept)), Some(r)) =
                (stats::linear_fit(&xs, &ys), stats::pearson(&xs, &ys))
            {
                chart.trendline = Some(Trendline {
                    slope,
                    intercept,
                    x_start: stats::min(&xs).expect("non-empty after fit"),
                    x_end: stats::max(&xs).expect("non-empty after fit"),
                    color: palette::ACCENT.to_string(),
                });
                chart.annotation = Some(format!("r = {}", stats::round3(r)));
            }
            chart.series.push(ScatterSeries {
                label: None,
                color: palette::PRIMARY.to_string(),
                x: xs,
                y: ys,
            });
        }
    }

    Ok(ChartSpec::Scatter(chart))
}

/// Histogram of a numeric column with caller-chosen bin count.
///
/// Bins are uniform over the value range; a constant column gets a
/// unit-width window centered on the value so every bin is well-formed.
pub fn histogram(
    df: &DataFrame,
    types: &ColumnTypeMap,
    column: &str,
    bin_count: usize,
) -> Result<ChartSpec, LensError> {
    if bin_count == 0 {
        return Err(LensError::InvalidChart(
            "histogram requires at least 1 bin".to_string(),
        ));
    }
    let col = numeric_column(df, types, column)?;
    let values = col.valid_numeric_values().expect("validated numeric");
    if values.is_empty() {
        return Err(LensError::InsufficientData {
            min_required: 1,
            actual: 0,
        });
    }

    let lo = stats::min(&values).expect("non-empty");
    let hi = stats::max(&values).expect("non-empty");
    let (lo, hi) = if lo == hi {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    };
    let width = (hi - lo) / bin_count as f64;

    let mut counts = vec![0usize; bin_count];
    for &v in &values {
        let mut idx = ((v - lo) / width) as usize;
        if idx >= bin_count {
            idx = bin_count - 1; // max value lands in the last bin
        }
        counts[idx] += 1;
    }

    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: lo + i as f64 * width,
            end: lo + (i + 1) as f64 * width,
            count,
        })
        .collect();

    Ok(ChartSpec::Histogram(HistogramChart {
        title: format!("Distribution of {column}"),
        x_label: column.to_string(),
        bins,
        mean_marker: stats::mean(&values).expect("non-empty"),
        median_marker: stats::median(&values).expect("non-empty"),
        color: palette::PRIMARY.to_string(),
        background: palette::BACKGROUND.to_string(),
    }))
}

/// Box plot of a numeric column, optionally split by a grouping column.
///
/// More than 20 distinct groups are cut to the 20 most frequent and the
/// chart is marked (and titled) as truncated.
pub fn box_plot(
    df: &DataFrame,
    types: &ColumnTypeMap,
    value: &str,
    group: Option<&str>,
) -> Result<ChartSpec, LensError> {
    let value_col = numeric_column(df, types, value)?;
    let values = value_col.as_numeric().expect("validated numeric");

    let mut chart = BoxChart {
        title: match group {
            Some(g) => format!("{value} by {g}"),
            None => format!("Distribution of {value}"),
        },
        value_label: value.to_string(),
        groups: Vec::new(),
        truncated: false,
        color: palette::SECONDARY.to_string(),
        background: palette::BACKGROUND.to_string(),
    };

    match group {
        Some(group_name) => {
            let group_col =
                df.column_by_name(group_name)
                    .ok_or_else(|| LensError::ColumnNotFound {
                        name: group_name.to_string(),
                    })?;
            let mut buckets: HashMap<String, Vec<f64>> = HashMap::new();
            for idx in 0..df.row_count() {
                if !value_col.is_valid(idx) {
                    continue;
                }
                if let Some(label) = group_col.label_at(idx) {
                    buckets.entry(label).or_default().push(values[idx]);
                }
            }
            if buckets.is_empty() {
                return Err(LensError::InsufficientData {
                    min_required: 1,
                    actual: 0,
                });
            }

            let mut ordered: Vec<(String, Vec<f64>)> = buckets.into_iter().collect();
            // Most frequent first; ties break alphabetically for stability
            ordered.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(&b.0)));
            if ordered.len() > MAX_BOX_GROUPS {
                ordered.truncate(MAX_BOX_GROUPS);
                chart.truncated = true;
                chart.title.push_str(" (Top 20 Groups)");
            }
            chart.groups = ordered
                .into_iter()
                .map(|(label, vals)| five_number_summary(Some(label), vals))
                .collect();
        }
        None => {
            let vals = value_col.valid_numeric_values().expect("validated numeric");
            if vals.is_empty() {
                return Err(LensError::InsufficientData {
                    min_required: 1,
                    actual: 0,
                });
            }
            chart.groups.push(five_number_summary(None, vals));
        }
    }

    Ok(ChartSpec::Box(chart))
}

/// Correlation heatmap over all numeric columns.
///
/// The color scale is fixed to `[-1, 1]` so hues are comparable across
/// datasets. Fewer than 2 numeric columns is an error here (unlike the
/// tabular correlation view, a heatmap of one cell is meaningless).
pub fn correlation_heatmap(
    df: &DataFrame,
    types: &ColumnTypeMap,
) -> Result<ChartSpec, LensError> {
    match correlation(df, types) {
        CorrelationOutcome::Matrix(m) => Ok(ChartSpec::Heatmap(HeatmapChart {
            title: "Correlation Heatmap".to_string(),
            names: m.names,
            values: m.values,
            z_min: -1.0,
            z_max: 1.0,
            color_scale: "RdBu_r".to_string(),
            background: palette::BACKGROUND.to_string(),
        })),
        CorrelationOutcome::Insufficient { reason } => Err(LensError::InvalidChart(reason)),
    }
}

// ── Helpers ───────────────────────────────────────────────────────────

fn numeric_column<'a>(
    df: &'a DataFrame,
    types: &ColumnTypeMap,
    name: &str,
) -> Result<&'a Column, LensError> {
    let col = df
        .column_by_name(name)
        .ok_or_else(|| LensError::ColumnNotFound {
            name: name.to_string(),
        })?;
    if types.get(name) != Some(SemanticType::Numeric) || col.as_numeric().is_none() {
        return Err(LensError::NonNumericColumn {
            name: name.to_string(),
        });
    }
    Ok(col)
}

fn five_number_summary(label: Option<String>, mut vals: Vec<f64>) -> BoxGroup {
    vals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    BoxGroup {
        label,
        count: vals.len(),
        min: vals[0],
        q1: stats::quantile_sorted(&vals, 0.25),
        median: stats::quantile_sorted(&vals, 0.5),
        q3: stats::quantile_sorted(&vals, 0.75),
        max: vals[vals.len() - 1],
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
