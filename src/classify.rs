//! Column semantic classification.
//!
//! Maps every column of a [`DataFrame`] to one of four semantic classes
//! the analysis layer works with. The map is derived from the table and
//! is recomputed whenever the table changes identity; it is persisted
//! with saved datasets but never treated as authoritative.
//!
//! # Rules
//!
//! 1. Numeric storage → [`SemanticType::Numeric`] (all-missing numeric
//!    columns included).
//! 2. Datetime storage → [`SemanticType::Datetime`].
//! 3. Anything else: with `u` distinct non-missing values over `n` rows,
//!    `u < 10` or `u/n < 0.05` → [`SemanticType::Categorical`],
//!    otherwise [`SemanticType::Text`]. Empty columns (`u == 0`) are
//!    Categorical by convention, so `n == 0` never divides by zero.
//!
//! # Example
//!
//! ```
//! use datalens::dataframe::{DataFrame, Column, ValidityBitmap};
//! use datalens::classify::{classify, SemanticType};
//!
//! let mut df = DataFrame::new();
//! df.add_column(
//!     "price".into(),
//!     Column::numeric(vec![9.5, 12.0, 7.25], ValidityBitmap::all_valid(3)),
//! ).unwrap();
//! df.add_column(
//!     "tier".into(),
//!     Column::text(vec!["A".into(), "B".into(), "A".into()], ValidityBitmap::all_valid(3)),
//! ).unwrap();
//!
//! let map = classify(&df);
//! assert_eq!(map.get("price"), Some(SemanticType::Numeric));
//! assert_eq!(map.get("tier"), Some(SemanticType::Categorical)); // u = 2 < 10
//! ```

use crate::dataframe::{Column, DataFrame, DataType};
use serde::{Deserialize, Serialize};

/// Distinct-count threshold below which a column is always categorical.
const CATEGORICAL_MAX_DISTINCT: usize = 10;

/// Distinct-to-row ratio below which a column is categorical.
const CATEGORICAL_MAX_RATIO: f64 = 0.05;

/// Semantic class of a column, as seen by the analysis layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    /// Continuous or integer values; eligible for descriptive stats,
    /// correlation, and distribution analysis.
    Numeric,
    /// Low-cardinality labels; eligible for grouping and coloring.
    Categorical,
    /// Timestamps.
    Datetime,
    /// High-cardinality or free-form strings.
    Text,
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric => write!(f, "numeric"),
            Self::Categorical => write!(f, "categorical"),
            Self::Datetime => write!(f, "datetime"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// Ordered column-name → [`SemanticType`] mapping covering every column
/// of the table it was derived from exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnTypeMap {
    entries: Vec<(String, SemanticType)>,
}

impl ColumnTypeMap {
    /// Returns the semantic type for `name`, if present.
    pub fn get(&self, name: &str) -> Option<SemanticType> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, t)| t)
    }

    /// Iterates entries in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, SemanticType)> {
        self.entries.iter().map(|&(ref n, t)| (n.as_str(), t))
    }

    /// Returns the number of mapped columns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no columns are mapped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Column names with the given semantic type, in column order.
    pub fn columns_of(&self, ty: SemanticType) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|&&(_, t)| t == ty)
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// Shorthand for [`Self::columns_of`] with [`SemanticType::Numeric`].
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns_of(SemanticType::Numeric)
    }
}

/// Classifies every column of the table, producing a complete
/// [`ColumnTypeMap`] (no omissions, no duplicates).
pub fn classify(df: &DataFrame) -> ColumnTypeMap {
    let n = df.row_count();
    let entries = df
        .iter()
        .map(|(name, col)| (name.to_string(), classify_column(col, n)))
        .collect();
    ColumnTypeMap { entries }
}

fn classify_column(col: &Column, row_count: usize) -> SemanticType {
    match col.data_type() {
        DataType::Numeric => SemanticType::Numeric,
        DataType::Datetime => SemanticType::Datetime,
        DataType::Boolean | DataType::Categorical | DataType::Text => {
            let u = col.distinct_count();
            if u == 0 || u < CATEGORICAL_MAX_DISTINCT {
                return SemanticType::Categorical;
            }
            // u >= 10 implies row_count > 0, so the ratio is well-defined
            if (u as f64) / (row_count as f64) < CATEGORICAL_MAX_RATIO {
                SemanticType::Categorical
            } else {
                SemanticType::Text
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
