//! # datalens
//!
//! Analysis core of a tabular analytics dashboard.
//!
//! datalens takes an uploaded CSV or Excel file and turns it into the
//! artifacts a dashboard renders: typed tables, column semantics,
//! statistics, chart specifications, and exports. It operates in three
//! layers:
//!
//! - **Ingest** — parse files into a typed, missing-aware table
//! - **Analyze** — pure statistics over that table
//! - **Serve** — persistence, sessions, chart specs, exports
//!
//! ## Modules
//!
//! - [`dataframe`] — Column-major tabular data model (DataFrame, Column, DataType)
//! - [`csv_parser`] — CSV parsing with automatic type inference
//! - [`loader`] — CSV/Excel ingestion, delimiter sniffing, cleanup passes
//! - [`classify`] — Semantic column classification (numeric/categorical/datetime/text)
//! - [`profiling`] — Per-column descriptive statistics
//! - [`analysis`] — Correlation matrices, grouped statistics
//! - [`distribution`] — Normality testing (Shapiro-Wilk), skewness, outliers
//! - [`charts`] — Declarative chart specifications (scatter, histogram, box, heatmap)
//! - [`store`] — SQLite-backed dataset persistence
//! - [`session`] — In-process accounts and the session auth gate
//! - [`export`] — CSV/Excel/HTML export
//! - [`config`] — Environment-backed configuration
//! - [`stats`] — Shared sample-statistics helpers
//! - [`error`] — Error types
//!
//! ## Quick Start
//!
//! ```
//! use datalens::loader::load_bytes;
//! use datalens::classify::{classify, SemanticType};
//! use datalens::profiling::describe;
//!
//! let csv = b"product,price,tier\nwidget,9.50,A\ngadget,12.00,B\ndoodad,7.25,A\n";
//! let df = load_bytes("catalog.csv", csv).unwrap();
//!
//! let types = classify(&df);
//! assert_eq!(types.get("price"), Some(SemanticType::Numeric));
//! assert_eq!(types.get("tier"), Some(SemanticType::Categorical));
//!
//! let report = describe(&df, &types);
//! assert_eq!(report.len(), 3);
//! ```

pub mod analysis;
pub mod charts;
pub mod classify;
pub mod config;
pub mod csv_parser;
pub mod dataframe;
pub mod distribution;
pub mod error;
pub mod export;
pub mod loader;
pub mod profiling;
pub mod session;
pub mod stats;
pub mod store;
