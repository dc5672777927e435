//! Dataset persistence over SQLite.
//!
//! One `datasets` table holds named datasets: metadata columns plus the
//! table contents as row-oriented JSON (record field order preserved)
//! and the semantic type map as a JSON object. Connections are opened
//! per call and dropped immediately; the schema is ensured on every
//! open, so a fresh database file works without a migration step.
//!
//! Saved table contents are immutable: `update_metadata` touches name
//! and description only. `delete` and `update_metadata` report a missing
//! id as `false`, not as an error.

use crate::classify::{ColumnTypeMap, SemanticType};
use crate::config::Config;
use crate::csv_parser::parse_datetime_str;
use crate::dataframe::{CellValue, Column, DataFrame, ValidityBitmap};
use crate::error::LensError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::{debug, warn};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS datasets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    filename TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    data TEXT NOT NULL,
    column_types TEXT NOT NULL
)";

/// Timestamp format stored for datetime cells.
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Metadata-only view of a stored dataset.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DatasetSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub filename: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Fully materialized stored dataset.
#[derive(Debug)]
pub struct DatasetRecord {
    pub summary: DatasetSummary,
    pub table: DataFrame,
    pub types: ColumnTypeMap,
}

/// Handle to the dataset database. Cheap to clone; holds no connection.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    path: PathBuf,
}

impl DatasetStore {
    /// Store backed by the configured database file.
    pub fn from_config(config: &Config) -> Self {
        Self {
            path: config.database_path.clone(),
        }
    }

    /// Store backed by an explicit database file.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn connect(&self) -> Result<Connection, LensError> {
        let conn = Connection::open(&self.path)?;
        conn.execute(SCHEMA, [])?;
        Ok(conn)
    }

    /// Saves a dataset and returns its new id.
    pub fn save(
        &self,
        name: &str,
        description: &str,
        filename: &str,
        table: &DataFrame,
        types: &ColumnTypeMap,
    ) -> Result<i64, LensError> {
        let data = serde_json::to_string(&table_to_records(table))?;
        let type_json = serde_json::to_string(types)?;
        let now = Utc::now().to_rfc3339();

        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO datasets (name, description, filename, created_at, updated_at, data, column_types)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![name, description, filename, now, now, data, type_json],
        )?;
        let id = conn.last_insert_rowid();
        debug!(id, name, rows = table.row_count(), "dataset saved");
        Ok(id)
    }

    /// Lists stored datasets in creation order, metadata only.
    pub fn list(&self) -> Result<Vec<DatasetSummary>, LensError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description, filename, created_at, updated_at
             FROM datasets ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DatasetSummary {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                filename: row.get(3)?,
                created_at: row.get(4)?,
                updated_at: row.get(5)?,
            })
        })?;
        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(row?);
        }
        Ok(summaries)
    }

    /// Loads a dataset with its rebuilt table, or `None` if the id is unknown.
    pub fn get(&self, id: i64) -> Result<Option<DatasetRecord>, LensError> {
        let conn = self.connect()?;
        let row: Option<(DatasetSummary, String, String)> = conn
            .query_row(
                "SELECT id, name, description, filename, created_at, updated_at, data, column_types
                 FROM datasets WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        DatasetSummary {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            description: row.get(2)?,
                            filename: row.get(3)?,
                            created_at: row.get(4)?,
                            updated_at: row.get(5)?,
                        },
                        row.get(6)?,
                        row.get(7)?,
                    ))
                },
            )
            .optional()?;

        let Some((summary, data, type_json)) = row else {
            return Ok(None);
        };
        let types: ColumnTypeMap = serde_json::from_str(&type_json)?;
        let records: Value = serde_json::from_str(&data)?;
        let table = table_from_records(&records, &types)?;
        Ok(Some(DatasetRecord {
            summary,
            table,
            types,
        }))
    }

    /// Deletes a dataset. `false` means the id did not exist.
    pub fn delete(&self, id: i64) -> Result<bool, LensError> {
        let conn = self.connect()?;
        let affected = conn.execute("DELETE FROM datasets WHERE id = ?1", params![id])?;
        if affected == 0 {
            warn!(id, "delete requested for unknown dataset");
        }
        Ok(affected > 0)
    }

    /// Updates name and/or description. `false` means the id did not exist.
    ///
    /// Passing `None` leaves that field untouched.
    pub fn update_metadata(
        &self,
        id: i64,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<bool, LensError> {
        let conn = self.connect()?;
        let now = Utc::now().to_rfc3339();
        let affected = conn.execute(
            "UPDATE datasets SET
                name = COALESCE(?2, name),
                description = COALESCE(?3, description),
                updated_at = ?4
             WHERE id = ?1",
            params![id, name, description, now],
        )?;
        Ok(affected > 0)
    }
}

// ── JSON record conversion ────────────────────────────────────────────

/// Serializes a table as an array of row objects, columns in order.
fn table_to_records(df: &DataFrame) -> Value {
    let mut records = Vec::with_capacity(df.row_count());
    for row_idx in 0..df.row_count() {
        let mut record = Map::new();
        for (name, col) in df.iter() {
            record.insert(name.to_string(), cell_to_json(col.cell(row_idx)));
        }
        records.push(Value::Object(record));
    }
    Value::Array(records)
}

fn cell_to_json(cell: CellValue<'_>) -> Value {
    match cell {
        CellValue::Null => Value::Null,
        // Non-finite floats have no JSON representation; store as null
        CellValue::Number(v) => serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        CellValue::Bool(b) => Value::Bool(b),
        CellValue::Datetime(dt) => Value::String(dt.format(DATETIME_FORMAT).to_string()),
        CellValue::Str(s) => Value::String(s.to_string()),
    }
}

/// Rebuilds a table from row records, guided by the stored type map.
///
/// The type map fixes the column order and the storage type of each
/// rebuilt column; cells that do not fit the expected type come back as
/// missing rather than failing the whole load.
fn table_from_records(records: &Value, types: &ColumnTypeMap) -> Result<DataFrame, LensError> {
    let rows = records
        .as_array()
        .ok_or_else(|| LensError::Serialization("dataset payload is not an array".to_string()))?;

    let mut df = DataFrame::new();
    for (name, semantic) in types.iter() {
        let cells: Vec<&Value> = rows
            .iter()
            .map(|r| r.get(name).unwrap_or(&Value::Null))
            .collect();
        let column = rebuild_column(&cells, semantic);
        df.add_column(name.to_string(), column)?;
    }
    Ok(df)
}

fn rebuild_column(cells: &[&Value], semantic: SemanticType) -> Column {
    let n = cells.len();
    match semantic {
        SemanticType::Numeric => {
            let mut values = Vec::with_capacity(n);
            let mut validity = ValidityBitmap::empty();
            for cell in cells {
                match cell.as_f64() {
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
            Column::numeric(values, validity)
        }
        SemanticType::Datetime => {
            let epoch = chrono::NaiveDateTime::UNIX_EPOCH;
            let mut values = Vec::with_capacity(n);
            let mut validity = ValidityBitmap::empty();
            for cell in cells {
                match cell.as_str().and_then(parse_datetime_str) {
                    Some(dt) => {
                        values.push(dt);
                        validity.push(true);
                    }
                    None => {
                        values.push(epoch);
                        validity.push(false);
                    }
                }
            }
            Column::datetime(values, validity)
        }
        SemanticType::Categorical | SemanticType::Text => {
            let mut values = Vec::with_capacity(n);
            let mut validity = ValidityBitmap::empty();
            for cell in cells {
                let text = match cell {
                    Value::String(s) => Some(s.clone()),
                    Value::Bool(b) => Some(b.to_string()),
                    Value::Number(v) => Some(v.to_string()),
                    _ => None,
                };
                match text {
                    Some(s) => {
                        values.push(s);
                        validity.push(true);
                    }
                    None => {
                        values.push(String::new());
                        validity.push(false);
                    }
                }
            }
            Column::text(values, validity)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
