//! Environment-backed configuration.
//!
//! One knob today: where the dataset database lives. Read once at
//! startup and passed down explicitly; nothing in the crate reads the
//! environment after construction.

use std::path::PathBuf;
use tracing::debug;

/// Environment variable naming the SQLite database file.
pub const DATABASE_PATH_VAR: &str = "DATALENS_DB";

/// Fallback database filename, relative to the working directory.
pub const DEFAULT_DATABASE_PATH: &str = "datalens.db";

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
}

impl Config {
    /// Builds a configuration from the process environment.
    pub fn from_env() -> Self {
        let database_path = match std::env::var(DATABASE_PATH_VAR) {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => {
                debug!(
                    default = DEFAULT_DATABASE_PATH,
                    "{DATABASE_PATH_VAR} not set, using default database path"
                );
                PathBuf::from(DEFAULT_DATABASE_PATH)
            }
        };
        Self { database_path }
    }

    /// Configuration pointing at an explicit database file.
    pub fn with_database_path(path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: path.into(),
        }
    }
}
