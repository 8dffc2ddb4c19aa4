// Database module

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use anyhow::Result;
use rusqlite::Connection;

use crate::constants::{APP_NAME, DB_FILENAME, REPORT_FOLDER};

/// Per-application data directory, created on first use.
pub fn data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", APP_NAME)
        .ok_or_else(|| anyhow::anyhow!("Could not determine application data directory"))?;
    let dir = dirs.data_dir().to_path_buf();
    std::fs::create_dir_all(&dir).map_err(|e| {
        anyhow::anyhow!(
            "Cannot create data directory {}: {}. Check directory permissions.",
            dir.display(),
            e
        )
    })?;
    Ok(dir)
}

/// Default database path inside the data directory.
pub fn default_db_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(DB_FILENAME))
}

/// Default root of the report tree inside the data directory.
pub fn default_report_dir() -> Result<PathBuf> {
    Ok(data_dir()?.join(REPORT_FOLDER))
}

/// Open or create a database at the given path
pub fn open_db(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;

    // Pragmas must be set per connection
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.execute_batch("PRAGMA busy_timeout = 5000;")?;

    // Run migrations
    migrations::run_migrations(&conn)?;

    Ok(conn)
}
