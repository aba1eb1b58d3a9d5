//! SQLite journal database utilities.
//!
//! Connection defaults:
//! - `journal_mode = WAL` so readers do not block the writer
//! - `busy_timeout = 5s` to ride out brief contention
//! - `foreign_keys = ON`

pub mod migrations;
pub mod repo;
pub mod schema;

pub use repo::SqliteStore;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::config::EASE_DIR;

/// Busy timeout used for journal connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[must_use]
pub fn db_path(project_root: &Path) -> PathBuf {
    project_root.join(EASE_DIR).join("ease.db")
}

#[must_use]
pub fn lock_path(project_root: &Path) -> PathBuf {
    project_root.join(EASE_DIR).join("lock")
}

/// Open (or create) the journal database, apply runtime pragmas, and
/// migrate the schema to the latest version.
///
/// # Errors
///
/// Returns an error if opening, configuring or migrating the database fails.
pub fn open_store(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create journal directory {}", parent.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("open journal database {}", path.display()))?;

    configure_connection(&conn).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply journal migrations")?;

    Ok(conn)
}

/// Open the journal only if it already exists.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be opened.
pub fn try_open_store(path: &Path) -> Result<Option<Connection>> {
    if !path.exists() {
        return Ok(None);
    }
    open_store(path).map(Some)
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_BUSY_TIMEOUT, db_path, open_store, try_open_store};
    use crate::db::migrations;
    use tempfile::TempDir;

    fn temp_db_path() -> (TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = db_path(dir.path());
        (dir, path)
    }

    #[test]
    fn open_store_sets_wal_busy_timeout_and_fk() {
        let (_dir, path) = temp_db_path();
        let conn = open_store(&path).expect("open journal db");

        let journal_mode: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .expect("query journal_mode");
        assert_eq!(journal_mode.to_ascii_lowercase(), "wal");

        let busy_timeout_ms: u64 = conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .expect("query busy_timeout");
        assert_eq!(
            u128::from(busy_timeout_ms),
            DEFAULT_BUSY_TIMEOUT.as_millis()
        );

        let foreign_keys: i64 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .expect("query foreign_keys");
        assert_eq!(foreign_keys, 1);
    }

    #[test]
    fn open_store_creates_directory_and_migrates() {
        let (_dir, path) = temp_db_path();
        assert!(!path.exists());
        let conn = open_store(&path).expect("open journal db");
        assert!(path.exists());

        let version = migrations::current_schema_version(&conn).expect("schema version query");
        assert_eq!(version, migrations::LATEST_SCHEMA_VERSION);
    }

    #[test]
    fn try_open_store_reports_missing_journal() {
        let (_dir, path) = temp_db_path();
        assert!(try_open_store(&path).expect("probe").is_none());
        open_store(&path).expect("create");
        assert!(try_open_store(&path).expect("probe").is_some());
    }
}
