//! Database migrations for the SQLite snapshot store.
//!
//! Each migration upgrades the schema by one version. Migrations run
//! automatically when the database is opened.

use rusqlite::Connection;

use crate::error::OutboxError;

/// Current schema version.
const CURRENT_VERSION: i32 = 1;

/// Get the current schema version from the database.
///
/// Returns 0 if no version has been set (new database).
///
/// # Errors
///
/// Returns an error if the version pragma cannot be read.
pub fn get_version(conn: &Connection) -> Result<i32, OutboxError> {
    let version: i32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| OutboxError::Persistence(format!("failed to get schema version: {e}")))?;

    Ok(version)
}

/// Set the schema version in the database.
fn set_version(conn: &Connection, version: i32) -> Result<(), OutboxError> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
        .map_err(|e| OutboxError::Persistence(format!("failed to set schema version: {e}")))
}

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if a migration fails.
pub fn run(conn: &Connection) -> Result<(), OutboxError> {
    let current = get_version(conn)?;

    if current >= CURRENT_VERSION {
        return Ok(());
    }

    for version in (current + 1)..=CURRENT_VERSION {
        run_migration(conn, version)?;
        set_version(conn, version)?;
    }

    Ok(())
}

/// Run a specific migration.
fn run_migration(conn: &Connection, version: i32) -> Result<(), OutboxError> {
    match version {
        1 => migrate_v1(conn),
        _ => Err(OutboxError::Persistence(format!(
            "unknown migration version: {version}"
        ))),
    }
}

/// Migration v1: snapshot table keyed by namespace.
fn migrate_v1(conn: &Connection) -> Result<(), OutboxError> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS snapshots (
            namespace TEXT PRIMARY KEY,
            payload TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        ",
    )
    .map_err(|e| OutboxError::Persistence(format!("migration v1 failed: {e}")))
}
