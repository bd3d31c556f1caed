//! SQLite-backed snapshot store.
//!
//! The snapshot is a single row in the `snapshots` table, keyed by the
//! fixed namespace and replaced in one statement, so SQLite's transaction
//! machinery provides the replace-on-success guarantee.

use std::path::Path;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::OutboxError;
use crate::storage::{migrations, Snapshot, SnapshotStore, SNAPSHOT_NAMESPACE};

/// Snapshot store over a SQLite database, e.g. `~/.outbox/outbox.db`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at a specific path and run migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_at(path: &Path) -> Result<Self, OutboxError> {
        let conn = Connection::open(path).map_err(|e| {
            OutboxError::Persistence(format!("failed to open database {}: {e}", path.display()))
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_in_memory() -> Result<Self, OutboxError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            OutboxError::Persistence(format!("failed to open in-memory database: {e}"))
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, OutboxError> {
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Get the current schema version.
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read.
    pub fn schema_version(&self) -> Result<i32, OutboxError> {
        migrations::get_version(&self.conn.lock())
    }
}

impl SnapshotStore for SqliteStore {
    fn load(&self) -> Result<Snapshot, OutboxError> {
        let conn = self.conn.lock();

        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM snapshots WHERE namespace = ?1",
                [SNAPSHOT_NAMESPACE],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| OutboxError::Persistence(format!("failed to load snapshot: {e}")))?;

        match payload {
            None => Ok(Snapshot::default()),
            Some(payload) => serde_json::from_str(&payload).map_err(|e| {
                OutboxError::Persistence(format!("failed to parse stored snapshot: {e}"))
            }),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), OutboxError> {
        let payload = serde_json::to_string(snapshot)
            .map_err(|e| OutboxError::Persistence(format!("failed to serialize snapshot: {e}")))?;

        let conn = self.conn.lock();
        conn.execute(
            r"INSERT INTO snapshots (namespace, payload, updated_at)
              VALUES (?1, ?2, ?3)
              ON CONFLICT(namespace) DO UPDATE
              SET payload = excluded.payload, updated_at = excluded.updated_at",
            params![SNAPSHOT_NAMESPACE, payload, Utc::now().to_rfc3339()],
        )
        .map_err(|e| OutboxError::Persistence(format!("failed to save snapshot: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::action::{CommandArgs, QueuedAction};
    use tempfile::TempDir;

    #[test]
    fn test_open_in_memory_runs_migrations() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.schema_version().unwrap() > 0);
    }

    #[test]
    fn test_load_empty_database() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let store = SqliteStore::open_in_memory().unwrap();

        let mut snapshot = Snapshot::default();
        snapshot
            .queue
            .push(QueuedAction::new("task.move", CommandArgs::new()));
        store.save(&snapshot).unwrap();

        assert_eq!(store.load().unwrap(), snapshot);
    }

    #[test]
    fn test_save_replaces_single_row() {
        let store = SqliteStore::open_in_memory().unwrap();

        let mut first = Snapshot::default();
        first
            .queue
            .push(QueuedAction::new("task.create", CommandArgs::new()));
        store.save(&first).unwrap();
        store.save(&Snapshot::default()).unwrap();

        assert!(store.load().unwrap().is_empty());

        let conn = store.conn.lock();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_reopen_database_keeps_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");

        let mut snapshot = Snapshot::default();
        snapshot
            .queue
            .push(QueuedAction::new("task.cancel", CommandArgs::new()));

        {
            let store = SqliteStore::open_at(&path).unwrap();
            store.save(&snapshot).unwrap();
        }

        let reopened = SqliteStore::open_at(&path).unwrap();
        assert_eq!(reopened.load().unwrap(), snapshot);
    }
}
