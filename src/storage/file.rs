//! File-backed snapshot store.
//!
//! The snapshot is a single JSON document, written to a sibling temp file
//! and renamed over the previous one. The rename is the commit point: a
//! crash at any earlier moment leaves the old snapshot intact.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::OutboxError;
use crate::storage::{Snapshot, SnapshotStore};

/// Snapshot store over a JSON file, e.g. `~/.outbox/queue.json`.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store over the given file path. The file need not exist yet.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The file this store reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl SnapshotStore for FileStore {
    fn load(&self) -> Result<Snapshot, OutboxError> {
        if !self.path.exists() {
            return Ok(Snapshot::default());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| {
            OutboxError::Persistence(format!("failed to read {}: {e}", self.path.display()))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            OutboxError::Persistence(format!("failed to parse {}: {e}", self.path.display()))
        })
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), OutboxError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                OutboxError::Persistence(format!(
                    "failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let contents = serde_json::to_string_pretty(snapshot)
            .map_err(|e| OutboxError::Persistence(format!("failed to serialize snapshot: {e}")))?;

        let temp = self.temp_path();
        let mut file = fs::File::create(&temp).map_err(|e| {
            OutboxError::Persistence(format!("failed to create {}: {e}", temp.display()))
        })?;
        file.write_all(contents.as_bytes()).map_err(|e| {
            OutboxError::Persistence(format!("failed to write {}: {e}", temp.display()))
        })?;
        file.sync_all().map_err(|e| {
            OutboxError::Persistence(format!("failed to sync {}: {e}", temp.display()))
        })?;
        drop(file);

        fs::rename(&temp, &self.path).map_err(|e| {
            OutboxError::Persistence(format!(
                "failed to replace {}: {e}",
                self.path.display()
            ))
        })
    }
}
