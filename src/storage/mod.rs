//! Durable storage for the action queue.
//!
//! The entire queue state, live queue plus failed set, is persisted as a
//! single snapshot record under a fixed namespace. Adapters implement
//! [`SnapshotStore`] with replace-on-success semantics so a crash mid-write
//! never leaves a torn snapshot behind:
//! - [`FileStore`]: JSON file, written to a temp path then renamed over.
//! - [`SqliteStore`]: one row in a namespace table, replaced in a single
//!   statement.
//! - [`MemoryStore`]: ephemeral, for tests.

mod file;
mod memory;
pub mod migrations;
mod sqlite;

use serde::{Deserialize, Serialize};

use crate::error::OutboxError;
use crate::queue::action::{FailedAction, QueuedAction};

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Namespace key the snapshot is stored under.
pub const SNAPSHOT_NAMESPACE: &str = "outbox.queue.v1";

/// The persisted queue state. Field order in `queue` and `failed_actions`
/// is the insertion order and is significant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    /// Live actions awaiting replay, oldest first.
    pub queue: Vec<QueuedAction>,
    /// Actions whose replay failed, awaiting retry or clear.
    pub failed_actions: Vec<FailedAction>,
}

impl Snapshot {
    /// True when both the live queue and the failed set are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty() && self.failed_actions.is_empty()
    }
}

/// Persistence port for queue snapshots.
///
/// `save` must be atomic: either the full new snapshot becomes durable, or
/// the previous one remains intact and an error is returned.
pub trait SnapshotStore: Send + Sync {
    /// Load the current snapshot. A store with no prior state returns an
    /// empty snapshot, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`OutboxError::Persistence`] if existing state cannot be
    /// read or parsed.
    fn load(&self) -> Result<Snapshot, OutboxError>;

    /// Replace the durable snapshot with `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns [`OutboxError::Persistence`] if the snapshot could not be
    /// written; the previous snapshot must remain readable in that case.
    fn save(&self, snapshot: &Snapshot) -> Result<(), OutboxError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::action::CommandArgs;

    #[test]
    fn test_snapshot_default_is_empty() {
        let snapshot = Snapshot::default();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_snapshot_serializes_with_wire_field_names() {
        let mut snapshot = Snapshot::default();
        snapshot
            .queue
            .push(QueuedAction::new("task.complete", CommandArgs::new()));
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"queue\""));
        assert!(json.contains("\"failedActions\""));
    }

    #[test]
    fn test_snapshot_tolerates_unknown_fields() {
        // Forward compatibility: a newer writer may add fields.
        let json = r#"{"queue": [], "failedActions": [], "schemaHint": 2}"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_snapshot_tolerates_missing_fields() {
        let snapshot: Snapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.is_empty());
    }
}
