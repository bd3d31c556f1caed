//! In-memory snapshot store (useful for testing).

use parking_lot::Mutex;

use crate::error::OutboxError;
use crate::storage::{Snapshot, SnapshotStore};

/// Ephemeral store backed by process memory. State is lost on drop.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<Snapshot>,
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Snapshot, OutboxError> {
        Ok(self.state.lock().clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), OutboxError> {
        *self.state.lock() = snapshot.clone();
        Ok(())
    }
}
