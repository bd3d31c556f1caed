//! Durable queue store.
//!
//! Holds the live queue and the failed set in memory, persisting through an
//! injected [`SnapshotStore`] port. Every mutation is copy-on-write: the
//! next snapshot is built, saved, and only then swapped in, so a
//! persistence failure leaves both memory and disk on the previous state
//! and concurrent readers never observe a torn intermediate.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::error::OutboxError;
use crate::queue::action::{CommandArgs, FailedAction, QueuedAction};
use crate::storage::{Snapshot, SnapshotStore};

/// Ordered, durable collection of pending actions plus the failed set.
pub struct QueueStore {
    state: Mutex<Snapshot>,
    port: Box<dyn SnapshotStore>,
}

impl QueueStore {
    /// Open a store over a persistence port, loading any existing snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the existing snapshot cannot be read.
    pub fn open(port: Box<dyn SnapshotStore>) -> Result<Self, OutboxError> {
        let state = port.load()?;
        Ok(Self {
            state: Mutex::new(state),
            port,
        })
    }

    /// Persist `next`, then commit it as the current state.
    fn commit(&self, current: &mut Snapshot, next: Snapshot) -> Result<(), OutboxError> {
        self.port.save(&next)?;
        *current = next;
        Ok(())
    }

    /// Append a new action to the tail of the live queue and return its id.
    ///
    /// The durable snapshot reflects the new entry before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`OutboxError::Persistence`] if the snapshot could not be
    /// written; the queue is then unchanged.
    pub fn enqueue(&self, command: &str, args: CommandArgs) -> Result<String, OutboxError> {
        let mut state = self.state.lock();
        let action = QueuedAction::new(command, args);
        let id = action.id.clone();

        let mut next = state.clone();
        next.queue.push(action);
        self.commit(&mut state, next)?;
        Ok(id)
    }

    /// Remove a live action by id, preserving the relative order of the
    /// remainder. Returns `Ok(false)` when the id is not present: callers
    /// may race a drain cycle, so a missing id is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only if persisting the updated snapshot fails.
    pub fn remove(&self, id: &str) -> Result<bool, OutboxError> {
        let mut state = self.state.lock();
        if !state.queue.iter().any(|a| a.id == id) {
            return Ok(false);
        }

        let mut next = state.clone();
        next.queue.retain(|a| a.id != id);
        self.commit(&mut state, next)?;
        Ok(true)
    }

    /// Move a live action into the failed set, recording the error and
    /// incrementing its retry count. Returns `Ok(false)` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error only if persisting the updated snapshot fails.
    pub fn mark_failed(&self, id: &str, error: &str) -> Result<bool, OutboxError> {
        let mut state = self.state.lock();
        let Some(pos) = state.queue.iter().position(|a| a.id == id) else {
            return Ok(false);
        };

        let mut next = state.clone();
        let action = next.queue.remove(pos);
        next.failed_actions.push(FailedAction::from_action(action, error));
        self.commit(&mut state, next)?;
        Ok(true)
    }

    /// Move a failed action back to the tail of the live queue with a
    /// refreshed timestamp and unchanged retry count. Returns `Ok(false)`
    /// when the id is not in the failed set.
    ///
    /// # Errors
    ///
    /// Returns an error only if persisting the updated snapshot fails.
    pub fn retry(&self, id: &str) -> Result<bool, OutboxError> {
        let mut state = self.state.lock();
        let Some(pos) = state.failed_actions.iter().position(|f| f.action.id == id) else {
            return Ok(false);
        };

        let mut next = state.clone();
        let failed = next.failed_actions.remove(pos);
        next.queue.push(failed.into_retry(Utc::now()));
        self.commit(&mut state, next)?;
        Ok(true)
    }

    /// Empty the live queue. The failed set is untouched.
    ///
    /// # Errors
    ///
    /// Returns an error only if persisting the updated snapshot fails.
    pub fn clear(&self) -> Result<usize, OutboxError> {
        let mut state = self.state.lock();
        let count = state.queue.len();
        if count == 0 {
            return Ok(0);
        }

        let mut next = state.clone();
        next.queue.clear();
        self.commit(&mut state, next)?;
        Ok(count)
    }

    /// Empty the failed set. The live queue is untouched.
    ///
    /// # Errors
    ///
    /// Returns an error only if persisting the updated snapshot fails.
    pub fn clear_failed(&self) -> Result<usize, OutboxError> {
        let mut state = self.state.lock();
        let count = state.failed_actions.len();
        if count == 0 {
            return Ok(0);
        }

        let mut next = state.clone();
        next.failed_actions.clear();
        self.commit(&mut state, next)?;
        Ok(count)
    }

    /// Remove and return every live action queued at or before `cutoff`,
    /// preserving the order of survivors. The failed set is untouched.
    ///
    /// # Errors
    ///
    /// Returns an error only if persisting the updated snapshot fails.
    pub fn take_stale(&self, cutoff: DateTime<Utc>) -> Result<Vec<QueuedAction>, OutboxError> {
        let mut state = self.state.lock();
        if !state.queue.iter().any(|a| a.enqueued_at <= cutoff) {
            return Ok(Vec::new());
        }

        let mut next = state.clone();
        let (stale, keep): (Vec<_>, Vec<_>) = next
            .queue
            .drain(..)
            .partition(|a| a.enqueued_at <= cutoff);
        next.queue = keep;
        self.commit(&mut state, next)?;
        Ok(stale)
    }

    /// Current live queue length.
    #[must_use]
    pub fn count(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Current failed set length.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.state.lock().failed_actions.len()
    }

    /// A point-in-time copy of the full state, for read-only consumers.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.state.lock().clone()
    }
}
