//! Age-based garbage collection over the live queue.
//!
//! An action that has waited longer than the configured maximum age is
//! removed without being replayed: its write would land on backend state
//! that has likely diverged too far to be meaningful. Every removal is
//! logged and counted so the loss is observable, never silent.

use chrono::{DateTime, Duration, Utc};

use crate::error::OutboxError;
use crate::queue::store::QueueStore;

/// Default maximum queue lifetime.
pub const DEFAULT_MAX_AGE_HOURS: i64 = 1;

/// Sweeps stale actions out of the live queue. Never touches the failed set.
#[derive(Debug, Clone)]
pub struct Pruner {
    max_age: Duration,
}

impl Pruner {
    /// Create a pruner with the given maximum action age.
    #[must_use]
    pub const fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    /// The configured maximum age.
    #[must_use]
    pub const fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Sweep now. Returns the number of actions removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated snapshot cannot be persisted.
    pub fn sweep(&self, store: &QueueStore) -> Result<usize, OutboxError> {
        self.sweep_at(store, Utc::now())
    }

    /// Sweep as of `now`. Idempotent: a second sweep at the same instant
    /// removes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated snapshot cannot be persisted.
    pub fn sweep_at(&self, store: &QueueStore, now: DateTime<Utc>) -> Result<usize, OutboxError> {
        let cutoff = now - self.max_age;
        let removed = store.take_stale(cutoff)?;

        for action in &removed {
            tracing::warn!(
                id = %action.id,
                command = %action.command,
                age_minutes = action.age(now).num_minutes(),
                "pruned stale action; its write will never reach the backend"
            );
        }
        if !removed.is_empty() {
            tracing::info!(count = removed.len(), "prune sweep complete");
        }

        Ok(removed.len())
    }
}

impl Default for Pruner {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_MAX_AGE_HOURS))
    }
}
