//! Queue and status change notifications.
//!
//! Interested collaborators (status bars, indicators, scripts) subscribe
//! to an [`EventBus`] and receive [`QueueEvent`] values over a plain
//! channel, no rendering framework involved.

use std::sync::mpsc::{channel, Receiver, Sender};

use parking_lot::Mutex;

use crate::sync::engine::SyncStatus;

/// Something observable happened to the queue or the sync engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    /// An action entered the live queue.
    Enqueued {
        /// Action id.
        id: String,
        /// Backend command name.
        command: String,
    },
    /// An action was removed by an operator.
    Removed {
        /// Action id.
        id: String,
    },
    /// An action was replayed successfully and left the queue.
    Synced {
        /// Action id.
        id: String,
        /// Backend command name.
        command: String,
    },
    /// An action's replay failed; it moved to the failed set.
    Failed {
        /// Action id.
        id: String,
        /// Dispatch error message.
        error: String,
    },
    /// A failed action was re-queued for another attempt.
    Retried {
        /// Action id.
        id: String,
    },
    /// One side of the store was emptied.
    Cleared {
        /// True when the failed set was cleared, false for the live queue.
        failed: bool,
    },
    /// Stale actions were garbage-collected.
    Pruned {
        /// How many actions were removed.
        count: usize,
    },
    /// The aggregate sync status changed.
    StatusChanged(SyncStatus),
}

/// Fan-out channel for [`QueueEvent`]s.
///
/// Subscribers that drop their receiver are pruned on the next emit.
#[derive(Default)]
pub struct EventBus {
    senders: Mutex<Vec<Sender<QueueEvent>>>,
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    pub fn subscribe(&self) -> Receiver<QueueEvent> {
        let (tx, rx) = channel();
        self.senders.lock().push(tx);
        rx
    }

    /// Deliver an event to every live subscriber.
    pub fn emit(&self, event: &QueueEvent) {
        let mut senders = self.senders.lock();
        senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers (as of the last emit).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.senders.lock().len()
    }
}
