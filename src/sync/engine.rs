//! Drain engine: replays the live queue against the backend.
//!
//! One drain cycle walks the queue strictly in insertion order and awaits
//! each dispatch before starting the next, since later actions may depend on
//! earlier ones targeting the same entity. A failed dispatch moves only
//! that action to the failed set; the cycle continues. This is best-effort
//! ordering: the engine does not track causal dependencies between
//! actions, so an action whose prerequisite just failed will still be
//! attempted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::backend::dispatcher::Dispatcher;
use crate::backend::monitor::{ConnectionMonitor, ConnectionState};
use crate::error::OutboxError;
use crate::queue::store::QueueStore;
use crate::sync::events::{EventBus, QueueEvent};

/// Aggregate outcome of the most recent drain cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// No drain running; the last cycle (if any) had no failures.
    Idle,
    /// A drain cycle is in progress.
    Syncing,
    /// The last cycle recorded at least one failure.
    Error,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Syncing => "syncing",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// What one drain cycle did.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Actions whose dispatch was attempted.
    pub attempted: usize,
    /// Actions replayed successfully and removed.
    pub succeeded: usize,
    /// Actions moved to the failed set.
    pub failed: usize,
    /// The cycle stopped early because connectivity was lost or it was
    /// cancelled; undispatched actions remain queued untouched.
    pub interrupted: bool,
    /// A cycle was already running; this trigger did nothing.
    pub coalesced: bool,
}

impl SyncReport {
    /// Report for a trigger that found a cycle already running.
    #[must_use]
    pub fn coalesced() -> Self {
        Self {
            coalesced: true,
            ..Self::default()
        }
    }

    /// True when no dispatch failed during the cycle.
    #[must_use]
    pub const fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Replays queued actions in order when triggered.
pub struct SyncEngine {
    store: Arc<QueueStore>,
    dispatcher: Arc<dyn Dispatcher>,
    monitor: Arc<dyn ConnectionMonitor>,
    events: Arc<EventBus>,
    status: RwLock<SyncStatus>,
    last_error: Mutex<Option<String>>,
    cancelled: AtomicBool,
}

impl SyncEngine {
    /// Create an engine over the given store and backend boundary.
    pub fn new(
        store: Arc<QueueStore>,
        dispatcher: Arc<dyn Dispatcher>,
        monitor: Arc<dyn ConnectionMonitor>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            monitor,
            events,
            status: RwLock::new(SyncStatus::Idle),
            last_error: Mutex::new(None),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Current aggregate status.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        *self.status.read()
    }

    /// Message of the most recent dispatch failure, cleared once a cycle
    /// completes without failures.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    /// Ask a running cycle to stop before its next dispatch.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Checked between dispatch calls, never mid-call.
    fn interrupted(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
            || self.monitor.state() == ConnectionState::Offline
    }

    fn set_status(&self, status: SyncStatus) {
        *self.status.write() = status;
        self.events.emit(&QueueEvent::StatusChanged(status));
    }

    /// Run one drain cycle over the actions queued at this moment.
    ///
    /// A trigger while a cycle is already running is coalesced: it returns
    /// immediately with [`SyncReport::coalesced`] and starts nothing.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store cannot persist an outcome;
    /// dispatch failures are recorded in the failed set, not returned.
    pub fn drain(&self) -> Result<SyncReport, OutboxError> {
        {
            let mut status = self.status.write();
            if *status == SyncStatus::Syncing {
                tracing::debug!("drain already running, coalescing trigger");
                return Ok(SyncReport::coalesced());
            }
            *status = SyncStatus::Syncing;
        }
        self.cancelled.store(false, Ordering::SeqCst);
        self.events.emit(&QueueEvent::StatusChanged(SyncStatus::Syncing));

        // This cycle owns exactly the actions queued right now; anything
        // enqueued mid-cycle waits for the next trigger.
        let batch = self.store.snapshot().queue;
        tracing::info!(pending = batch.len(), "drain cycle started");

        let mut report = SyncReport::default();
        for action in &batch {
            if self.interrupted() {
                report.interrupted = true;
                tracing::info!(
                    remaining = batch.len() - report.attempted,
                    "drain interrupted; remaining actions stay queued"
                );
                break;
            }

            report.attempted += 1;
            match self.dispatcher.dispatch(&action.command, &action.args) {
                Ok(()) => {
                    self.store.remove(&action.id)?;
                    report.succeeded += 1;
                    tracing::debug!(id = %action.id, command = %action.command, "action replayed");
                    self.events.emit(&QueueEvent::Synced {
                        id: action.id.clone(),
                        command: action.command.clone(),
                    });
                }
                Err(err) => {
                    let message = err.to_string();
                    tracing::warn!(
                        id = %action.id,
                        command = %action.command,
                        error = %message,
                        "dispatch failed; action isolated, cycle continues"
                    );
                    self.store.mark_failed(&action.id, &message)?;
                    report.failed += 1;
                    *self.last_error.lock() = Some(message.clone());
                    self.events.emit(&QueueEvent::Failed {
                        id: action.id.clone(),
                        error: message,
                    });
                }
            }
        }

        if report.failed == 0 {
            *self.last_error.lock() = None;
            self.set_status(SyncStatus::Idle);
        } else {
            self.set_status(SyncStatus::Error);
        }

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            interrupted = report.interrupted,
            "drain cycle finished"
        );
        Ok(report)
    }

    /// Dispatch a command immediately, outside the queue.
    ///
    /// # Errors
    ///
    /// Returns [`OutboxError::Dispatch`] when the backend call fails.
    pub fn dispatch_direct(
        &self,
        command: &str,
        args: &crate::queue::action::CommandArgs,
    ) -> Result<(), OutboxError> {
        self.dispatcher
            .dispatch(command, args)
            .map_err(|e| OutboxError::Dispatch(e.to_string()))
    }
}
