//! The outbox service: one object wiring the queue core to the backend
//! boundary.
//!
//! Construct it with an explicit persistence port, dispatcher, and monitor;
//! instances share no hidden state, so tests can run as many side by side
//! as they like.

use std::sync::mpsc::Receiver;
use std::sync::Arc;

use chrono::Duration;

use crate::backend::dispatcher::Dispatcher;
use crate::backend::monitor::{ConnectionMonitor, ConnectionState};
use crate::error::OutboxError;
use crate::queue::action::CommandArgs;
use crate::queue::classifier;
use crate::queue::pruner::Pruner;
use crate::queue::store::QueueStore;
use crate::storage::{Snapshot, SnapshotStore};
use crate::sync::engine::{SyncEngine, SyncReport, SyncStatus};
use crate::sync::events::{EventBus, QueueEvent};

/// How a submitted command was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The backend was reachable; the command ran immediately.
    Dispatched,
    /// The backend was not reachable; the command was queued.
    Queued {
        /// Id of the queued action.
        id: String,
    },
}

/// Service object over the offline queue and its sync engine.
pub struct OutboxService {
    store: Arc<QueueStore>,
    engine: SyncEngine,
    pruner: Pruner,
    monitor: Arc<dyn ConnectionMonitor>,
    events: Arc<EventBus>,
}

impl OutboxService {
    /// Build a service over the given port and backend boundary, loading
    /// any previously persisted queue state.
    ///
    /// # Errors
    ///
    /// Returns an error if the existing snapshot cannot be read.
    pub fn new(
        port: Box<dyn SnapshotStore>,
        dispatcher: Arc<dyn Dispatcher>,
        monitor: Arc<dyn ConnectionMonitor>,
        max_age: Duration,
    ) -> Result<Self, OutboxError> {
        let store = Arc::new(QueueStore::open(port)?);
        let events = Arc::new(EventBus::new());
        let engine = SyncEngine::new(
            Arc::clone(&store),
            dispatcher,
            Arc::clone(&monitor),
            Arc::clone(&events),
        );

        Ok(Self {
            store,
            engine,
            pruner: Pruner::new(max_age),
            monitor,
            events,
        })
    }

    /// Queue a command for deferred replay.
    ///
    /// # Errors
    ///
    /// Returns [`OutboxError::NotQueueable`] for commands not on the
    /// allow-list (the caller must fail the operation rather than assume
    /// it ran), or [`OutboxError::Persistence`] if the entry could not be
    /// made durable.
    pub fn enqueue(&self, command: &str, args: CommandArgs) -> Result<String, OutboxError> {
        if !classifier::is_queueable(command) {
            return Err(OutboxError::NotQueueable(command.to_string()));
        }

        let id = self.store.enqueue(command, args)?;
        tracing::debug!(id = %id, command = %command, "action queued");
        self.events.emit(&QueueEvent::Enqueued {
            id: id.clone(),
            command: command.to_string(),
        });
        Ok(id)
    }

    /// Dispatch a command right away when the backend is reachable,
    /// otherwise queue it.
    ///
    /// # Errors
    ///
    /// Returns [`OutboxError::Dispatch`] when an immediate dispatch fails,
    /// or any error [`Self::enqueue`] can return.
    pub fn submit(&self, command: &str, args: CommandArgs) -> Result<Submission, OutboxError> {
        if self.monitor.state() == ConnectionState::Online {
            self.engine.dispatch_direct(command, &args)?;
            return Ok(Submission::Dispatched);
        }

        let id = self.enqueue(command, args)?;
        Ok(Submission::Queued { id })
    }

    /// Run one drain cycle (or coalesce into the one already running).
    ///
    /// # Errors
    ///
    /// Returns an error only when the store cannot persist an outcome.
    pub fn sync(&self) -> Result<SyncReport, OutboxError> {
        self.engine.drain()
    }

    /// Re-queue a failed action. Returns false when the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated snapshot cannot be persisted.
    pub fn retry(&self, id: &str) -> Result<bool, OutboxError> {
        let retried = self.store.retry(id)?;
        if retried {
            self.events.emit(&QueueEvent::Retried { id: id.to_string() });
        }
        Ok(retried)
    }

    /// Re-queue every failed action, preserving failed-set order. Returns
    /// how many were moved.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated snapshot cannot be persisted.
    pub fn retry_all(&self) -> Result<usize, OutboxError> {
        let ids: Vec<String> = self
            .store
            .snapshot()
            .failed_actions
            .into_iter()
            .map(|f| f.action.id)
            .collect();

        let mut moved = 0;
        for id in ids {
            if self.retry(&id)? {
                moved += 1;
            }
        }
        Ok(moved)
    }

    /// Remove a live action by id. Returns false when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated snapshot cannot be persisted.
    pub fn remove(&self, id: &str) -> Result<bool, OutboxError> {
        let removed = self.store.remove(id)?;
        if removed {
            self.events.emit(&QueueEvent::Removed { id: id.to_string() });
        }
        Ok(removed)
    }

    /// Empty the live queue; the failed set is untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated snapshot cannot be persisted.
    pub fn clear(&self) -> Result<usize, OutboxError> {
        let count = self.store.clear()?;
        self.events.emit(&QueueEvent::Cleared { failed: false });
        Ok(count)
    }

    /// Empty the failed set; the live queue is untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated snapshot cannot be persisted.
    pub fn clear_failed(&self) -> Result<usize, OutboxError> {
        let count = self.store.clear_failed()?;
        self.events.emit(&QueueEvent::Cleared { failed: true });
        Ok(count)
    }

    /// Sweep stale actions with the configured maximum age.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated snapshot cannot be persisted.
    pub fn prune(&self) -> Result<usize, OutboxError> {
        self.prune_with(self.pruner.max_age())
    }

    /// Sweep stale actions with an explicit maximum age.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated snapshot cannot be persisted.
    pub fn prune_with(&self, max_age: Duration) -> Result<usize, OutboxError> {
        let count = Pruner::new(max_age).sweep(&self.store)?;
        if count > 0 {
            self.events.emit(&QueueEvent::Pruned { count });
        }
        Ok(count)
    }

    /// Current live queue length.
    #[must_use]
    pub fn count(&self) -> usize {
        self.store.count()
    }

    /// Current failed set length.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.store.failed_count()
    }

    /// Aggregate status of the most recent drain cycle.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.engine.status()
    }

    /// Most recent dispatch failure message, if the last cycle had one.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.engine.last_error()
    }

    /// Current backend reachability.
    #[must_use]
    pub fn connection(&self) -> ConnectionState {
        self.monitor.state()
    }

    /// Point-in-time copy of the queue and failed set.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    /// Subscribe to queue and status change events.
    #[must_use]
    pub fn subscribe(&self) -> Receiver<QueueEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dispatcher::DispatchError;
    use crate::backend::monitor::StaticMonitor;
    use crate::storage::MemoryStore;
    use parking_lot::Mutex as PlMutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Monitor whose state can be flipped mid-test.
    struct ToggleMonitor {
        online: AtomicBool,
    }

    impl ToggleMonitor {
        fn starting_offline() -> Arc<Self> {
            Arc::new(Self {
                online: AtomicBool::new(false),
            })
        }

        fn go_online(&self) {
            self.online.store(true, Ordering::SeqCst);
        }
    }

    impl ConnectionMonitor for ToggleMonitor {
        fn state(&self) -> ConnectionState {
            if self.online.load(Ordering::SeqCst) {
                ConnectionState::Online
            } else {
                ConnectionState::Offline
            }
        }
    }

    /// Dispatcher that records everything and always succeeds.
    #[derive(Default)]
    struct CollectingDispatcher {
        calls: PlMutex<Vec<String>>,
    }

    impl Dispatcher for CollectingDispatcher {
        fn dispatch(&self, command: &str, _args: &CommandArgs) -> Result<(), DispatchError> {
            self.calls.lock().push(command.to_string());
            Ok(())
        }
    }

    fn service_with(
        dispatcher: Arc<dyn Dispatcher>,
        monitor: Arc<dyn ConnectionMonitor>,
    ) -> OutboxService {
        OutboxService::new(
            Box::new(MemoryStore::default()),
            dispatcher,
            monitor,
            Duration::hours(1),
        )
        .unwrap()
    }

    #[test]
    fn test_enqueue_rejects_non_queueable_command() {
        let service = service_with(
            Arc::new(CollectingDispatcher::default()),
            Arc::new(StaticMonitor::offline()),
        );

        let err = service.enqueue("task.list", CommandArgs::new()).unwrap_err();
        assert!(matches!(err, OutboxError::NotQueueable(_)));
        assert_eq!(service.count(), 0);
    }

    #[test]
    fn test_submit_queues_while_offline_then_drains_when_online() {
        let dispatcher = Arc::new(CollectingDispatcher::default());
        let monitor = ToggleMonitor::starting_offline();
        let service = service_with(dispatcher.clone(), monitor.clone());

        let first = service.submit("task.create", CommandArgs::new()).unwrap();
        let second = service.submit("task.complete", CommandArgs::new()).unwrap();
        assert!(matches!(first, Submission::Queued { .. }));
        assert!(matches!(second, Submission::Queued { .. }));
        assert_eq!(service.count(), 2);
        assert!(dispatcher.calls.lock().is_empty());

        monitor.go_online();
        let report = service.sync().unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(service.count(), 0);
        assert_eq!(service.status(), SyncStatus::Idle);
        assert_eq!(
            dispatcher.calls(),
            vec!["task.create", "task.complete"]
        );
    }

    impl CollectingDispatcher {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[test]
    fn test_submit_dispatches_directly_when_online() {
        let dispatcher = Arc::new(CollectingDispatcher::default());
        let service = service_with(dispatcher.clone(), Arc::new(StaticMonitor::online()));

        let outcome = service.submit("task.create", CommandArgs::new()).unwrap();
        assert_eq!(outcome, Submission::Dispatched);
        assert_eq!(service.count(), 0);
        assert_eq!(dispatcher.calls(), vec!["task.create"]);
    }

    #[test]
    fn test_submit_online_does_not_classify() {
        // Reads are fine when the backend is reachable; the allow-list
        // only guards deferral.
        let dispatcher = Arc::new(CollectingDispatcher::default());
        let service = service_with(dispatcher, Arc::new(StaticMonitor::online()));

        let outcome = service.submit("task.list", CommandArgs::new()).unwrap();
        assert_eq!(outcome, Submission::Dispatched);
    }

    #[test]
    fn test_retry_all_moves_every_failed_action() {
        let service = service_with(
            Arc::new(CollectingDispatcher::default()),
            Arc::new(StaticMonitor::offline()),
        );

        let a = service.enqueue("task.create", CommandArgs::new()).unwrap();
        let b = service.enqueue("task.update", CommandArgs::new()).unwrap();
        // Park both in the failed set directly through the store.
        service.store.mark_failed(&a, "err a").unwrap();
        service.store.mark_failed(&b, "err b").unwrap();

        assert_eq!(service.retry_all().unwrap(), 2);
        assert_eq!(service.failed_count(), 0);
        assert_eq!(service.count(), 2);
    }

    #[test]
    fn test_retry_unknown_id_is_false() {
        let service = service_with(
            Arc::new(CollectingDispatcher::default()),
            Arc::new(StaticMonitor::offline()),
        );
        assert!(!service.retry("ghost").unwrap());
    }

    #[test]
    fn test_events_for_enqueue_and_retry() {
        let service = service_with(
            Arc::new(CollectingDispatcher::default()),
            Arc::new(StaticMonitor::offline()),
        );
        let rx = service.subscribe();

        let id = service.enqueue("task.create", CommandArgs::new()).unwrap();
        service.store.mark_failed(&id, "boom").unwrap();
        service.retry(&id).unwrap();

        let events: Vec<QueueEvent> = rx.try_iter().collect();
        assert!(events
            .iter()
            .any(|e| matches!(e, QueueEvent::Enqueued { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, QueueEvent::Retried { .. })));
    }

    #[test]
    fn test_prune_with_reports_zero_on_fresh_queue() {
        let service = service_with(
            Arc::new(CollectingDispatcher::default()),
            Arc::new(StaticMonitor::offline()),
        );
        service.enqueue("task.create", CommandArgs::new()).unwrap();

        assert_eq!(service.prune().unwrap(), 0);
        assert_eq!(service.count(), 1);
    }

    #[test]
    fn test_independent_instances_share_no_state() {
        let a = service_with(
            Arc::new(CollectingDispatcher::default()),
            Arc::new(StaticMonitor::offline()),
        );
        let b = service_with(
            Arc::new(CollectingDispatcher::default()),
            Arc::new(StaticMonitor::offline()),
        );

        a.enqueue("task.create", CommandArgs::new()).unwrap();
        assert_eq!(a.count(), 1);
        assert_eq!(b.count(), 0);
    }
}
