//! Synchronization: the drain engine, queue/status change events, and the
//! service object that ties the queue core to the backend boundary.

pub mod engine;
pub mod events;
pub mod service;

pub use engine::{SyncEngine, SyncReport, SyncStatus};
pub use events::{EventBus, QueueEvent};
pub use service::{OutboxService, Submission};
