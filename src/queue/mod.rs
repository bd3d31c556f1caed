//! Offline action queue: data model, queueability check, durable store,
//! and age-based garbage collection.
//!
//! The queue is a FIFO sequence of write commands captured while the backend
//! was unreachable, with a parallel set of actions whose replay failed.

pub mod action;
pub mod classifier;
pub mod pruner;
pub mod store;

pub use action::{CommandArgs, FailedAction, QueuedAction};
pub use classifier::{is_queueable, queueable_commands};
pub use pruner::Pruner;
pub use store::QueueStore;
