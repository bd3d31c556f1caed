//! Command implementations for outbox.
//!
//! This module contains the implementation of all CLI commands plus the
//! wiring that assembles an [`OutboxService`] from configuration.

mod queue;
mod shell;
mod sync;

pub use queue::{clear, list, prune, retry, send, status};
pub use shell::completions;
pub use sync::{sync, watch};

use std::sync::Arc;

use chrono::Duration;

use crate::backend::dispatcher::{CommandDispatcher, Dispatcher};
use crate::backend::monitor::{ConnectionMonitor, ProbeMonitor, StaticMonitor};
use crate::config::{Config, Paths, StorageBackend};
use crate::error::OutboxError;
use crate::storage::{FileStore, SnapshotStore, SqliteStore};
use crate::sync::service::OutboxService;

/// Resolved configuration and paths for one invocation.
pub struct AppContext {
    /// Loaded settings.
    pub config: Config,
    /// Resolved file locations.
    pub paths: Paths,
}

/// Assemble the service: storage port, dispatcher, and monitor per config.
///
/// `force_offline` pins the monitor offline (the `--offline` flag).
///
/// # Errors
///
/// Returns an error if directories cannot be created or existing queue
/// state cannot be read.
pub fn build_service(ctx: &AppContext, force_offline: bool) -> Result<OutboxService, OutboxError> {
    ctx.paths.ensure_dirs()?;

    let port: Box<dyn SnapshotStore> = match ctx.config.queue.storage {
        StorageBackend::File => Box::new(FileStore::new(ctx.paths.queue_file.clone())),
        StorageBackend::Sqlite => Box::new(SqliteStore::open_at(&ctx.paths.database)?),
    };

    let dispatcher: Arc<dyn Dispatcher> =
        Arc::new(CommandDispatcher::from_config(&ctx.config.backend));

    let monitor: Arc<dyn ConnectionMonitor> = if force_offline {
        Arc::new(StaticMonitor::offline())
    } else {
        Arc::new(ProbeMonitor::from_config(&ctx.config.backend))
    };

    OutboxService::new(
        port,
        dispatcher,
        monitor,
        Duration::hours(ctx.config.queue.max_age_hours),
    )
}
