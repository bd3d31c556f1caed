//! Sync and watch command implementations.

use std::thread;
use std::time::Duration;

use colored::Colorize;

use crate::backend::monitor::ConnectionState;
use crate::cli::args::{OutputFormat, WatchArgs};
use crate::config::WatchConfig;
use crate::error::OutboxError;
use crate::output::{format_report, to_json};
use crate::sync::service::OutboxService;

/// Execute the sync command: run one drain cycle now.
///
/// # Errors
///
/// Returns an error only when the store cannot persist an outcome.
pub fn sync(service: &OutboxService, format: OutputFormat) -> Result<String, OutboxError> {
    let report = service.sync()?;
    format_report(&report, format)
}

/// Execute the watch command: poll reachability, drain on reconnect,
/// prune periodically.
///
/// With `--once` a single poll cycle runs and a summary is returned;
/// otherwise the loop runs until the process is stopped.
///
/// # Errors
///
/// Returns an error when a drain or prune cannot persist its outcome.
pub fn watch(
    service: &OutboxService,
    config: &WatchConfig,
    args: &WatchArgs,
    format: OutputFormat,
) -> Result<String, OutboxError> {
    let poll = Duration::from_secs(args.poll_seconds.unwrap_or(config.poll_seconds));
    let mut previous: Option<ConnectionState> = None;
    let mut polls_since_prune: u32 = 0;

    loop {
        let state = service.connection();
        let reconnected =
            state == ConnectionState::Online && previous != Some(ConnectionState::Online);

        if reconnected && service.count() > 0 {
            tracing::info!(pending = service.count(), "backend reachable, draining queue");
            if !args.once && format == OutputFormat::Pretty {
                println!(
                    "{} draining {} pending actions",
                    "reconnected:".green(),
                    service.count()
                );
            }
            let report = service.sync()?;
            if !args.once && format == OutputFormat::Pretty {
                println!("{}", format_report(&report, format)?);
            }
        }

        polls_since_prune += 1;
        if polls_since_prune >= config.prune_every {
            polls_since_prune = 0;
            service.prune()?;
        }

        previous = Some(state);

        if args.once {
            let summary = serde_json::json!({
                "connection": state,
                "pending": service.count(),
                "failed": service.failed_count(),
                "status": service.status(),
            });
            return match format {
                OutputFormat::Json => to_json(&summary),
                OutputFormat::Pretty => Ok(format!(
                    "Backend {}; {} pending, {} failed",
                    state,
                    service.count(),
                    service.failed_count()
                )),
            };
        }

        thread::sleep(poll);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dispatcher::{DispatchError, Dispatcher};
    use crate::backend::monitor::StaticMonitor;
    use crate::queue::action::CommandArgs;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    struct OkDispatcher;

    impl Dispatcher for OkDispatcher {
        fn dispatch(&self, _command: &str, _args: &CommandArgs) -> Result<(), DispatchError> {
            Ok(())
        }
    }

    fn service(online: bool) -> OutboxService {
        let monitor = if online {
            StaticMonitor::online()
        } else {
            StaticMonitor::offline()
        };
        OutboxService::new(
            Box::new(MemoryStore::default()),
            Arc::new(OkDispatcher),
            Arc::new(monitor),
            chrono::Duration::hours(1),
        )
        .unwrap()
    }

    #[test]
    fn test_sync_empty_queue() {
        let output = sync(&service(true), OutputFormat::Pretty).unwrap();
        assert!(output.contains("No pending actions"));
    }

    #[test]
    fn test_watch_once_drains_on_reconnect() {
        let service = service(true);
        service.enqueue("task.create", CommandArgs::new()).unwrap();

        let args = WatchArgs {
            once: true,
            poll_seconds: Some(1),
        };
        let output = watch(
            &service,
            &WatchConfig::default(),
            &args,
            OutputFormat::Pretty,
        )
        .unwrap();

        assert!(output.contains("0 pending"));
        assert_eq!(service.count(), 0);
    }

    #[test]
    fn test_watch_once_offline_leaves_queue() {
        let service = service(false);
        service.enqueue("task.create", CommandArgs::new()).unwrap();

        let args = WatchArgs {
            once: true,
            poll_seconds: Some(1),
        };
        let output = watch(
            &service,
            &WatchConfig::default(),
            &args,
            OutputFormat::Json,
        )
        .unwrap();

        assert!(output.contains("\"pending\": 1"));
        assert_eq!(service.count(), 1);
    }
}
