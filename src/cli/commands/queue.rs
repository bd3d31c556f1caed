//! Queue management command implementations.

use serde_json::json;

use crate::cli::args::{ClearArgs, ListArgs, OutputFormat, PruneArgs, RetryArgs, SendArgs};
use crate::error::OutboxError;
use crate::output::{format_actions, format_failed, format_status, to_json, StatusView};
use crate::queue::action::CommandArgs;
use crate::sync::service::{OutboxService, Submission};

/// Parse the send arguments into a JSON argument map.
fn parse_args(args: &SendArgs) -> Result<CommandArgs, OutboxError> {
    let mut map: CommandArgs = match &args.args {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| OutboxError::Config(format!("arguments must be a JSON object: {e}")))?,
        None => CommandArgs::new(),
    };

    for pair in &args.set {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(OutboxError::Config(format!(
                "--set expects KEY=VALUE, got '{pair}'"
            )));
        };
        map.insert(key.to_string(), json!(value));
    }

    Ok(map)
}

/// Execute the send command: dispatch now or queue for later.
///
/// # Errors
///
/// Returns an error when the command is rejected, the dispatch fails, or
/// the queue entry cannot be persisted.
pub fn send(
    service: &OutboxService,
    args: &SendArgs,
    format: OutputFormat,
) -> Result<String, OutboxError> {
    let command_args = parse_args(args)?;
    let outcome = service.submit(&args.command, command_args)?;

    match format {
        OutputFormat::Json => {
            let data = match &outcome {
                Submission::Dispatched => json!({"outcome": "dispatched"}),
                Submission::Queued { id } => json!({"outcome": "queued", "id": id}),
            };
            to_json(&data)
        }
        OutputFormat::Pretty => Ok(match outcome {
            Submission::Dispatched => format!("Dispatched {}", args.command),
            Submission::Queued { id } => {
                format!("Queued {} for replay (id: {id})", args.command)
            }
        }),
    }
}

/// Show queue counts, sync status, and the last error.
///
/// # Errors
///
/// Returns an error if output formatting fails.
pub fn status(service: &OutboxService, format: OutputFormat) -> Result<String, OutboxError> {
    let snapshot = service.snapshot();
    let view = StatusView {
        pending: snapshot.queue.len(),
        failed: snapshot.failed_actions.len(),
        status: service.status(),
        connection: service.connection(),
        last_error: service.last_error(),
        oldest_pending: snapshot.queue.first().map(|a| a.enqueued_at),
    };

    format_status(&view, format)
}

/// List pending or failed actions.
///
/// # Errors
///
/// Returns an error if output formatting fails.
pub fn list(
    service: &OutboxService,
    args: &ListArgs,
    format: OutputFormat,
) -> Result<String, OutboxError> {
    let snapshot = service.snapshot();

    if args.failed {
        let shown: Vec<_> = snapshot.failed_actions.into_iter().take(args.limit).collect();
        format_failed(&shown, format)
    } else {
        let shown: Vec<_> = snapshot.queue.into_iter().take(args.limit).collect();
        format_actions(&shown, "Pending", format)
    }
}

/// Resolve a (possibly abbreviated) failed-action id.
fn resolve_failed_id(service: &OutboxService, prefix: &str) -> Result<String, OutboxError> {
    let matches: Vec<String> = service
        .snapshot()
        .failed_actions
        .into_iter()
        .map(|f| f.action.id)
        .filter(|id| id.starts_with(prefix))
        .collect();

    match matches.as_slice() {
        [] => Err(OutboxError::NotFound(format!("failed action '{prefix}'"))),
        [id] => Ok(id.clone()),
        _ => Err(OutboxError::Config(format!(
            "id prefix '{prefix}' is ambiguous ({} matches)",
            matches.len()
        ))),
    }
}

/// Retry one or all failed actions.
///
/// # Errors
///
/// Returns an error when the id is unknown or persistence fails.
pub fn retry(
    service: &OutboxService,
    args: &RetryArgs,
    format: OutputFormat,
) -> Result<String, OutboxError> {
    if args.all {
        let moved = service.retry_all()?;
        return match format {
            OutputFormat::Json => to_json(&json!({"retried": moved})),
            OutputFormat::Pretty => Ok(format!("Re-queued {moved} failed actions")),
        };
    }

    let Some(prefix) = &args.id else {
        return Err(OutboxError::Config(
            "Specify --all or provide an action id".to_string(),
        ));
    };

    let id = resolve_failed_id(service, prefix)?;
    service.retry(&id)?;

    match format {
        OutputFormat::Json => to_json(&json!({"retried": 1, "id": id})),
        OutputFormat::Pretty => Ok(format!("Re-queued action {id} for replay")),
    }
}

/// Clear the live queue or the failed set.
///
/// # Errors
///
/// Returns an error without --force, or when persistence fails.
pub fn clear(
    service: &OutboxService,
    args: &ClearArgs,
    format: OutputFormat,
) -> Result<String, OutboxError> {
    if !args.force {
        return Err(OutboxError::Config(
            "Use --force to confirm the clear".to_string(),
        ));
    }

    let (side, count) = if args.failed {
        ("failed", service.clear_failed()?)
    } else {
        ("pending", service.clear()?)
    };

    match format {
        OutputFormat::Json => to_json(&json!({"cleared": count, "side": side})),
        OutputFormat::Pretty => Ok(format!("Cleared {count} {side} actions")),
    }
}

/// Sweep stale actions out of the queue.
///
/// # Errors
///
/// Returns an error when persistence fails.
pub fn prune(
    service: &OutboxService,
    args: &PruneArgs,
    format: OutputFormat,
) -> Result<String, OutboxError> {
    let count = match args.max_age_hours {
        Some(hours) => service.prune_with(chrono::Duration::hours(hours))?,
        None => service.prune()?,
    };

    match format {
        OutputFormat::Json => to_json(&json!({"pruned": count})),
        OutputFormat::Pretty => Ok(if count == 0 {
            "No stale actions to prune.".to_string()
        } else {
            format!("Pruned {count} stale actions; their writes were abandoned")
        }),
    }
}
