//! Pretty (human-readable) output formatting.

use chrono::Utc;
use colored::Colorize;

use crate::output::StatusView;
use crate::queue::action::{FailedAction, QueuedAction};
use crate::sync::engine::{SyncReport, SyncStatus};

/// Short display form of an action id.
fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Human-friendly age like "3m" or "2h".
fn age_str(action: &QueuedAction) -> String {
    let age = action.age(Utc::now());
    if age.num_hours() > 0 {
        format!("{}h", age.num_hours())
    } else if age.num_minutes() > 0 {
        format!("{}m", age.num_minutes())
    } else {
        "now".to_string()
    }
}

/// Format pending actions as a table.
pub fn format_actions_pretty(actions: &[QueuedAction], title: &str) -> String {
    if actions.is_empty() {
        return format!("{title} (0 items)\n  No items");
    }

    let mut output = format!("{} ({} items)\n", title, actions.len());
    output.push_str(&"─".repeat(60));
    output.push('\n');

    for action in actions {
        let mut line = format!(
            "{} {}",
            short_id(&action.id).dimmed(),
            action.command.bold()
        );
        line.push_str(&format!("  {}", age_str(action).yellow()));
        if action.retry_count > 0 {
            line.push_str(&format!("  {}", format!("retry {}", action.retry_count).cyan()));
        }
        output.push_str(&line);
        output.push('\n');
    }

    output
}

/// Format failed actions with their errors.
pub fn format_failed_pretty(failed: &[FailedAction]) -> String {
    if failed.is_empty() {
        return "Failed (0 items)\n  No items".to_string();
    }

    let mut output = format!("Failed ({} items)\n", failed.len());
    output.push_str(&"─".repeat(60));
    output.push('\n');

    for entry in failed {
        output.push_str(&format!(
            "{} {}  {}\n",
            short_id(&entry.action.id).dimmed(),
            entry.action.command.bold(),
            format!("attempts: {}", entry.action.retry_count).cyan()
        ));

        let error = if entry.last_error.len() > 50 {
            format!("{}...", &entry.last_error[..47])
        } else {
            entry.last_error.clone()
        };
        output.push_str(&format!("         {}\n", error.red()));
    }

    output
}

/// Format the status summary.
pub fn format_status_pretty(view: &StatusView) -> String {
    let mut lines = Vec::new();

    lines.push("Outbox Status".bold().to_string());
    lines.push("─".repeat(40));

    lines.push(format!(
        "  Backend:    {}",
        match view.connection {
            c if c.is_online() => "online".green().to_string(),
            crate::backend::monitor::ConnectionState::Unknown => "unknown".yellow().to_string(),
            _ => "offline".red().to_string(),
        }
    ));

    let status_str = match view.status {
        SyncStatus::Idle => "idle".normal(),
        SyncStatus::Syncing => "syncing".yellow(),
        SyncStatus::Error => "error".red(),
    };
    lines.push(format!("  Sync:       {status_str}"));

    lines.push(format!(
        "  Pending:    {} {}",
        view.pending,
        if view.pending > 0 {
            "actions waiting".dimmed()
        } else {
            "".dimmed()
        }
    ));

    lines.push(format!(
        "  Failed:     {} {}",
        view.failed,
        if view.failed > 0 {
            "actions need attention".red()
        } else {
            "".normal()
        }
    ));

    if let Some(oldest) = view.oldest_pending {
        let age = Utc::now().signed_duration_since(oldest);
        let age_str = if age.num_hours() > 0 {
            format!("{} hours ago", age.num_hours())
        } else if age.num_minutes() > 0 {
            format!("{} minutes ago", age.num_minutes())
        } else {
            "just now".to_string()
        };
        lines.push(format!("  Oldest:     {}", age_str.dimmed()));
    }

    if let Some(error) = &view.last_error {
        lines.push(format!("  Last error: {}", error.red()));
    }

    if view.pending > 0 {
        lines.push(String::new());
        lines.push(
            "Run 'outbox sync' to replay pending actions"
                .dimmed()
                .to_string(),
        );
    }

    lines.join("\n")
}

/// Format a drain cycle report.
pub fn format_report_pretty(report: &SyncReport) -> String {
    if report.coalesced {
        return "A sync cycle is already running; nothing started.".to_string();
    }

    if report.attempted == 0 && !report.interrupted {
        return "No pending actions to sync.".to_string();
    }

    let mut lines = Vec::new();
    lines.push(format!("Sync completed: {} actions", report.attempted));
    lines.push("─".repeat(40));

    if report.succeeded > 0 {
        lines.push(format!(
            "  {} {}",
            "✓".green(),
            format!("{} replayed", report.succeeded).green()
        ));
    }

    if report.failed > 0 {
        lines.push(format!(
            "  {} {}",
            "✗".red(),
            format!("{} failed (see 'outbox list --failed')", report.failed).red()
        ));
    }

    if report.interrupted {
        lines.push(format!(
            "  {} {}",
            "○".yellow(),
            "interrupted; remaining actions stay queued".yellow()
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::monitor::ConnectionState;
    use crate::queue::action::CommandArgs;

    #[test]
    fn test_format_actions_pretty_empty() {
        let output = format_actions_pretty(&[], "Pending");
        assert!(output.contains("0 items"));
    }

    #[test]
    fn test_format_actions_pretty_lists_commands() {
        let actions = vec![
            QueuedAction::new("task.create", CommandArgs::new()),
            QueuedAction::new("task.complete", CommandArgs::new()),
        ];
        let output = format_actions_pretty(&actions, "Pending");
        assert!(output.contains("2 items"));
        assert!(output.contains("task.create"));
        assert!(output.contains("task.complete"));
    }

    #[test]
    fn test_format_failed_pretty_truncates_long_errors() {
        let failed = vec![FailedAction::from_action(
            QueuedAction::new("task.update", CommandArgs::new()),
            &"x".repeat(80),
        )];
        let output = format_failed_pretty(&failed);
        assert!(output.contains("..."));
    }

    #[test]
    fn test_format_status_pretty_mentions_sync_hint() {
        let view = StatusView {
            pending: 2,
            failed: 0,
            status: SyncStatus::Idle,
            connection: ConnectionState::Offline,
            last_error: None,
            oldest_pending: None,
        };
        let output = format_status_pretty(&view);
        assert!(output.contains("outbox sync"));
    }

    #[test]
    fn test_format_report_pretty_empty_queue() {
        let report = SyncReport::default();
        assert!(format_report_pretty(&report).contains("No pending actions"));
    }

    #[test]
    fn test_format_report_pretty_coalesced() {
        let report = SyncReport::coalesced();
        assert!(format_report_pretty(&report).contains("already running"));
    }
}
