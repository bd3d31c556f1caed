//! Output formatting for outbox.
//!
//! This module provides formatters for displaying queue state in the
//! CLI's two formats: pretty (colored, human) and JSON (scripting).

mod json;
mod pretty;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::backend::monitor::ConnectionState;
use crate::cli::args::OutputFormat;
use crate::error::OutboxError;
use crate::queue::action::{FailedAction, QueuedAction};
use crate::sync::engine::{SyncReport, SyncStatus};

pub use json::*;
pub use pretty::*;

/// Aggregate view rendered by the `status` command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    /// Live queue length.
    pub pending: usize,
    /// Failed set length.
    pub failed: usize,
    /// Aggregate sync status.
    pub status: SyncStatus,
    /// Backend reachability.
    pub connection: ConnectionState,
    /// Most recent dispatch failure, if any.
    pub last_error: Option<String>,
    /// Timestamp of the oldest pending action.
    pub oldest_pending: Option<DateTime<Utc>>,
}

/// Format pending actions based on output format.
///
/// # Errors
///
/// Returns `OutboxError::Parse` if JSON serialization fails.
pub fn format_actions(
    actions: &[QueuedAction],
    title: &str,
    format: OutputFormat,
) -> Result<String, OutboxError> {
    match format {
        OutputFormat::Pretty => Ok(format_actions_pretty(actions, title)),
        OutputFormat::Json => format_actions_json(actions, title),
    }
}

/// Format failed actions based on output format.
///
/// # Errors
///
/// Returns `OutboxError::Parse` if JSON serialization fails.
pub fn format_failed(
    failed: &[FailedAction],
    format: OutputFormat,
) -> Result<String, OutboxError> {
    match format {
        OutputFormat::Pretty => Ok(format_failed_pretty(failed)),
        OutputFormat::Json => format_failed_json(failed),
    }
}

/// Format the status view based on output format.
///
/// # Errors
///
/// Returns `OutboxError::Parse` if JSON serialization fails.
pub fn format_status(view: &StatusView, format: OutputFormat) -> Result<String, OutboxError> {
    match format {
        OutputFormat::Pretty => Ok(format_status_pretty(view)),
        OutputFormat::Json => to_json(view),
    }
}

/// Format a drain cycle report based on output format.
///
/// # Errors
///
/// Returns `OutboxError::Parse` if JSON serialization fails.
pub fn format_report(report: &SyncReport, format: OutputFormat) -> Result<String, OutboxError> {
    match format {
        OutputFormat::Pretty => Ok(format_report_pretty(report)),
        OutputFormat::Json => to_json(report),
    }
}
