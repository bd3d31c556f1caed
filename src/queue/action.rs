//! Queued action types.
//!
//! A [`QueuedAction`] is a deferred backend write; a [`FailedAction`] is one
//! whose replay failed, parked in the failed set until retried or cleared.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Arguments passed to a backend command, as a JSON object.
pub type CommandArgs = serde_json::Map<String, serde_json::Value>;

/// A write command captured for later replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedAction {
    /// Opaque unique id, stable across retries.
    pub id: String,
    /// Backend command name, e.g. `task.complete`.
    pub command: String,
    /// Command arguments.
    #[serde(default)]
    pub args: CommandArgs,
    /// When the action was (re-)queued. Refreshed on retry so a retried
    /// action is not immediately eligible for pruning.
    pub enqueued_at: DateTime<Utc>,
    /// Number of failed replay attempts so far.
    #[serde(default)]
    pub retry_count: u32,
}

impl QueuedAction {
    /// Create a new action with a fresh id, queued now.
    #[must_use]
    pub fn new(command: &str, args: CommandArgs) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            command: command.to_string(),
            args,
            enqueued_at: Utc::now(),
            retry_count: 0,
        }
    }

    /// Time elapsed since the action was queued.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.enqueued_at
    }
}

/// A queued action whose replay failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedAction {
    /// The original action, with `retry_count` already incremented for the
    /// attempt that failed.
    #[serde(flatten)]
    pub action: QueuedAction,
    /// Error message from the last dispatch attempt.
    pub last_error: String,
}

impl FailedAction {
    /// Park an action in the failed set, recording the attempt.
    #[must_use]
    pub fn from_action(mut action: QueuedAction, error: &str) -> Self {
        action.retry_count += 1;
        Self {
            action,
            last_error: error.to_string(),
        }
    }

    /// Convert back into a live action for another replay attempt.
    ///
    /// The timestamp is refreshed; the retry count carries over unchanged.
    #[must_use]
    pub fn into_retry(self, now: DateTime<Utc>) -> QueuedAction {
        let mut action = self.action;
        action.enqueued_at = now;
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args_with_id(id: &str) -> CommandArgs {
        let mut args = CommandArgs::new();
        args.insert("id".to_string(), json!(id));
        args
    }

    #[test]
    fn test_new_action_defaults() {
        let action = QueuedAction::new("task.complete", args_with_id("T1"));
        assert_eq!(action.command, "task.complete");
        assert_eq!(action.retry_count, 0);
        assert!(!action.id.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = QueuedAction::new("task.complete", CommandArgs::new());
        let b = QueuedAction::new("task.complete", CommandArgs::new());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_from_action_increments_retry_count() {
        let action = QueuedAction::new("task.create", CommandArgs::new());
        let failed = FailedAction::from_action(action, "connection refused");
        assert_eq!(failed.action.retry_count, 1);
        assert_eq!(failed.last_error, "connection refused");

        let failed_again =
            FailedAction::from_action(failed.into_retry(Utc::now()), "timed out");
        assert_eq!(failed_again.action.retry_count, 2);
    }

    #[test]
    fn test_into_retry_refreshes_timestamp() {
        let mut action = QueuedAction::new("task.update", args_with_id("T2"));
        action.enqueued_at = Utc::now() - Duration::hours(3);
        let id = action.id.clone();

        let failed = FailedAction::from_action(action, "boom");
        let now = Utc::now();
        let retried = failed.into_retry(now);

        assert_eq!(retried.id, id);
        assert_eq!(retried.retry_count, 1);
        assert_eq!(retried.enqueued_at, now);
    }

    #[test]
    fn test_serde_round_trip_camel_case() {
        let action = QueuedAction::new("tag.attach", args_with_id("T3"));
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"enqueuedAt\""));
        assert!(json.contains("\"retryCount\""));

        let back: QueuedAction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn test_failed_action_flattens() {
        let action = QueuedAction::new("task.delete", args_with_id("T4"));
        let failed = FailedAction::from_action(action, "500");
        let json = serde_json::to_string(&failed).unwrap();
        // One flat object, not a nested "action" wrapper.
        assert!(json.contains("\"lastError\":\"500\""));
        assert!(!json.contains("\"action\""));
    }

    #[test]
    fn test_deserialize_tolerates_missing_optional_fields() {
        // Older snapshots may lack args/retryCount entirely.
        let json = r#"{
            "id": "abc",
            "command": "task.complete",
            "enqueuedAt": "2026-01-01T00:00:00Z"
        }"#;
        let action: QueuedAction = serde_json::from_str(json).unwrap();
        assert_eq!(action.retry_count, 0);
        assert!(action.args.is_empty());
    }

    #[test]
    fn test_age() {
        let mut action = QueuedAction::new("task.complete", CommandArgs::new());
        let now = Utc::now();
        action.enqueued_at = now - Duration::minutes(42);
        assert_eq!(action.age(now).num_minutes(), 42);
    }
}
