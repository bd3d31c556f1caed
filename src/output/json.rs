//! JSON output formatting for outbox.

use serde::Serialize;
use serde_json::json;

use crate::error::OutboxError;
use crate::queue::action::{FailedAction, QueuedAction};

/// Format pending actions as JSON
///
/// # Errors
///
/// Returns `OutboxError::Parse` if JSON serialization fails.
pub fn format_actions_json(actions: &[QueuedAction], title: &str) -> Result<String, OutboxError> {
    let output = json!({
        "list": title,
        "count": actions.len(),
        "items": actions
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format failed actions as JSON
///
/// # Errors
///
/// Returns `OutboxError::Parse` if JSON serialization fails.
pub fn format_failed_json(failed: &[FailedAction]) -> Result<String, OutboxError> {
    let output = json!({
        "count": failed.len(),
        "items": failed
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Generic JSON formatter for any serializable type
///
/// # Errors
///
/// Returns `OutboxError::Parse` if JSON serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, OutboxError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::action::CommandArgs;

    fn make_action(command: &str) -> QueuedAction {
        QueuedAction::new(command, CommandArgs::new())
    }

    #[test]
    fn test_format_actions_json_empty() {
        let result = format_actions_json(&[], "Pending").unwrap();
        assert!(result.contains("\"list\": \"Pending\""));
        assert!(result.contains("\"count\": 0"));
        assert!(result.contains("\"items\": []"));
    }

    #[test]
    fn test_format_actions_json_fields() {
        let actions = vec![make_action("task.complete")];
        let result = format_actions_json(&actions, "Pending").unwrap();

        assert!(result.contains("\"count\": 1"));
        assert!(result.contains("\"command\": \"task.complete\""));
        assert!(result.contains("\"enqueuedAt\""));
        assert!(result.contains("\"retryCount\": 0"));
    }

    #[test]
    fn test_format_failed_json() {
        let failed = vec![FailedAction::from_action(
            make_action("task.update"),
            "http 502",
        )];
        let result = format_failed_json(&failed).unwrap();

        assert!(result.contains("\"count\": 1"));
        assert!(result.contains("\"lastError\": \"http 502\""));
        assert!(result.contains("\"retryCount\": 1"));
    }

    #[test]
    fn test_to_json_generic() {
        let action = make_action("tag.attach");
        let result = to_json(&action).unwrap();
        assert!(result.contains("\"command\": \"tag.attach\""));
    }
}
