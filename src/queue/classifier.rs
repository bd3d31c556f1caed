//! Queueability check for backend commands.
//!
//! Only write-type commands known to be safe to defer may enter the queue.
//! Everything else (reads, unknown commands) must fail immediately while
//! offline so the caller never mistakes an unexecuted read for a success.

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Write commands that are safe to replay later: idempotent enough, or
/// acceptably eventually-consistent against the backend.
const QUEUEABLE_COMMANDS: &[&str] = &[
    "task.create",
    "task.update",
    "task.complete",
    "task.cancel",
    "task.delete",
    "task.move",
    "tag.attach",
    "tag.detach",
    "note.append",
];

static QUEUEABLE: Lazy<HashSet<&'static str>> =
    Lazy::new(|| QUEUEABLE_COMMANDS.iter().copied().collect());

/// Check whether a command may be queued for deferred replay.
///
/// Pure and side-effect free; callable at arbitrary frequency.
#[must_use]
pub fn is_queueable(command: &str) -> bool {
    QUEUEABLE.contains(command)
}

/// The full allow-list, for help text and diagnostics.
#[must_use]
pub const fn queueable_commands() -> &'static [&'static str] {
    QUEUEABLE_COMMANDS
}
