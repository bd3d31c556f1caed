//! Command dispatch against the real backend.
//!
//! [`Dispatcher`] is the only I/O boundary the queue core depends on.
//! The production implementation spawns a configured backend program with
//! the command name as an argument and the JSON arguments on stdin; a
//! non-zero exit is a failure and stderr becomes the error message.

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::config::BackendConfig;
use crate::queue::action::CommandArgs;

/// Why a dispatch attempt did not succeed.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The backend call ran and failed, or could not be started.
    #[error("{0}")]
    Failed(String),

    /// The backend call did not finish within the configured timeout.
    /// Treated exactly like a failure by the sync engine.
    #[error("backend call timed out after {0}s")]
    Timeout(u64),
}

/// Performs one backend call for a command and its arguments.
pub trait Dispatcher: Send + Sync {
    /// Execute `command` with `args` against the backend.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] describing the failure or timeout.
    fn dispatch(&self, command: &str, args: &CommandArgs) -> Result<(), DispatchError>;
}

/// Dispatcher that shells out to a configured backend program.
///
/// Invocation shape: `<program> [fixed args...] <command>` with the JSON
/// arguments written to the child's stdin.
pub struct CommandDispatcher {
    program: String,
    leading_args: Vec<String>,
    timeout: Duration,
}

impl CommandDispatcher {
    /// Create a dispatcher for the given program and per-call timeout.
    #[must_use]
    pub const fn new(program: String, leading_args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program,
            leading_args,
            timeout,
        }
    }

    /// Build a dispatcher from the backend configuration section.
    #[must_use]
    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(
            config.program.clone(),
            config.args.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }
}

impl Dispatcher for CommandDispatcher {
    fn dispatch(&self, command: &str, args: &CommandArgs) -> Result<(), DispatchError> {
        let payload = serde_json::to_string(args)
            .map_err(|e| DispatchError::Failed(format!("could not encode arguments: {e}")))?;

        let program = self.program.clone();
        let leading_args = self.leading_args.clone();
        let command = command.to_string();

        // Run the call on a worker so expiry can be enforced from here.
        // On timeout the worker is left to finish; its late outcome is
        // discarded.
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = run_backend(&program, &leading_args, &command, &payload);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(_) => Err(DispatchError::Timeout(self.timeout.as_secs())),
        }
    }
}

fn run_backend(
    program: &str,
    leading_args: &[String],
    command: &str,
    payload: &str,
) -> Result<(), DispatchError> {
    let mut child = Command::new(program)
        .args(leading_args)
        .arg(command)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| DispatchError::Failed(format!("failed to run '{program}': {e}")))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(payload.as_bytes())
            .map_err(|e| DispatchError::Failed(format!("failed to send arguments: {e}")))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| DispatchError::Failed(format!("failed to collect '{program}': {e}")))?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = stderr.trim();
    if detail.is_empty() {
        Err(DispatchError::Failed(format!(
            "'{program}' exited with {}",
            output.status
        )))
    } else {
        Err(DispatchError::Failed(detail.to_string()))
    }
}
