use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "outbox")]
#[command(about = "An offline-first outbox for backend write commands")]
#[command(long_about = "outbox - queue backend writes while offline, replay them in order

Write commands issued while the backend is unreachable are persisted to a
durable local queue and replayed oldest-first once connectivity returns.
A failed replay parks only that action; everything else keeps flowing.

QUICK START:
  outbox send task.complete '{\"id\":\"TASK-1\"}'   Dispatch or queue a write
  outbox status                                 Counts, sync state, last error
  outbox sync                                   Replay the queue now
  outbox watch                                  Drain automatically on reconnect

OUTPUT FORMATS:
  --output pretty    Human-readable colored output (default)
  --output json      Machine-readable JSON for scripting

For more information on a specific command, run:
  outbox <command> --help")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for command results
    ///
    /// Use 'pretty' for human-readable colored output (default),
    /// or 'json' for machine-readable output suitable for scripting.
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub output: OutputFormat,

    /// Data directory (default: ~/.outbox)
    #[arg(long, env = "OUTBOX_DIR", global = true)]
    pub dir: Option<PathBuf>,

    /// Treat the backend as unreachable regardless of probing
    ///
    /// Forces queueing behavior; useful for scripts that want to defer
    /// writes deliberately, and for testing.
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dispatch a write command, or queue it while offline
    ///
    /// When the backend is reachable the command runs immediately. When it
    /// is not, the command is checked against the queueable allow-list:
    /// deferrable writes are persisted for later replay, everything else
    /// fails right away so you never mistake an unexecuted operation for a
    /// success.
    ///
    /// # Examples
    ///
    ///   outbox send task.complete '{"id":"TASK-1"}'
    ///   outbox send task.create --set title="Buy milk" --set list=inbox
    ///   outbox --offline send tag.attach '{"id":"TASK-2","tag":"urgent"}'
    #[command(alias = "s")]
    Send(SendArgs),

    /// Show queue counts, sync status, and the last error
    ///
    /// # Examples
    ///
    ///   outbox status
    ///   outbox status -o json | jq .pending
    #[command(alias = "st")]
    Status,

    /// List pending or failed actions
    ///
    /// Pending actions are shown oldest first, the order they will be
    /// replayed in. Failed actions carry their last error message.
    ///
    /// # Examples
    ///
    ///   outbox list
    ///   outbox list --failed
    ///   outbox list -o json
    #[command(alias = "ls")]
    List(ListArgs),

    /// Replay the queue against the backend now
    ///
    /// Walks the queue oldest-first, one action at a time. A failed action
    /// moves to the failed set; the cycle continues with the next one.
    /// If a cycle is already running this trigger does nothing.
    Sync,

    /// Move failed actions back into the queue
    ///
    /// The action keeps its retry count and is appended at the tail with a
    /// fresh timestamp, so it is not immediately pruned.
    ///
    /// # Examples
    ///
    ///   outbox retry 3f2a91c4
    ///   outbox retry --all
    Retry(RetryArgs),

    /// Empty the queue or the failed set
    ///
    /// Clears exactly one side: the live queue by default, the failed set
    /// with --failed. Requires --force.
    Clear(ClearArgs),

    /// Remove stale actions from the queue
    ///
    /// Actions older than the maximum age (default: one hour, see
    /// queue.max_age_hours) are dropped without being replayed. Each drop
    /// is logged.
    Prune(PruneArgs),

    /// Watch backend reachability and sync on reconnect
    ///
    /// Polls the configured probe address. When the backend transitions
    /// from unreachable to reachable and actions are pending, a drain
    /// cycle runs. Stale actions are pruned periodically.
    ///
    /// # Examples
    ///
    ///   outbox watch
    ///   outbox watch --once
    Watch(WatchArgs),

    /// Generate shell completions
    ///
    /// # Examples
    ///
    ///   outbox completions zsh > ~/.zsh/completions/_outbox
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args)]
pub struct SendArgs {
    /// Backend command name, e.g. task.complete
    pub command: String,

    /// Command arguments as a JSON object
    pub args: Option<String>,

    /// Set a single string argument (repeatable), merged over the JSON
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Show the failed set instead of the live queue
    #[arg(long)]
    pub failed: bool,

    /// Maximum number of entries to show
    #[arg(long, default_value_t = 50)]
    pub limit: usize,
}

#[derive(Args)]
pub struct RetryArgs {
    /// Id (or unique id prefix) of the failed action to retry
    pub id: Option<String>,

    /// Retry every failed action
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct ClearArgs {
    /// Clear the failed set instead of the live queue
    #[arg(long)]
    pub failed: bool,

    /// Confirm the clear
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct PruneArgs {
    /// Override the configured maximum age, in hours
    #[arg(long)]
    pub max_age_hours: Option<i64>,
}

#[derive(Args)]
pub struct WatchArgs {
    /// Run a single poll cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Override the configured poll interval, in seconds
    #[arg(long)]
    pub poll_seconds: Option<u64>,
}
