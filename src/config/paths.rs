//! Path resolution for outbox configuration and data files.
//!
//! All outbox data is stored in `~/.outbox/`:
//! - `config.yaml` - Main configuration file
//! - `queue.json` - Durable queue snapshot (file storage backend)
//! - `outbox.db` - SQLite database (sqlite storage backend)

use std::path::PathBuf;

use crate::error::OutboxError;

/// Paths to outbox configuration and data files.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Root directory: `~/.outbox/`
    pub root: PathBuf,
    /// Config file: `~/.outbox/config.yaml`
    pub config_file: PathBuf,
    /// Queue snapshot: `~/.outbox/queue.json`
    pub queue_file: PathBuf,
    /// Database file: `~/.outbox/outbox.db`
    pub database: PathBuf,
}

impl Paths {
    /// Create paths based on the user's home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, OutboxError> {
        let home = std::env::var("HOME")
            .map_err(|_| OutboxError::Config("Could not determine home directory".to_string()))?;

        Ok(Self::with_root(PathBuf::from(home).join(".outbox")))
    }

    /// Create paths with a custom root directory (testing, `--dir`).
    #[must_use]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            config_file: root.join("config.yaml"),
            queue_file: root.join("queue.json"),
            database: root.join("outbox.db"),
            root,
        }
    }

    /// Ensure the root directory exists, creating it if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn ensure_dirs(&self) -> Result<(), OutboxError> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root).map_err(|e| {
                OutboxError::Config(format!(
                    "Failed to create directory {:?}: {}",
                    self.root, e
                ))
            })?;
        }

        Ok(())
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| {
            // Fallback to current directory if home cannot be determined
            Self::with_root(PathBuf::from(".outbox"))
        })
    }
}
