//! Configuration settings for outbox.
//!
//! Settings are loaded from `~/.outbox/config.yaml`.

use serde::{Deserialize, Serialize};

use crate::cli::args::OutputFormat;
use crate::config::Paths;
use crate::error::OutboxError;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// General settings.
    pub general: GeneralConfig,
    /// Backend dispatch and reachability settings.
    pub backend: BackendConfig,
    /// Queue retention and storage settings.
    pub queue: QueueConfig,
    /// Watch loop settings.
    pub watch: WatchConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default output format.
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
    /// Color output setting.
    #[serde(default = "default_color")]
    pub color: ColorSetting,
}

/// Color output setting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorSetting {
    /// Auto-detect based on terminal.
    #[default]
    Auto,
    /// Always use colors.
    Always,
    /// Never use colors.
    Never,
}

/// Backend dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Program invoked to perform a backend call. It receives the command
    /// name as its last argument and the JSON arguments on stdin.
    #[serde(default = "default_program")]
    pub program: String,
    /// Fixed arguments placed before the command name.
    #[serde(default)]
    pub args: Vec<String>,
    /// Per-dispatch timeout in seconds; expiry counts as a failure.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// `host:port` probed to decide whether the backend is reachable.
    /// Unset means reachability is unknown and commands are queued.
    #[serde(default)]
    pub probe_addr: Option<String>,
    /// Probe connect timeout in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

/// Queue retention and storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Queued actions older than this many hours are pruned.
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: i64,
    /// Which storage backend holds the queue snapshot.
    #[serde(default)]
    pub storage: StorageBackend,
}

/// Storage backend for the queue snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON file with atomic replacement (`queue.json`).
    #[default]
    File,
    /// SQLite database (`outbox.db`).
    Sqlite,
}

/// Watch loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Seconds between reachability polls.
    #[serde(default = "default_poll_seconds")]
    pub poll_seconds: u64,
    /// Run a prune sweep every this many polls.
    #[serde(default = "default_prune_every")]
    pub prune_every: u32,
}

// Default value functions for serde
const fn default_output_format() -> OutputFormat {
    OutputFormat::Pretty
}

const fn default_color() -> ColorSetting {
    ColorSetting::Auto
}

fn default_program() -> String {
    "outbox-backend".to_string()
}

const fn default_timeout_seconds() -> u64 {
    30
}

const fn default_probe_timeout_ms() -> u64 {
    1500
}

const fn default_max_age_hours() -> i64 {
    1
}

const fn default_poll_seconds() -> u64 {
    15
}

const fn default_prune_every() -> u32 {
    4
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: default_output_format(),
            color: default_color(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
            timeout_seconds: default_timeout_seconds(),
            probe_addr: None,
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_age_hours: default_max_age_hours(),
            storage: StorageBackend::default(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_seconds: default_poll_seconds(),
            prune_every: default_prune_every(),
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self, OutboxError> {
        let paths = Paths::new()?;
        Self::load_from_path(&paths.config_file)
    }

    /// Load configuration from a specific path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, OutboxError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            OutboxError::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        serde_yaml::from_str(&contents).map_err(|e| {
            OutboxError::Config(format!(
                "Failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }

    /// Save configuration to a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written.
    pub fn save_to_path(&self, path: &std::path::Path) -> Result<(), OutboxError> {
        let contents = serde_yaml::to_string(self)
            .map_err(|e| OutboxError::Config(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, contents).map_err(|e| {
            OutboxError::Config(format!(
                "Failed to write config file {}: {e}",
                path.display()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.general.default_output, OutputFormat::Pretty);
        assert_eq!(config.general.color, ColorSetting::Auto);
        assert_eq!(config.backend.program, "outbox-backend");
        assert_eq!(config.backend.timeout_seconds, 30);
        assert!(config.backend.probe_addr.is_none());
        assert_eq!(config.queue.max_age_hours, 1);
        assert_eq!(config.queue.storage, StorageBackend::File);
        assert_eq!(config.watch.poll_seconds, 15);
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let config = Config::load_from_path(&config_path).unwrap();
        assert_eq!(config.general.default_output, OutputFormat::Pretty);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut config = Config::default();
        config.backend.program = "acme-sync".to_string();
        config.queue.max_age_hours = 6;
        config.queue.storage = StorageBackend::Sqlite;

        config.save_to_path(&config_path).unwrap();
        let loaded = Config::load_from_path(&config_path).unwrap();

        assert_eq!(loaded.backend.program, "acme-sync");
        assert_eq!(loaded.queue.max_age_hours, 6);
        assert_eq!(loaded.queue.storage, StorageBackend::Sqlite);
    }

    #[test]
    fn test_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let partial_yaml = r"
backend:
  probe_addr: api.example.com:443
";
        std::fs::write(&config_path, partial_yaml).unwrap();

        let config = Config::load_from_path(&config_path).unwrap();

        assert_eq!(
            config.backend.probe_addr.as_deref(),
            Some("api.example.com:443")
        );
        // Defaults fill everything else.
        assert_eq!(config.backend.timeout_seconds, 30);
        assert_eq!(config.queue.max_age_hours, 1);
    }

    #[test]
    fn test_invalid_config_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "queue: [not, a, map]").unwrap();

        assert!(Config::load_from_path(&config_path).is_err());
    }
}
