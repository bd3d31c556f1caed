//! Configuration: file locations and user settings.

pub mod paths;
pub mod settings;

pub use paths::Paths;
pub use settings::{BackendConfig, Config, GeneralConfig, QueueConfig, StorageBackend, WatchConfig};
