//! Application Configuration
//!
//! Runtime configuration for the state container and the host binary,
//! loaded from TOML. Every section and field has a default, so a partial
//! file (or none at all) is valid.

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tessera_bus::BusSettings;

/// Name of the snapshot file inside the storage directory.
pub const STORE_FILE_NAME: &str = "store.json";

/// Resolve the default storage path.
///
/// Priority:
/// 1. `$TESSERA_PATH/.tessera` if TESSERA_PATH is set
/// 2. `~/.tessera` (home directory)
/// 3. `./.tessera` (current directory fallback)
pub fn default_storage_path() -> PathBuf {
    std::env::var("TESSERA_PATH")
        .ok()
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tessera")
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Storage configuration
    pub storage: StorageConfig,

    /// Broker session configuration
    pub bus: BusSettings,

    /// State container configuration
    pub core: CoreConfig,

    /// Notice channel configuration
    pub notices: NoticeConfig,

    /// Log output configuration
    pub logging: LoggingConfig,
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base storage directory
    pub base_path: PathBuf,

    /// Mirror the store to a snapshot file under `base_path`.
    ///
    /// When `false` everything lives in memory and is lost on exit.
    pub persist: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: default_storage_path(),
            persist: true,
        }
    }
}

/// State container configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Depth of the owner task's reduction inbox
    pub inbox_capacity: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            inbox_capacity: 128,
        }
    }
}

/// Notice channel configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeConfig {
    /// Notices buffered before new ones are dropped
    pub capacity: usize,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self { capacity: 64 }
    }
}

/// Log output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load and validate a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| AppError::config(format!("cannot parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, falling back to defaults when it is
    /// missing or invalid.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring invalid config");
                Self::default()
            }
        }
    }

    /// Reject settings the container cannot run with.
    pub fn validate(&self) -> AppResult<()> {
        if self.bus.incoming_capacity == 0 {
            return Err(AppError::config("bus.incoming_capacity must be at least 1"));
        }
        if self.bus.request_capacity == 0 {
            return Err(AppError::config("bus.request_capacity must be at least 1"));
        }
        if self.core.inbox_capacity == 0 {
            return Err(AppError::config("core.inbox_capacity must be at least 1"));
        }
        if self.notices.capacity == 0 {
            return Err(AppError::config("notices.capacity must be at least 1"));
        }
        Ok(())
    }

    /// Snapshot file of the local store, or `None` when running in memory.
    pub fn store_path(&self) -> Option<PathBuf> {
        self.storage
            .persist
            .then(|| self.storage.base_path.join(STORE_FILE_NAME))
    }

    /// Configuration for tests and embedding: in-memory storage.
    pub fn ephemeral() -> Self {
        Self {
            storage: StorageConfig {
                persist: false,
                ..StorageConfig::default()
            },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [bus]
            incoming_capacity = 8

            [logging]
            filter = "tessera_app=debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.bus.incoming_capacity, 8);
        assert_eq!(config.bus.keep_alive_secs, 30);
        assert_eq!(config.notices.capacity, 64);
        assert_eq!(config.logging.filter, "tessera_app=debug");
        assert!(config.storage.persist);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut config = AppConfig::default();
        config.notices.capacity = 0;
        assert_matches!(config.validate(), Err(AppError::Config(_)));
    }

    #[test]
    fn load_and_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.toml");
        std::fs::write(&good, "[storage]\npersist = false\n").unwrap();
        let config = AppConfig::load(&good).unwrap();
        assert_eq!(config.store_path(), None);

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[core]\ninbox_capacity = 0\n").unwrap();
        assert_matches!(AppConfig::load(&bad), Err(AppError::Config(_)));
        assert_eq!(AppConfig::load_or_default(&bad), AppConfig::default());
        assert_eq!(
            AppConfig::load_or_default(dir.path().join("missing.toml")),
            AppConfig::default()
        );
    }
}
