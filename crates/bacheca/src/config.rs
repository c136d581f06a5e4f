//! Configuration management for bacheca.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "bacheca";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "bacheca.db";

/// Prefix of environment variables that override configuration.
const ENV_PREFIX: &str = "BACHECA_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `BACHECA_`, sections split by `__`)
/// 2. TOML config file at `~/.config/bacheca/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Record and session storage configuration.
    pub storage: StorageConfig,
    /// User source configuration.
    pub users: UsersConfig,
}

/// Which slot backend holds records and the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// One JSON file per slot under `data_dir`.
    #[default]
    Files,
    /// A key-value table in the `SQLite` database at `database_path`.
    Sqlite,
    /// Process memory only.
    Memory,
}

/// Where user accounts are looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSourceKind {
    /// The fixed local list only.
    #[default]
    Fixed,
    /// The database user table, degrading to the fixed list on failure.
    Database,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Slot backend.
    pub backend: StorageBackend,
    /// Directory for the file backend.
    /// Defaults to `~/.local/share/bacheca`
    pub data_dir: Option<PathBuf>,
    /// Database file for the `SQLite` backend.
    /// Defaults to `~/.local/share/bacheca/bacheca.db`
    pub database_path: Option<PathBuf>,
    /// Seed sample records into empty collections.
    pub seed_samples: bool,
}

/// User-source configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsersConfig {
    /// Which user source to consult.
    pub source: UserSourceKind,
    /// Database holding the `users` table.
    /// Defaults to the storage database path.
    pub database_path: Option<PathBuf>,
    /// Load the built-in demo accounts into the fixed list.
    pub demo_accounts: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Files,
            data_dir: None, // Will be resolved to default at runtime
            database_path: None,
            seed_samples: true,
        }
    }
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            source: UserSourceKind::Fixed,
            database_path: None,
            demo_accounts: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.users.source == UserSourceKind::Fixed && !self.users.demo_accounts {
            return Err(Error::ConfigValidation {
                message: "users.source = \"fixed\" with demo_accounts disabled leaves no accounts"
                    .to_string(),
            });
        }

        if let Some(dir) = &self.storage.data_dir {
            if dir.as_os_str().is_empty() {
                return Err(Error::ConfigValidation {
                    message: "storage.data_dir must not be empty".to_string(),
                });
            }
        }

        for (key, path) in [
            ("storage.database_path", &self.storage.database_path),
            ("users.database_path", &self.users.database_path),
        ] {
            if path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
                return Err(Error::ConfigValidation {
                    message: format!("{key} must not be empty"),
                });
            }
        }

        Ok(())
    }

    /// Get the data directory, resolving defaults if not set.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// Get the storage database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| self.data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the user database path, falling back to the storage database.
    #[must_use]
    pub fn users_database_path(&self) -> PathBuf {
        self.users
            .database_path
            .clone()
            .unwrap_or_else(|| self.database_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.storage.backend, StorageBackend::Files);
        assert!(config.storage.seed_samples);
        assert_eq!(config.users.source, UserSourceKind::Fixed);
        assert!(config.users.demo_accounts);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_fixed_without_demo_accounts() {
        let mut config = Config::default();
        config.users.demo_accounts = false;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("demo_accounts"));

        config.users.source = UserSourceKind::Database;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_paths() {
        let mut config = Config::default();
        config.storage.data_dir = Some(PathBuf::new());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.users.database_path = Some(PathBuf::new());
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("users.database_path"));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        let path = config.database_path();

        assert!(path.to_string_lossy().contains("bacheca.db"));
        assert_eq!(config.users_database_path(), path);
    }

    #[test]
    fn test_database_path_follows_data_dir() {
        let mut config = Config::default();
        config.storage.data_dir = Some(PathBuf::from("/srv/bacheca"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/srv/bacheca/bacheca.db")
        );
    }

    #[test]
    fn test_users_database_path_custom() {
        let mut config = Config::default();
        config.users.database_path = Some(PathBuf::from("/custom/users.db"));

        assert_eq!(
            config.users_database_path(),
            PathBuf::from("/custom/users.db")
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("bacheca"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[storage]
backend = "sqlite"
seed_samples = false

[users]
source = "database"
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert!(!config.storage.seed_samples);
        assert_eq!(config.users.source, UserSourceKind::Database);
        assert!(config.users.demo_accounts);
    }

    #[test]
    fn test_load_invalid_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[storage]\nbackend = \"floppy\"\n").unwrap();

        let err = Config::load_from(Some(path)).unwrap_err();
        assert!(matches!(err, Error::ConfigLoad(_)));
    }

    #[test]
    fn test_storage_config_deserialize() {
        let json = r#"{"backend": "memory"}"#;
        let storage: StorageConfig = serde_json::from_str(json).unwrap();
        assert_eq!(storage.backend, StorageBackend::Memory);
        assert!(storage.seed_samples);
    }
}
