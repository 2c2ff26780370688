//! Source configuration: where the database file lives and what to call it.
//!
//! A [`SourceConfig`] is loaded once at process start and treated as
//! read-only afterwards; components borrow it at construction time.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Filesystem path to the database file.
    pub path: PathBuf,
    /// Logical database name stamped onto discovered catalog entries and
    /// qualified names.
    pub database: String,
}

impl SourceConfig {
    pub fn new(path: impl Into<PathBuf>, database: impl Into<String>) -> Result<Self, SourceError> {
        let config = Self {
            path: path.into(),
            database: database.into(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, SourceError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SourceError::config(format!("read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| SourceError::config(format!("parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration from `SPIGOT_PATH` and `SPIGOT_DATABASE`.
    pub fn from_env() -> Result<Self, SourceError> {
        let path = std::env::var("SPIGOT_PATH")
            .map_err(|_| SourceError::config("SPIGOT_PATH is not set"))?;
        let database = std::env::var("SPIGOT_DATABASE")
            .map_err(|_| SourceError::config("SPIGOT_DATABASE is not set"))?;
        Self::new(path, database)
    }

    fn validate(&self) -> Result<(), SourceError> {
        if self.path.as_os_str().is_empty() {
            return Err(SourceError::config("'path' must not be empty"));
        }
        if self.database.trim().is_empty() {
            return Err(SourceError::config("'database' must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serialize env-mutating tests to avoid races.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in ["SPIGOT_PATH", "SPIGOT_DATABASE"] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_new_valid() {
        let config = SourceConfig::new("warehouse.db", "main").unwrap();
        assert_eq!(config.path, PathBuf::from("warehouse.db"));
        assert_eq!(config.database, "main");
    }

    #[test]
    fn test_new_rejects_empty_database() {
        let result = SourceConfig::new("warehouse.db", "  ");
        assert!(result.is_err());
    }

    #[test]
    fn test_new_rejects_empty_path() {
        let result = SourceConfig::new("", "main");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(
            &config_path,
            r#"{"path": "/data/analytics.db", "database": "analytics"}"#,
        )
        .unwrap();

        let config = SourceConfig::from_file(&config_path).unwrap();
        assert_eq!(config.path, PathBuf::from("/data/analytics.db"));
        assert_eq!(config.database, "analytics");
    }

    #[test]
    fn test_from_file_missing() {
        let result = SourceConfig::from_file(Path::new("/nonexistent/config.json"));
        assert!(matches!(result, Err(SourceError::Config { .. })));
    }

    #[test]
    fn test_from_file_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, "not json").unwrap();

        let result = SourceConfig::from_file(&config_path);
        assert!(matches!(result, Err(SourceError::Config { .. })));
    }

    #[test]
    fn test_from_file_missing_database_key() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{"path": "warehouse.db"}"#).unwrap();

        let result = SourceConfig::from_file(&config_path);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_env() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        std::env::set_var("SPIGOT_PATH", "/data/warehouse.db");
        std::env::set_var("SPIGOT_DATABASE", "main");

        let config = SourceConfig::from_env().unwrap();
        assert_eq!(config.path, PathBuf::from("/data/warehouse.db"));
        assert_eq!(config.database, "main");

        clear_env();
    }

    #[test]
    fn test_from_env_missing_path() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        std::env::set_var("SPIGOT_DATABASE", "main");

        let result = SourceConfig::from_env();
        assert!(result.is_err());

        clear_env();
    }

    #[test]
    fn test_serialization_round_trip() {
        let config = SourceConfig::new("test.db", "main").unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: SourceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.path, config.path);
        assert_eq!(parsed.database, config.database);
    }
}
