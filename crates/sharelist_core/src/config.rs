//! Runtime configuration from environment variables.
//!
//! | Variable              | Default                   |
//! |-----------------------|---------------------------|
//! | `SHARELIST_DB_PATH`   | in-memory database        |
//! | `SHARELIST_LOG_LEVEL` | `default_log_level()`     |
//! | `SHARELIST_LOG_DIR`   | unset (logging disabled)  |

use crate::db::DbResult;
use crate::logging::{default_log_level, init_logging, LogSettings, LoggingError};
use crate::store::DocumentStore;
use std::path::PathBuf;
use std::sync::Arc;

pub const DB_PATH_VAR: &str = "SHARELIST_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "SHARELIST_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "SHARELIST_LOG_DIR";

/// Resolved core settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// Database file; `None` selects a private in-memory database.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Absolute log directory; `None` leaves logging uninitialized.
    pub log_dir: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Blank values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();
        Self {
            db_path: read(DB_PATH_VAR).map(PathBuf::from),
            log_level: read(LOG_LEVEL_VAR).unwrap_or(defaults.log_level),
            log_dir: read(LOG_DIR_VAR),
        }
    }

    /// Starts file logging when a directory is configured. Returns
    /// whether logging is now active.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        let Some(dir) = self.log_dir.as_deref() else {
            return Ok(false);
        };
        init_logging(&LogSettings::parse(&self.log_level, dir)?)?;
        Ok(true)
    }

    /// Opens the configured database as a document store.
    pub fn open_store(&self) -> DbResult<Arc<DocumentStore>> {
        match &self.db_path {
            Some(path) => DocumentStore::open(path),
            None => DocumentStore::open_in_memory(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, DB_PATH_VAR, LOG_DIR_VAR, LOG_LEVEL_VAR};
    use crate::logging::{default_log_level, LoggingError};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config_from(pairs: &[(&str, &str)]) -> CoreConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        CoreConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config_from(&[]);
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.log_level, default_log_level());
        assert!(!config.init_logging().unwrap());
    }

    #[test]
    fn values_are_trimmed_and_blank_means_unset() {
        let config = config_from(&[
            (DB_PATH_VAR, " /tmp/lists.sqlite3 "),
            (LOG_LEVEL_VAR, "warn"),
            (LOG_DIR_VAR, "   "),
        ]);
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/lists.sqlite3")));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn bad_logging_settings_fail_before_starting() {
        let relative = config_from(&[(LOG_DIR_VAR, "logs")]);
        assert!(matches!(
            relative.init_logging(),
            Err(LoggingError::InvalidDir(dir)) if dir == "logs"
        ));

        let noisy = config_from(&[(LOG_DIR_VAR, "/tmp/sharelist-logs"), (LOG_LEVEL_VAR, "loud")]);
        assert!(matches!(
            noisy.init_logging(),
            Err(LoggingError::UnknownLevel(level)) if level == "loud"
        ));
    }

    #[test]
    fn default_config_opens_in_memory_store() {
        let store = CoreConfig::default().open_store().unwrap();
        assert_eq!(store.revision(), 0);
    }
}
