//! Configuration for simstore

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use simstore_core::BoolDecoding;

use crate::error::EngineError;

fn default_database_path() -> PathBuf {
    PathBuf::from("simstore.db")
}

fn default_workers() -> usize {
    2
}

fn default_retained_jobs() -> usize {
    1024
}

/// Where results live and how they are read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Decode any non-empty `bool` text as true, including "False".
    /// Only for databases written by older deployments.
    #[serde(default)]
    pub legacy_bool_decoding: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            legacy_bool_decoding: false,
        }
    }
}

impl StoreConfig {
    pub fn at(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Self::default()
        }
    }

    pub fn bool_decoding(&self) -> BoolDecoding {
        if self.legacy_bool_decoding {
            BoolDecoding::Truthy
        } else {
            BoolDecoding::Strict
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Number of worker threads running simulations
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Finished or failed jobs kept for status queries. Older ones are
    /// forgotten and report as not found.
    #[serde(default = "default_retained_jobs")]
    pub retained_jobs: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            retained_jobs: default_retained_jobs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub queue: QueueConfig,
}

impl Config {
    /// Load config from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), EngineError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.queue.workers == 0 {
            return Err(EngineError::Config("queue.workers must be at least 1".into()));
        }
        if self.queue.retained_jobs == 0 {
            return Err(EngineError::Config(
                "queue.retained_jobs must be at least 1".into(),
            ));
        }
        if self.store.database_path.as_os_str().is_empty() {
            return Err(EngineError::Config("store.database_path is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_use_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.store.bool_decoding(), BoolDecoding::Strict);
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [store]
            legacy_bool_decoding = true
            "#,
        )
        .unwrap();
        assert_eq!(config.store.database_path, PathBuf::from("simstore.db"));
        assert_eq!(config.store.bool_decoding(), BoolDecoding::Truthy);
        assert_eq!(config.queue.workers, 2);
        assert_eq!(config.queue.retained_jobs, 1024);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simstore.toml");
        let config = Config {
            store: StoreConfig::at(dir.path().join("runs.db")),
            queue: QueueConfig {
                workers: 4,
                retained_jobs: 16,
            },
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn zero_workers_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simstore.toml");
        std::fs::write(&path, "[queue]\nworkers = 0\n").unwrap();
        assert!(matches!(Config::load(&path), Err(EngineError::Config(_))));
    }

    #[test]
    fn zero_retained_jobs_rejected() {
        let config = Config {
            queue: QueueConfig {
                retained_jobs: 0,
                ..QueueConfig::default()
            },
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }
}
