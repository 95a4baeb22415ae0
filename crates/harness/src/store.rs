use std::path::{Path, PathBuf};

use simstore_engine::{Config, EngineError, QueueConfig, ResultStore, StoreConfig};
use tempfile::TempDir;

/// A result store backed by a database file in its own temp directory.
pub struct TestStore {
    dir: TempDir,
    pub store: ResultStore,
}

impl TestStore {
    pub fn new() -> Result<Self, EngineError> {
        Self::with_config(|_| {})
    }

    /// Build a store after adjusting its config, e.g. to enable legacy bool decoding.
    pub fn with_config(adjust: impl FnOnce(&mut StoreConfig)) -> Result<Self, EngineError> {
        let dir = tempfile::tempdir()?;
        let mut config = StoreConfig::at(dir.path().join("simstore.db"));
        adjust(&mut config);
        let store = ResultStore::open(config)?;
        Ok(Self { dir, store })
    }

    pub fn database_path(&self) -> &Path {
        &self.store.config().database_path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// A queue config pointing at the same database.
    pub fn queue_config(&self, workers: usize) -> Config {
        Config {
            store: self.store.config().clone(),
            queue: QueueConfig {
                workers,
                ..QueueConfig::default()
            },
        }
    }

    /// Open a second, independent connection to the same database.
    pub fn reopen(&self) -> Result<ResultStore, EngineError> {
        ResultStore::open(self.store.config().clone())
    }

    /// Write `content` to a file in the store's temp directory.
    pub fn write_file(&self, name: &str, content: &str) -> Result<PathBuf, EngineError> {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content)?;
        Ok(path)
    }
}
