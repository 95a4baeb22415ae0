use simstore_core::{BundlePairId, EdgeMapping, RawMapping};
use simstore_storage::{BundlePairRecord, SqliteStorage, Storage};

use crate::config::StoreConfig;
use crate::error::EngineError;
use crate::reader;
use crate::transport::{to_transport, TransportResults};
use crate::writer;

/// A results database plus the settings it is read with.
pub struct ResultStore {
    storage: SqliteStorage,
    config: StoreConfig,
}

impl ResultStore {
    /// Open (creating if needed) the database named by `config`.
    pub fn open(config: StoreConfig) -> Result<Self, EngineError> {
        let storage = SqliteStorage::open(&config.database_path)?;
        Ok(Self { storage, config })
    }

    pub fn in_memory(config: StoreConfig) -> Result<Self, EngineError> {
        let storage = SqliteStorage::open_in_memory()?;
        Ok(Self { storage, config })
    }

    pub fn new(storage: SqliteStorage, config: StoreConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut SqliteStorage {
        &mut self.storage
    }

    pub fn store(
        &mut self,
        input: &EdgeMapping,
        result: &EdgeMapping,
    ) -> Result<BundlePairId, EngineError> {
        writer::store_results(&mut self.storage, input, result)
    }

    pub fn store_raw(
        &mut self,
        input: RawMapping,
        result: RawMapping,
    ) -> Result<BundlePairId, EngineError> {
        writer::store_raw_results(&mut self.storage, input, result)
    }

    pub fn restore(&self, pair_id: BundlePairId) -> Result<(EdgeMapping, EdgeMapping), EngineError> {
        reader::restore_results(&self.storage, pair_id, self.config.bool_decoding())
    }

    /// Restore the result side of a pair in its transport shape.
    pub fn restore_transport(&self, pair_id: BundlePairId) -> Result<TransportResults, EngineError> {
        let (_, result) = self.restore(pair_id)?;
        to_transport(&result)
    }

    pub fn delete(&mut self, pair_id: BundlePairId) -> Result<(), EngineError> {
        writer::delete_results(&mut self.storage, pair_id)
    }

    pub fn list(&self) -> Result<Vec<BundlePairRecord>, EngineError> {
        Ok(self.storage.list_bundle_pairs()?)
    }
}
