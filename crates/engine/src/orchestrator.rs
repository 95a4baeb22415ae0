//! Glue between the simulation engine and the result store.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use simstore_core::BundlePairId;

use crate::error::EngineError;
use crate::simulator::Simulator;
use crate::store::ResultStore;
use crate::transport::TransportResults;

pub struct Orchestrator {
    store: ResultStore,
    simulator: Arc<dyn Simulator>,
}

impl Orchestrator {
    pub fn new(store: ResultStore, simulator: Arc<dyn Simulator>) -> Self {
        Self { store, simulator }
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ResultStore {
        &mut self.store
    }

    /// Simulate `dataset` and persist its input and result mappings.
    pub fn run(&mut self, dataset: &Path) -> Result<BundlePairId, EngineError> {
        info!(dataset = %dataset.display(), "running simulation");
        let output = self.simulator.simulate(dataset).inspect_err(|e| {
            warn!(dataset = %dataset.display(), error = %e, "simulation failed");
        })?;
        self.store.store_raw(output.input, output.result)
    }

    /// Restore a stored run's results in transport shape.
    pub fn fetch(&self, pair_id: BundlePairId) -> Result<TransportResults, EngineError> {
        self.store.restore_transport(pair_id)
    }
}
