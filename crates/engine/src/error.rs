use simstore_core::{BundlePairId, CoreError};
use simstore_storage::StorageError;
use thiserror::Error;

use crate::queue::JobId;
use crate::simulator::SimulationError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("bundle pair not found: {0}")]
    NotFound(BundlePairId),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error("two edges render to the same transport key {0:?}")]
    TransportKeyCollision(String),

    #[error("job not found: {0}")]
    JobNotFound(JobId),

    #[error("job queue is shut down")]
    QueueClosed,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// True for failures caused by a value the codec cannot persist or read back.
    pub fn is_codec(&self) -> bool {
        matches!(
            self,
            EngineError::Core(
                CoreError::Codec { .. }
                    | CoreError::UnknownTypeTag(_)
                    | CoreError::UnknownRepresentationTag(_)
                    | CoreError::MalformedValue { .. }
            )
        )
    }
}
