pub mod config;
pub mod error;
pub mod orchestrator;
pub mod queue;
pub mod reader;
pub mod simulator;
pub mod store;
pub mod transport;
pub mod writer;

pub use config::{Config, QueueConfig, StoreConfig};
pub use error::EngineError;
pub use orchestrator::Orchestrator;
pub use queue::{check_job, JobCheck, JobId, JobQueue, JobStatus};
pub use simulator::{Dataset, EdgeEntry, JsonDatasetSimulator, SimulationError, SimulationOutput, Simulator};
pub use store::ResultStore;
pub use transport::{to_transport, IndexedValues, TransportEdge, TransportResults};
