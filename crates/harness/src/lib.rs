pub mod fixtures;
pub mod simulator;
pub mod store;

pub use simulator::{Gate, ScriptedSimulator};
pub use store::TestStore;
