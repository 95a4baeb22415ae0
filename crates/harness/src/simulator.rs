use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use simstore_engine::{SimulationError, SimulationOutput, Simulator};

/// Blocks simulations until opened.
#[derive(Default)]
pub struct Gate {
    open: Mutex<bool>,
    opened: Condvar,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open(&self) {
        *self.open.lock() = true;
        self.opened.notify_all();
    }

    fn pass(&self) {
        let mut open = self.open.lock();
        while !*open {
            self.opened.wait(&mut open);
        }
    }
}

enum Outcome {
    Output(SimulationOutput),
    Fail(String),
    Panic,
}

/// Simulator with canned outputs and failures per dataset path.
#[derive(Default)]
pub struct ScriptedSimulator {
    outcomes: HashMap<PathBuf, Outcome>,
    gate: Option<Arc<Gate>>,
}

impl ScriptedSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, dataset: impl Into<PathBuf>, output: SimulationOutput) -> Self {
        self.outcomes.insert(dataset.into(), Outcome::Output(output));
        self
    }

    pub fn failing(mut self, dataset: impl Into<PathBuf>, reason: &str) -> Self {
        self.outcomes
            .insert(dataset.into(), Outcome::Fail(reason.to_string()));
        self
    }

    /// Panic inside the simulator instead of returning.
    pub fn panicking(mut self, dataset: impl Into<PathBuf>) -> Self {
        self.outcomes.insert(dataset.into(), Outcome::Panic);
        self
    }

    /// Hold every simulation until `gate` is opened.
    pub fn gated(mut self, gate: Arc<Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn into_arc(self) -> Arc<dyn Simulator> {
        Arc::new(self)
    }
}

impl Simulator for ScriptedSimulator {
    fn simulate(&self, dataset: &Path) -> Result<SimulationOutput, SimulationError> {
        if let Some(gate) = &self.gate {
            gate.pass();
        }
        match self.outcomes.get(dataset) {
            Some(Outcome::Output(output)) => Ok(output.clone()),
            Some(Outcome::Fail(reason)) => Err(SimulationError::new(dataset, reason.clone())),
            Some(Outcome::Panic) => panic!("solver crashed on {}", dataset.display()),
            None => Err(SimulationError::new(dataset, "unknown dataset")),
        }
    }
}
